//! Query compilation and evaluation.
//!
//! A parsed [`Ast`] is compiled once into a [`Query`]: every comparison is
//! resolved into a typed domain (date, money, currency or tag parameter)
//! with its literal already converted, so evaluation is a plain walk over
//! the compiled predicate that can neither fail nor panic.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveTime};
use finanse_core::{Money, RateCache, RateSource, Transaction};

use crate::ast::{Ast, AtomKind, BinaryOp, Relation};
use crate::error::{ParseErrorKind, QueryParseError};
use crate::parser::parse;

/// Date literal that always means the day of evaluation.
pub const TODAY: &str = "today";

/// Date format of date literals.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A compiled query.
///
/// # Example
///
/// ```
/// use finanse_core::Transaction;
/// use finanse_query::Query;
///
/// let query = Query::parse("food and shop ^= big").unwrap();
/// let t: Transaction = "2016-01-01 food shop(big store) 10zł".parse().unwrap();
/// assert!(query.matches(&t));
/// ```
#[derive(Clone)]
pub struct Query {
    text: String,
    ast: Ast,
    predicate: Predicate,
    rates: Arc<dyn RateSource + Send + Sync>,
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    HasTag(String),
    /// A keyword or literal used as a condition.
    Never,
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Compare(Relation, Domain),
}

/// What a comparison looks at, with its right side already converted.
#[derive(Debug, Clone, PartialEq)]
enum Domain {
    Date(DateLiteral),
    Money(Money),
    Currency(String),
    Tag { name: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateLiteral {
    Today,
    Day(NaiveDate),
}

impl Query {
    /// Parse and compile a query.
    pub fn parse(text: &str) -> Result<Self, QueryParseError> {
        let ast = parse(text)?;
        Self::compile(text, ast)
    }

    /// Compile an already parsed query; `text` is used in error messages.
    pub fn compile(text: &str, ast: Ast) -> Result<Self, QueryParseError> {
        let predicate = compile(&ast).map_err(|kind| QueryParseError::new(text, kind))?;
        tracing::debug!(query = text, ast = %ast, "compiled query");
        Ok(Self {
            text: text.to_string(),
            ast,
            predicate,
            rates: Arc::new(RateCache::new()),
        })
    }

    /// Use `rates` when money in different currencies is compared.
    #[must_use]
    pub fn with_rates(mut self, rates: Arc<dyn RateSource + Send + Sync>) -> Self {
        self.rates = rates;
        self
    }

    /// The query text as given.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed query.
    pub const fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Check a transaction, resolving `today` from the local clock.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.matches_on(transaction, Local::now().date_naive())
    }

    /// Check a transaction with `today` meaning the given day.
    pub fn matches_on(&self, transaction: &Transaction, today: NaiveDate) -> bool {
        self.eval(&self.predicate, transaction, today)
    }

    fn eval(&self, predicate: &Predicate, t: &Transaction, today: NaiveDate) -> bool {
        match predicate {
            Predicate::HasTag(name) => t.has_tag(name),
            Predicate::Never => false,
            Predicate::Not(inner) => !self.eval(inner, t, today),
            Predicate::And(left, right) => {
                self.eval(left, t, today) && self.eval(right, t, today)
            }
            Predicate::Or(left, right) => self.eval(left, t, today) || self.eval(right, t, today),
            Predicate::Compare(relation, domain) => self.compare(*relation, domain, t, today),
        }
    }

    fn compare(&self, relation: Relation, domain: &Domain, t: &Transaction, today: NaiveDate) -> bool {
        match domain {
            Domain::Date(literal) => {
                let day = match literal {
                    DateLiteral::Today => today,
                    DateLiteral::Day(day) => *day,
                };
                ordered(relation, Some(t.date.cmp(&day.and_time(NaiveTime::MIN))))
            }
            Domain::Money(money) => match relation {
                Relation::Eq => t.money == *money,
                Relation::Ne => t.money != *money,
                _ => ordered(relation, t.money.compare(money, self.rates.as_ref(), t.day())),
            },
            Domain::Currency(value) => {
                let currencies: String = t.money.currencies().collect();
                textual(relation, &currencies, value)
            }
            Domain::Tag { name, value } => textual(relation, t.tag_value(name), value),
        }
    }
}

/// Ordering operators over an optional ordering; incomparable is `false`.
fn ordered(relation: Relation, ordering: Option<Ordering>) -> bool {
    let Some(ordering) = ordering else {
        return false;
    };
    match relation {
        Relation::Lt => ordering.is_lt(),
        Relation::Le => ordering.is_le(),
        Relation::Eq => ordering.is_eq(),
        Relation::Ne => ordering.is_ne(),
        Relation::Ge => ordering.is_ge(),
        Relation::Gt => ordering.is_gt(),
        Relation::StartsWith | Relation::Contains | Relation::EndsWith => false,
    }
}

fn textual(relation: Relation, left: &str, right: &str) -> bool {
    match relation {
        Relation::StartsWith => left.starts_with(right),
        Relation::Contains => left.contains(right),
        Relation::EndsWith => left.ends_with(right),
        _ => ordered(relation, Some(left.cmp(right))),
    }
}

fn compile(ast: &Ast) -> Result<Predicate, ParseErrorKind> {
    Ok(match ast {
        Ast::Atom(atom) if atom.kind == AtomKind::Tag => Predicate::HasTag(atom.value.clone()),
        Ast::Atom(_) => Predicate::Never,
        Ast::Not(inner) => Predicate::Not(Box::new(compile(inner)?)),
        Ast::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => Predicate::And(Box::new(compile(left)?), Box::new(compile(right)?)),
        Ast::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } => Predicate::Or(Box::new(compile(left)?), Box::new(compile(right)?)),
        Ast::Binary {
            op: BinaryOp::Relation(relation),
            left,
            right,
        } => match (left.as_atom(), right.as_atom()) {
            (Some(left), Some(right)) => {
                Predicate::Compare(*relation, domain(left.kind, &left.value, &right.value)?)
            }
            // the parser only builds comparisons between atoms
            _ => Predicate::Never,
        },
    })
}

fn domain(kind: AtomKind, left: &str, literal: &str) -> Result<Domain, ParseErrorKind> {
    Ok(match (kind, left) {
        (AtomKind::Keyword, "date") => Domain::Date(parse_date(literal)?),
        (AtomKind::Keyword, "money") => Domain::Money(literal.parse()?),
        (AtomKind::Keyword, _) => Domain::Currency(literal.to_string()),
        _ => Domain::Tag {
            name: left.to_string(),
            value: literal.to_string(),
        },
    })
}

fn parse_date(literal: &str) -> Result<DateLiteral, ParseErrorKind> {
    if literal == TODAY {
        return Ok(DateLiteral::Today);
    }
    NaiveDate::parse_from_str(literal, DATE_FORMAT)
        .map(DateLiteral::Day)
        .map_err(|_| ParseErrorKind::InvalidDate(literal.to_string()))
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("text", &self.text)
            .field("ast", &self.ast)
            .finish_non_exhaustive()
    }
}

/// Renders the canonical, fully parenthesized form.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ast)
    }
}

impl FromStr for Query {
    type Err = QueryParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}
