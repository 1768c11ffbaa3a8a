//! Collections of transactions and their groupings.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Index, Sub};

use crate::grouped::{Grouped, GroupedMoney, Monoid};
use crate::money::Money;
use crate::rates::{ConversionError, RateSource};
use crate::transaction::{parse_line, Tags, Transaction, TransactionParseError};

/// Lines starting with this character are skipped by [`parse_document`].
pub const COMMENT: char = '#';

/// Parse a document holding one transaction per line.
///
/// Blank lines and comment lines are skipped. Errors carry the 1-based
/// number of the failing line.
pub fn parse_document(text: &str) -> Result<Transactions, TransactionParseError> {
    let transactions = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with(COMMENT))
        .map(|(i, line)| parse_line(line.trim_end()).map_err(|e| e.at_line(i + 1)))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(count = transactions.len(), "parsed transaction document");
    Ok(Transactions { transactions })
}

/// An ordered collection of transactions.
///
/// Two collections are equal when they hold the same transactions, in any
/// order.
#[derive(Debug, Clone, Default)]
pub struct Transactions {
    transactions: Vec<Transaction>,
}

impl Transactions {
    /// Create an empty collection.
    pub const fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Iterate over the transactions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    /// The transaction at `index`.
    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.transactions.get(index)
    }

    /// Add a transaction at the end.
    pub fn push(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    /// A copy of this collection with `transaction` added at the end.
    #[must_use]
    pub fn appended(&self, transaction: Transaction) -> Self {
        let mut result = self.clone();
        result.push(transaction);
        result
    }

    /// Apply `f` to every transaction.
    #[must_use]
    pub fn map(&self, f: impl Fn(&Transaction) -> Transaction) -> Self {
        self.transactions.iter().map(f).collect()
    }

    /// Keep the transactions matching `predicate`.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&Transaction) -> bool) -> Self {
        self.transactions
            .iter()
            .filter(|&t| predicate(t))
            .cloned()
            .collect()
    }

    /// Total money of all transactions.
    pub fn sum(&self) -> Money {
        self.transactions.iter().map(|t| &t.money).sum()
    }

    /// Partition the transactions by `key`, keeping their relative order.
    pub fn group(&self, key: impl Fn(&Transaction) -> String) -> GroupedTransactions {
        let mut groups: BTreeMap<String, Self> = BTreeMap::new();
        for transaction in &self.transactions {
            groups
                .entry(key(transaction))
                .or_default()
                .push(transaction.clone());
        }
        tracing::trace!(
            transactions = self.len(),
            groups = groups.len(),
            "grouped transactions"
        );
        GroupedTransactions::new(
            groups
                .into_iter()
                .map(|(k, v)| (k, Group::Leaf(v)))
                .collect(),
        )
    }

    /// Convert every transaction into `currency` at its own date.
    pub fn convert(&self, currency: &str, rates: &dyn RateSource) -> Result<Self, ConversionError> {
        self.transactions
            .iter()
            .map(|t| t.convert(currency, rates))
            .collect()
    }

    /// Collapse the transactions sharing a key into one transaction each.
    ///
    /// A merged transaction takes the latest date, the union of the tags
    /// and the total money. Distinct parameters of the same tag are sorted
    /// and joined with `, `.
    #[must_use]
    pub fn merge(&self, key: impl Fn(&Transaction) -> String) -> Self {
        let mut merged: BTreeMap<String, Merged> = BTreeMap::new();
        for transaction in &self.transactions {
            merged
                .entry(key(transaction))
                .or_insert_with(|| Merged::new(transaction))
                .absorb(transaction);
        }
        merged.into_values().map(Merged::finish).collect()
    }

    /// Merge every transaction into a single one.
    #[must_use]
    pub fn merge_all(&self) -> Self {
        self.merge(|_| String::new())
    }

    fn rendered(&self) -> Vec<String> {
        let mut lines: Vec<_> = self.transactions.iter().map(ToString::to_string).collect();
        lines.sort_unstable();
        lines
    }
}

struct Merged {
    date: chrono::NaiveDateTime,
    tags: BTreeMap<String, BTreeSet<String>>,
    money: Money,
}

impl Merged {
    fn new(first: &Transaction) -> Self {
        Self {
            date: first.date,
            tags: BTreeMap::new(),
            money: Money::new(),
        }
    }

    fn absorb(&mut self, transaction: &Transaction) {
        self.date = self.date.max(transaction.date);
        for (tag, param) in &transaction.tags {
            let params = self.tags.entry(tag.clone()).or_default();
            params.extend(param.iter().cloned());
        }
        self.money += &transaction.money;
    }

    fn finish(self) -> Transaction {
        let tags: Tags = self
            .tags
            .into_iter()
            .map(|(tag, params)| {
                let param = (!params.is_empty())
                    .then(|| params.into_iter().collect::<Vec<_>>().join(", "));
                (tag, param)
            })
            .collect();
        Transaction {
            date: self.date,
            tags,
            money: self.money,
        }
    }
}

impl PartialEq for Transactions {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.rendered() == other.rendered()
    }
}

impl Eq for Transactions {}

impl Monoid for Transactions {
    fn zero() -> Self {
        Self::new()
    }

    fn combine(&self, other: &Self) -> Self {
        self.iter().chain(other.iter()).cloned().collect()
    }
}

impl Add for &Transactions {
    type Output = Transactions;

    fn add(self, other: &Transactions) -> Transactions {
        self.combine(other)
    }
}

impl Add for Transactions {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self.transactions.extend(other.transactions);
        self
    }
}

/// Appends the negated transactions of the right side.
impl Sub for &Transactions {
    type Output = Transactions;

    fn sub(self, other: &Transactions) -> Transactions {
        self.iter().cloned().chain(other.iter().map(|t| -t)).collect()
    }
}

impl Sub for Transactions {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        &self - &other
    }
}

impl Index<usize> for Transactions {
    type Output = Transaction;

    fn index(&self, index: usize) -> &Transaction {
        &self.transactions[index]
    }
}

impl FromIterator<Transaction> for Transactions {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        Self {
            transactions: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Transaction>> for Transactions {
    fn from(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }
}

impl IntoIterator for Transactions {
    type Item = Transaction;
    type IntoIter = std::vec::IntoIter<Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.into_iter()
    }
}

impl<'a> IntoIterator for &'a Transactions {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

impl std::str::FromStr for Transactions {
    type Err = TransactionParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_document(text)
    }
}

impl fmt::Display for Transactions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, transaction) in self.transactions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{transaction}")?;
        }
        Ok(())
    }
}

/// One group of a [`GroupedTransactions`]: either transactions or a
/// further grouping of them.
#[derive(Debug, Clone)]
pub enum Group {
    /// Transactions not grouped any further.
    Leaf(Transactions),
    /// A nested grouping.
    Nested(GroupedTransactions),
}

impl Group {
    /// All transactions in this group, however deeply nested.
    pub fn flatten(&self) -> Transactions {
        match self {
            Self::Leaf(transactions) => transactions.clone(),
            Self::Nested(grouped) => grouped.flatten(),
        }
    }

    /// Total money in this group.
    pub fn sum(&self) -> Money {
        match self {
            Self::Leaf(transactions) => transactions.sum(),
            Self::Nested(grouped) => grouped.sum().sum(),
        }
    }

    fn map_with(&self, f: &dyn Fn(&Transaction) -> Transaction) -> Self {
        match self {
            Self::Leaf(transactions) => Self::Leaf(transactions.map(f)),
            Self::Nested(grouped) => Self::Nested(grouped.map_with(f)),
        }
    }

    fn filter_with(&self, f: &dyn Fn(&Transaction) -> bool) -> Self {
        match self {
            Self::Leaf(transactions) => Self::Leaf(transactions.filter(f)),
            Self::Nested(grouped) => Self::Nested(grouped.filter_with(f)),
        }
    }

    fn group_with(&self, key: &dyn Fn(&Transaction) -> String) -> GroupedTransactions {
        match self {
            Self::Leaf(transactions) => transactions.group(key),
            Self::Nested(grouped) => grouped.group_with(key),
        }
    }
}

impl Monoid for Group {
    fn zero() -> Self {
        Self::Leaf(Transactions::new())
    }

    fn combine(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Leaf(a), Self::Leaf(b)) => Self::Leaf(a + b),
            (Self::Nested(a), Self::Nested(b)) => Self::Nested(a + b),
            _ => Self::Leaf(&self.flatten() + &other.flatten()),
        }
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Leaf(a), Self::Leaf(b)) => a == b,
            (Self::Nested(a), Self::Nested(b)) => a == b,
            _ => self.flatten().is_empty() && other.flatten().is_empty(),
        }
    }
}

impl From<Transactions> for Group {
    fn from(transactions: Transactions) -> Self {
        Self::Leaf(transactions)
    }
}

impl From<GroupedTransactions> for Group {
    fn from(grouped: GroupedTransactions) -> Self {
        Self::Nested(grouped)
    }
}

/// Transactions partitioned under string keys, possibly several levels
/// deep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedTransactions {
    groups: Grouped<String, Group>,
}

impl GroupedTransactions {
    /// Create a grouping from a map of groups.
    pub fn new(groups: BTreeMap<String, Group>) -> Self {
        Self {
            groups: Grouped::new(groups),
        }
    }

    /// Number of groups at the top level.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Top-level keys in sorted order.
    pub fn groups(&self) -> impl Iterator<Item = &String> {
        self.groups.groups()
    }

    /// `(key, group)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Group)> {
        self.groups.iter()
    }

    /// Groups in key order.
    pub fn transactions(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// The group stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Group> {
        self.groups.get(&key.to_string())
    }

    /// All transactions, in key order.
    pub fn flatten(&self) -> Transactions {
        self.groups
            .values()
            .fold(Transactions::new(), |acc, group| acc + group.flatten())
    }

    /// Total money per top-level key.
    pub fn sum(&self) -> GroupedMoney {
        self.groups.map(Group::sum)
    }

    /// Partition every group further by `key`.
    pub fn group(&self, key: impl Fn(&Transaction) -> String) -> Self {
        self.group_with(&key)
    }

    /// Keep the transactions matching `predicate`; keys are preserved even
    /// when their group becomes empty.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&Transaction) -> bool) -> Self {
        self.filter_with(&predicate)
    }

    /// Apply `f` to every transaction.
    #[must_use]
    pub fn map(&self, f: impl Fn(&Transaction) -> Transaction) -> Self {
        self.map_with(&f)
    }

    fn group_with(&self, key: &dyn Fn(&Transaction) -> String) -> Self {
        Self {
            groups: self.groups.map(|g| Group::Nested(g.group_with(key))),
        }
    }

    fn filter_with(&self, f: &dyn Fn(&Transaction) -> bool) -> Self {
        Self {
            groups: self.groups.map(|g| g.filter_with(f)),
        }
    }

    fn map_with(&self, f: &dyn Fn(&Transaction) -> Transaction) -> Self {
        Self {
            groups: self.groups.map(|g| g.map_with(f)),
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        const INDENT: &str = "  ";
        for (i, (key, group)) in self.groups.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}{key}:", INDENT.repeat(indent))?;
            match group {
                Group::Nested(nested) if !nested.is_empty() => {
                    writeln!(f)?;
                    nested.fmt_indented(f, indent + 1)?;
                }
                Group::Nested(_) => {}
                Group::Leaf(transactions) => {
                    for transaction in transactions {
                        write!(f, "\n{}{transaction}", INDENT.repeat(indent + 1))?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl Monoid for GroupedTransactions {
    fn zero() -> Self {
        Self::default()
    }

    fn combine(&self, other: &Self) -> Self {
        Self {
            groups: &self.groups + &other.groups,
        }
    }
}

impl Add for &GroupedTransactions {
    type Output = GroupedTransactions;

    fn add(self, other: &GroupedTransactions) -> GroupedTransactions {
        self.combine(other)
    }
}

impl Add for GroupedTransactions {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.combine(&other)
    }
}

impl FromIterator<(String, Group)> for GroupedTransactions {
    fn from_iter<I: IntoIterator<Item = (String, Group)>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for GroupedTransactions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
