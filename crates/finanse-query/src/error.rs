//! Query error types.

use finanse_core::MoneyParseError;
use thiserror::Error;

/// Error returned when a query cannot be lexed, parsed or compiled.
///
/// The message always embeds the original query text:
///
/// ```
/// use finanse_query::Query;
///
/// let err = Query::parse("test ==").unwrap_err();
/// assert_eq!(err.to_string(), "can't parse 'test ==': invalid operator '=='");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("can't parse '{query}': {kind}")]
pub struct QueryParseError {
    /// The query text as given.
    pub query: String,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

impl QueryParseError {
    /// Create a new error for `query`.
    pub fn new(query: &str, kind: ParseErrorKind) -> Self {
        Self {
            query: query.to_string(),
            kind,
        }
    }
}

/// The kind of query error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Input ended where an expression or a closing quote was expected.
    #[error("unexpected end of query")]
    UnexpectedEnd,
    /// A parenthesis has no partner.
    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,
    /// An operator appeared where an operand was expected.
    #[error("missing expression")]
    MissingExpression,
    /// An operator that does not exist.
    #[error("invalid operator '{0}'")]
    InvalidOperator(String),
    /// The left operand is not allowed for the operator.
    #[error("'{operand}' can't be on the left side of '{operator}' operator")]
    InvalidLeftOperand {
        /// Canonical rendering of the operand.
        operand: String,
        /// The operator symbol.
        operator: String,
    },
    /// The right operand is not allowed for the operator.
    #[error("'{operand}' can't be on the right side of '{operator}' operator")]
    InvalidRightOperand {
        /// Canonical rendering of the operand.
        operand: String,
        /// The operator symbol.
        operator: String,
    },
    /// A keyword or string used as a whole query.
    #[error("{0} can't be standalone")]
    Standalone(String),
    /// Parentheses or `not` nested past the supported depth.
    #[error("expression nested too deeply")]
    TooDeep,
    /// A `date` comparison against something that is not a date.
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    /// A `money` comparison against something that is not money.
    #[error(transparent)]
    InvalidMoney(#[from] MoneyParseError),
}
