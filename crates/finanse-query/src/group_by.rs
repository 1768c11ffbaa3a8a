//! Group keys and query-driven helpers for transaction collections.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use finanse_core::{GroupedTransactions, Transaction, Transactions};

use crate::error::QueryParseError;
use crate::eval::Query;

/// How transactions are bucketed by [`TransactionsExt::group_by`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// `year`: `2016`
    Year,
    /// `month`: `01`
    Month,
    /// `day`: `31`
    Day,
    /// `weekday`: `Monday`
    Weekday,
    /// `year-month`: `2016-01`
    YearMonth,
    /// `year-month-day` or `date`: `2016-01-31`
    Date,
    /// Any other word: the parameter of that tag, empty when absent.
    Tag(String),
}

impl GroupKey {
    /// Resolve a key name; unknown names group by tag parameter.
    pub fn parse(text: &str) -> Self {
        match text {
            "year" => Self::Year,
            "month" => Self::Month,
            "day" => Self::Day,
            "weekday" => Self::Weekday,
            "year-month" => Self::YearMonth,
            "year-month-day" | "date" => Self::Date,
            tag => Self::Tag(tag.to_string()),
        }
    }

    /// The group a transaction belongs to.
    pub fn key(&self, transaction: &Transaction) -> String {
        let format = match self {
            Self::Year => "%Y",
            Self::Month => "%m",
            Self::Day => "%d",
            Self::Weekday => "%A",
            Self::YearMonth => "%Y-%m",
            Self::Date => "%Y-%m-%d",
            Self::Tag(tag) => return transaction.tag_value(tag).to_string(),
        };
        transaction.date.format(format).to_string()
    }
}

impl FromStr for GroupKey {
    type Err = Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(text))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Weekday => "weekday",
            Self::YearMonth => "year-month",
            Self::Date => "date",
            Self::Tag(tag) => tag,
        })
    }
}

/// Filtering and grouping with queries and group keys.
///
/// ```
/// use finanse_core::parse_document;
/// use finanse_query::{GroupKey, TransactionsExt};
///
/// let transactions = parse_document("2016-01-01 a 10zł\n2016-02-01 b 20zł").unwrap();
/// let grouped = transactions
///     .filter_query("a or b")
///     .unwrap()
///     .group_by(&GroupKey::YearMonth);
/// assert_eq!(grouped.groups().collect::<Vec<_>>(), ["2016-01", "2016-02"]);
/// ```
pub trait TransactionsExt: Sized {
    /// Grouped result of [`TransactionsExt::group_by`].
    type Grouped;

    /// Keep the transactions matching a compiled query.
    #[must_use]
    fn filter_by(&self, query: &Query) -> Self;

    /// Parse `query` and keep the transactions matching it.
    fn filter_query(&self, query: &str) -> Result<Self, QueryParseError> {
        Ok(self.filter_by(&Query::parse(query)?))
    }

    /// Partition by a group key.
    fn group_by(&self, key: &GroupKey) -> Self::Grouped;
}

impl TransactionsExt for Transactions {
    type Grouped = GroupedTransactions;

    fn filter_by(&self, query: &Query) -> Self {
        self.filter(|t| query.matches(t))
    }

    fn group_by(&self, key: &GroupKey) -> GroupedTransactions {
        self.group(|t| key.key(t))
    }
}

impl TransactionsExt for GroupedTransactions {
    type Grouped = Self;

    fn filter_by(&self, query: &Query) -> Self {
        self.filter(|t| query.matches(t))
    }

    fn group_by(&self, key: &GroupKey) -> Self {
        self.group(|t| key.key(t))
    }
}
