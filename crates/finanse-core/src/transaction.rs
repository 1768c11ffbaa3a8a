//! Tagged, dated transactions and their one-line text form.
//!
//! ```text
//! 2016-01-01 12:30 food shop(big store) 10,50 zł
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use crate::money::Money;
use crate::rates::{ConversionError, RateSource};

/// Date format used at the start of every transaction line.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Optional time format following the date.
pub const TIME_FORMAT: &str = "%H:%M";

const DATE_FORMAT_LENGTH: usize = "2016-01-01".len();

/// Tag names mapped to their optional parameter.
pub type Tags = BTreeMap<String, Option<String>>;

/// Error returned when a transaction line cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionParseError {
    /// The fragment that failed to parse.
    pub what: String,
    /// Which part of the line was being parsed (`date`, `money`, `tags`).
    pub field: &'static str,
    /// The whole line.
    pub line: String,
    /// 1-based line number, when parsed from a document.
    pub line_number: Option<usize>,
}

impl TransactionParseError {
    fn new(what: impl Into<String>, field: &'static str, line: &str) -> Self {
        Self {
            what: what.into(),
            field,
            line: line.to_string(),
            line_number: None,
        }
    }

    /// Attach the 1-based line number of the failing line.
    #[must_use]
    pub const fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }
}

impl fmt::Display for TransactionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "can't parse '{}' as {} from '{}'",
            self.what, self.field, self.line
        )?;
        if let Some(n) = self.line_number {
            write!(f, " at line: {n}")?;
        }
        Ok(())
    }
}

impl std::error::Error for TransactionParseError {}

/// A dated, tagged amount of money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// When the transaction happened.
    pub date: NaiveDateTime,
    /// Tags attached to this transaction.
    pub tags: Tags,
    /// Amount of the transaction.
    pub money: Money,
}

impl Transaction {
    /// Create an untagged transaction at midnight of `date`.
    #[must_use]
    pub fn new(date: NaiveDate, money: Money) -> Self {
        Self {
            date: date.and_time(NaiveTime::MIN),
            tags: Tags::new(),
            money,
        }
    }

    /// Set the time of day.
    #[must_use]
    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.date = self.date.date().and_time(time);
        self
    }

    /// Add a tag without a parameter.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into(), None);
        self
    }

    /// Add a tag carrying a parameter.
    #[must_use]
    pub fn with_param(mut self, tag: impl Into<String>, param: impl Into<String>) -> Self {
        self.tags.insert(tag.into(), Some(param.into()));
        self
    }

    /// Calendar day of the transaction.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// Check for a tag, ignoring case.
    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.find_tag(name).is_some()
    }

    /// Parameter of a tag (tag name matched ignoring case).
    ///
    /// Returns `""` both when the tag has no parameter and when the tag is
    /// missing; use [`Transaction::has_tag`] to tell them apart.
    #[must_use]
    pub fn tag_value(&self, name: &str) -> &str {
        self.find_tag(name).flatten().unwrap_or("")
    }

    fn find_tag(&self, name: &str) -> Option<Option<&str>> {
        if let Some(param) = self.tags.get(name) {
            return Some(param.as_deref());
        }
        let name = name.to_lowercase();
        self.tags
            .iter()
            .find(|(tag, _)| tag.to_lowercase() == name)
            .map(|(_, param)| param.as_deref())
    }

    /// Convert the money into `currency` at the transaction's own date.
    pub fn convert(&self, currency: &str, rates: &dyn RateSource) -> Result<Self, ConversionError> {
        Ok(Self {
            date: self.date,
            tags: self.tags.clone(),
            money: self.money.convert(currency, self.day(), rates)?,
        })
    }
}

impl Neg for &Transaction {
    type Output = Transaction;

    fn neg(self) -> Transaction {
        Transaction {
            date: self.date,
            tags: self.tags.clone(),
            money: -&self.money,
        }
    }
}

impl Neg for Transaction {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            money: -self.money,
            ..self
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format(DATE_FORMAT))?;
        if self.date.time() != NaiveTime::MIN {
            write!(f, " {}", self.date.format(TIME_FORMAT))?;
        }
        for (tag, param) in &self.tags {
            match param {
                Some(param) => write!(f, " {tag}({param})")?,
                None => write!(f, " {tag}")?,
            }
        }
        write!(f, " {}", self.money)
    }
}

impl FromStr for Transaction {
    type Err = TransactionParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        parse_line(line)
    }
}

/// Parse one transaction line: `YYYY-MM-DD [HH:MM] tags... money`.
pub fn parse_line(line: &str) -> Result<Transaction, TransactionParseError> {
    let date_text = line.get(..DATE_FORMAT_LENGTH).unwrap_or(line);
    let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
        .map_err(|_| TransactionParseError::new(date_text, "date", line))?;
    let mut rest = line[date_text.len()..].trim();

    let mut time = NaiveTime::MIN;
    if let Some(word) = rest.split_whitespace().next() {
        if let Ok(parsed) = NaiveTime::parse_from_str(word, TIME_FORMAT) {
            time = parsed;
            rest = rest[word.len()..].trim_start();
        }
    }

    let (money, tags_text) = split_money(rest, line)?;
    let tags = parse_tags(tags_text)
        .ok_or_else(|| TransactionParseError::new(tags_text, "tags", line))?;

    Ok(Transaction {
        date: date.and_time(time),
        tags,
        money,
    })
}

/// Take the money off the end of `rest`: the last word, or the last two
/// words when the currency is separated by a space (`10 zł`).
fn split_money<'a>(rest: &'a str, line: &str) -> Result<(Money, &'a str), TransactionParseError> {
    let (head, last) = rest
        .rsplit_once(char::is_whitespace)
        .map_or(("", rest), |(head, last)| (head.trim_end(), last));
    if let Ok(money) = last.parse::<Money>() {
        return Ok((money, head));
    }
    let (head, second) = head
        .rsplit_once(char::is_whitespace)
        .map_or(("", head), |(head, second)| (head.trim_end(), second));
    let two_words = format!("{second} {last}");
    two_words.parse::<Money>().map(|money| (money, head)).map_err(|_| {
        TransactionParseError::new(format!("{two_words} or {last}"), "money", line)
    })
}

#[derive(Debug, PartialEq, Eq)]
enum TagToken {
    Word(String),
    Open,
    Close,
}

/// Split tag text on top-level whitespace and parentheses. Text nested
/// inside a parameter is kept verbatim.
fn tokenize_tags(text: &str) -> Option<Vec<TagToken>> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut depth = 0usize;

    let flush = |word: &mut String, tokens: &mut Vec<TagToken>| {
        if !word.is_empty() {
            tokens.push(TagToken::Word(std::mem::take(word)));
        }
    };

    for c in text.chars() {
        match c {
            ' ' | '\t' if depth == 0 => flush(&mut word, &mut tokens),
            '(' => {
                if depth == 0 {
                    flush(&mut word, &mut tokens);
                    tokens.push(TagToken::Open);
                } else {
                    word.push(c);
                }
                depth += 1;
            }
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    flush(&mut word, &mut tokens);
                    tokens.push(TagToken::Close);
                } else {
                    word.push(c);
                }
            }
            _ => word.push(c),
        }
    }
    if depth != 0 {
        return None;
    }
    flush(&mut word, &mut tokens);
    Some(tokens)
}

/// Parse `tag tag(param) ...`. Returns `None` on malformed input.
fn parse_tags(text: &str) -> Option<Tags> {
    let mut tokens = tokenize_tags(text)?.into_iter().peekable();
    let mut tags = Tags::new();
    while let Some(token) = tokens.next() {
        let TagToken::Word(name) = token else {
            return None;
        };
        let param = if tokens.peek() == Some(&TagToken::Open) {
            tokens.next();
            let Some(TagToken::Word(param)) = tokens.next() else {
                return None;
            };
            if tokens.next() != Some(TagToken::Close) {
                return None;
            }
            Some(param)
        } else {
            None
        };
        tags.insert(name, param);
    }
    Some(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn money(text: &str) -> Money {
        text.parse().unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let t: Transaction = "2016-01-01 test 10zł".parse().unwrap();
        assert_eq!(t.day(), date(2016, 1, 1));
        assert!(t.has_tag("test"));
        assert_eq!(t.money, money("10zł"));
    }

    #[test]
    fn test_parse_with_time() {
        let t: Transaction = "2016-01-01 12:30 test 10zł".parse().unwrap();
        assert_eq!(t.date.time(), NaiveTime::from_hms_opt(12, 30, 0).unwrap());
        assert_eq!(t.to_string(), "2016-01-01 12:30 test 10,00 zł");
    }

    #[test]
    fn test_parse_money_with_space() {
        let t: Transaction = "2016-01-01 a b 10 zł".parse().unwrap();
        assert_eq!(t.money, money("10zł"));
        assert_eq!(t.tags.len(), 2);
    }

    #[test]
    fn test_parse_tag_params() {
        let t: Transaction = "2016-01-01 shop(big store) food 10,50zł".parse().unwrap();
        assert_eq!(t.tag_value("shop"), "big store");
        assert_eq!(t.tag_value("food"), "");
        assert_eq!(t.tag_value("missing"), "");
        assert!(t.has_tag("food"));
        assert!(!t.has_tag("missing"));
    }

    #[test]
    fn test_parse_nested_parentheses_in_param() {
        let t: Transaction = "2016-01-01 note(a (b) c) 1zł".parse().unwrap();
        assert_eq!(t.tag_value("note"), "a (b) c");
    }

    #[test]
    fn test_tag_lookup_ignores_case() {
        let t: Transaction = "2016-01-01 Shop(x) 1zł".parse().unwrap();
        assert!(t.has_tag("shop"));
        assert_eq!(t.tag_value("SHOP"), "x");
    }

    #[test]
    fn test_parse_without_tags() {
        let t: Transaction = "2016-01-01 10zł".parse().unwrap();
        assert!(t.tags.is_empty());
        assert_eq!(t.to_string(), "2016-01-01 10,00 zł");
    }

    #[test]
    fn test_parse_invalid_date() {
        let err = "2016-13-01 test 10zł".parse::<Transaction>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "can't parse '2016-13-01' as date from '2016-13-01 test 10zł'"
        );
    }

    #[test]
    fn test_parse_invalid_money() {
        let err = "2016-01-01 test xx".parse::<Transaction>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "can't parse 'test xx or xx' as money from '2016-01-01 test xx'"
        );
    }

    #[test]
    fn test_parse_unbalanced_param() {
        for line in ["2016-01-01 shop(x 10zł", "2016-01-01 shop) 10zł", "2016-01-01 shop() 10zł"] {
            let err = line.parse::<Transaction>().unwrap_err();
            assert_eq!(err.field, "tags");
        }
    }

    #[test]
    fn test_error_line_number() {
        let err = "2016-01-01 test xx".parse::<Transaction>().unwrap_err().at_line(3);
        assert!(err.to_string().ends_with(" at line: 3"));
    }

    #[test]
    fn test_display_sorted_tags() {
        let t = Transaction::new(date(2016, 1, 1), money("10zł"))
            .with_tag("b")
            .with_param("a", "x");
        assert_eq!(t.to_string(), "2016-01-01 a(x) b 10,00 zł");
    }

    #[test]
    fn test_neg() {
        let t: Transaction = "2016-01-01 test 10zł".parse().unwrap();
        let neg = -&t;
        assert_eq!(neg.money, money("-10zł"));
        assert_eq!(neg.tags, t.tags);
        assert_eq!(neg.date, t.date);
    }
}
