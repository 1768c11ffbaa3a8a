//! Multi-currency money stored in minor units.
//!
//! A [`Money`] value maps each currency code to an integer number of minor
//! units (hundredths). Values are immutable: every arithmetic operation
//! returns a new value.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::rates::{ConversionError, RateSource, REFERENCE_CURRENCY};

/// Number of minor units in one major unit.
pub const MINOR_UNITS: i64 = 100;

/// Error returned when text does not follow the money grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("can't parse '{text}' as money")]
pub struct MoneyParseError {
    /// The text that failed to parse.
    pub text: String,
}

impl MoneyParseError {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// An amount of money, possibly spread over several currencies.
///
/// Zero amounts are never stored, so two values are equal exactly when
/// their canonical renderings are equal. Arithmetic saturates at the range
/// of `i64` minor units; parsing rejects text whose total is out of range.
///
/// # Examples
///
/// ```
/// use finanse_core::Money;
///
/// let money: Money = "10,50zł + 3.00€".parse().unwrap();
/// assert_eq!(money.to_string(), "10,50 zł + 3,00 €");
///
/// let half: Money = "0,50 zł".parse().unwrap();
/// let total = &money + &half;
/// assert_eq!(total.minor_units("zł"), 1100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    amounts: BTreeMap<String, i64>,
}

impl Money {
    /// Create an empty amount of money.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            amounts: BTreeMap::new(),
        }
    }

    /// Create money holding `minor` hundredths of a single currency.
    #[must_use]
    pub fn from_minor(minor: i64, currency: impl Into<String>) -> Self {
        Self::from_amounts([(currency.into(), minor)])
    }

    /// Create money from `(currency, minor units)` pairs.
    ///
    /// Amounts for a repeated currency are added together.
    #[must_use]
    pub fn from_amounts<C: Into<String>>(amounts: impl IntoIterator<Item = (C, i64)>) -> Self {
        let mut money = Self::new();
        for (currency, minor) in amounts {
            money.accumulate(currency.into(), minor);
        }
        money
    }

    fn accumulate(&mut self, currency: String, minor: i64) {
        let entry = self.amounts.entry(currency).or_insert(0);
        *entry = entry.saturating_add(minor);
        if *entry == 0 {
            self.amounts.retain(|_, amount| *amount != 0);
        }
    }

    fn checked_accumulate(&mut self, currency: String, minor: i64) -> Option<()> {
        self.minor_units(&currency).checked_add(minor)?;
        self.accumulate(currency, minor);
        Some(())
    }

    /// Check whether no currency holds a non-zero amount.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Currencies present, sorted.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.amounts.keys().map(String::as_str)
    }

    /// Minor units held in `currency` (zero when absent).
    #[must_use]
    pub fn minor_units(&self, currency: &str) -> i64 {
        self.amounts.get(currency).copied().unwrap_or(0)
    }

    /// Iterate over `(currency, minor units)` pairs in currency order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.amounts.iter().map(|(c, a)| (c.as_str(), *a))
    }

    /// Convert the whole value into a single currency.
    ///
    /// Each currency is converted with the rate valid on `date` and the
    /// total is truncated toward zero.
    pub fn convert(
        &self,
        to: &str,
        date: NaiveDate,
        rates: &dyn RateSource,
    ) -> Result<Self, ConversionError> {
        let mut total = Decimal::ZERO;
        for (from, minor) in &self.amounts {
            let rate = rates
                .rate(from, to, date)
                .ok_or_else(|| ConversionError::MissingRate {
                    from: from.clone(),
                    to: to.to_string(),
                    date,
                })?;
            total = Decimal::from(*minor)
                .checked_mul(rate)
                .and_then(|converted| total.checked_add(converted))
                .ok_or_else(|| ConversionError::Overflow {
                    to: to.to_string(),
                })?;
        }
        let minor = total
            .trunc()
            .to_i64()
            .ok_or_else(|| ConversionError::Overflow {
                to: to.to_string(),
            })?;
        Ok(Self::from_minor(minor, to))
    }

    /// Compare two values of money.
    ///
    /// Values held in the same single currency compare directly. Anything
    /// else is converted to the reference currency first; `None` means a
    /// rate was missing.
    pub fn compare(
        &self,
        other: &Self,
        rates: &dyn RateSource,
        date: NaiveDate,
    ) -> Option<Ordering> {
        if self.amounts.len() <= 1
            && other.amounts.len() <= 1
            && (self.is_zero() || other.is_zero() || self.currencies().eq(other.currencies()))
        {
            let left: i64 = self.amounts.values().sum();
            let right: i64 = other.amounts.values().sum();
            return Some(left.cmp(&right));
        }
        let left = self.convert(REFERENCE_CURRENCY, date, rates).ok()?;
        let right = other.convert(REFERENCE_CURRENCY, date, rates).ok()?;
        Some(
            left.minor_units(REFERENCE_CURRENCY)
                .cmp(&right.minor_units(REFERENCE_CURRENCY)),
        )
    }

    fn map_amounts(&self, f: impl Fn(i64) -> i64) -> Self {
        Self::from_amounts(self.amounts.iter().map(|(c, a)| (c.clone(), f(*a))))
    }
}

fn money_term() -> &'static Regex {
    static TERM: OnceLock<Regex> = OnceLock::new();
    // sign, base units, optional one or two digit subunit, currency
    TERM.get_or_init(|| {
        Regex::new(r"^(-?)([0-9]+)(?:[.,]([0-9]{1,2}))?([^0-9]+)$")
            .expect("money term pattern is valid")
    })
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut money = Self::new();
        for term in text.split('+') {
            let caps = money_term()
                .captures(term.trim())
                .ok_or_else(|| MoneyParseError::new(text))?;
            let base: i64 = caps[2].parse().map_err(|_| MoneyParseError::new(text))?;
            let subunit = match caps.get(3).map(|m| m.as_str()) {
                None => 0,
                Some(digits) if digits.len() == 1 => {
                    digits.parse::<i64>().map_err(|_| MoneyParseError::new(text))? * 10
                }
                Some(digits) => digits.parse().map_err(|_| MoneyParseError::new(text))?,
            };
            let minor = base
                .checked_mul(MINOR_UNITS)
                .and_then(|b| b.checked_add(subunit))
                .ok_or_else(|| MoneyParseError::new(text))?;
            let sign = if caps[1].is_empty() { 1 } else { -1 };
            money
                .checked_accumulate(caps[4].trim().to_string(), sign * minor)
                .ok_or_else(|| MoneyParseError::new(text))?;
        }
        Ok(money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amounts.is_empty() {
            return write!(f, "0,00");
        }
        for (i, (currency, amount)) in self.amounts.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            let sign = if *amount < 0 { "-" } else { "" };
            let abs = amount.unsigned_abs();
            let minor = MINOR_UNITS.unsigned_abs();
            write!(f, "{sign}{},{:02} {currency}", abs / minor, abs % minor)?;
        }
        Ok(())
    }
}

// Arithmetic operations on references

impl Add for &Money {
    type Output = Money;

    fn add(self, other: &Money) -> Money {
        let mut sum = self.clone();
        sum += other;
        sum
    }
}

impl Sub for &Money {
    type Output = Money;

    fn sub(self, other: &Money) -> Money {
        let mut diff = self.clone();
        diff -= other;
        diff
    }
}

impl Neg for &Money {
    type Output = Money;

    fn neg(self) -> Money {
        self.map_amounts(i64::saturating_neg)
    }
}

impl Mul<i64> for &Money {
    type Output = Money;

    fn mul(self, factor: i64) -> Money {
        self.map_amounts(|a| a.saturating_mul(factor))
    }
}

/// Integer division per currency, truncating toward zero.
///
/// # Panics
///
/// Panics when `divisor` is zero, like integer division.
impl Div<i64> for &Money {
    type Output = Money;

    fn div(self, divisor: i64) -> Money {
        self.map_amounts(|a| a.saturating_div(divisor))
    }
}

// Arithmetic operations on owned values

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        &self + &other
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        &self - &other
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, factor: i64) -> Self {
        &self * factor
    }
}

impl Div<i64> for Money {
    type Output = Self;

    fn div(self, divisor: i64) -> Self {
        &self / divisor
    }
}

impl AddAssign<&Self> for Money {
    fn add_assign(&mut self, other: &Self) {
        for (currency, amount) in &other.amounts {
            self.accumulate(currency.clone(), *amount);
        }
    }
}

impl SubAssign<&Self> for Money {
    fn sub_assign(&mut self, other: &Self) {
        for (currency, amount) in &other.amounts {
            self.accumulate(currency.clone(), amount.saturating_neg());
        }
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::new(), |acc, m| &acc + &m)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::new(), |acc, m| &acc + m)
    }
}
