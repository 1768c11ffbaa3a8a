//! Currency conversion rates.
//!
//! Conversion goes through the [`RateSource`] trait so callers decide where
//! rates come from. [`RateCache`] is the table-backed implementation; it is
//! loaded and saved explicitly by the host application.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Currency that multi-currency values are converted to before ordering.
pub const REFERENCE_CURRENCY: &str = "EUR";

/// Symbols accepted in place of ISO codes.
const CURRENCY_ALIASES: &[(&str, &str)] = &[("€", "EUR"), ("$", "USD"), ("zł", "PLN")];

/// Resolve a currency symbol to its ISO code.
///
/// ```
/// use finanse_core::rates::canonical_currency;
///
/// assert_eq!(canonical_currency("zł"), "PLN");
/// assert_eq!(canonical_currency("CHF"), "CHF");
/// ```
pub fn canonical_currency(currency: &str) -> &str {
    CURRENCY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == currency)
        .map_or(currency, |&(_, code)| code)
}

/// Source of exchange rates.
pub trait RateSource {
    /// Number of `to` units one `from` unit buys on `date`.
    fn rate(&self, from: &str, to: &str, date: NaiveDate) -> Option<Decimal>;
}

impl<T: RateSource + ?Sized> RateSource for &T {
    fn rate(&self, from: &str, to: &str, date: NaiveDate) -> Option<Decimal> {
        (**self).rate(from, to, date)
    }
}

/// Error returned when money cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// No rate is known for the pair on that date.
    #[error("no conversion rate from '{from}' to '{to}' at {date}")]
    MissingRate {
        /// Source currency.
        from: String,
        /// Target currency.
        to: String,
        /// Date of the conversion.
        date: NaiveDate,
    },
    /// The converted amount does not fit in minor units.
    #[error("converted amount in '{to}' is out of range")]
    Overflow {
        /// Target currency.
        to: String,
    },
}

/// Error returned when the rate table cannot be read or written.
#[derive(Debug, Error)]
pub enum RateCacheError {
    /// Filesystem error.
    #[error("failed to access rate cache {}: {source}", path.display())]
    Io {
        /// Cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file does not contain a valid rate table.
    #[error("invalid rate cache {}: {source}", path.display())]
    Json {
        /// Cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Table of rates indexed by date, base currency and quote currency.
///
/// Dates are stored as `YYYY-MM-DD` strings so the JSON form stays a plain
/// nested object:
///
/// ```json
/// {"2016-01-01": {"PLN": {"EUR": "0.25"}}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateCache {
    rates: BTreeMap<String, BTreeMap<String, BTreeMap<String, Decimal>>>,
}

impl RateCache {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a JSON file. A missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self, RateCacheError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no rate cache, starting empty");
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path).map_err(|source| RateCacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cache: Self = serde_json::from_str(&text).map_err(|source| RateCacheError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), dates = cache.rates.len(), "loaded rate cache");
        Ok(cache)
    }

    /// Write the table to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), RateCacheError> {
        let io_err = |source| RateCacheError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| RateCacheError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(io_err)?;
        tracing::debug!(path = %path.display(), "saved rate cache");
        Ok(())
    }

    /// Record that one `base` unit buys `rate` units of `quote` on `date`.
    pub fn insert(&mut self, date: NaiveDate, base: &str, quote: &str, rate: Decimal) {
        self.rates
            .entry(date_key(date))
            .or_default()
            .entry(canonical_currency(base).to_string())
            .or_default()
            .insert(canonical_currency(quote).to_string(), rate);
    }

    /// Check whether the table holds no rates.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn direct(&self, base: &str, quote: &str, date: NaiveDate) -> Option<Decimal> {
        self.rates.get(&date_key(date))?.get(base)?.get(quote).copied()
    }
}

impl RateSource for RateCache {
    fn rate(&self, from: &str, to: &str, date: NaiveDate) -> Option<Decimal> {
        let from = canonical_currency(from);
        let to = canonical_currency(to);
        if from == to {
            return Some(Decimal::ONE);
        }
        if let Some(rate) = self.direct(from, to, date) {
            return Some(rate);
        }
        self.direct(to, from, date)
            .filter(|rate| !rate.is_zero())
            .map(|rate| Decimal::ONE / rate)
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
