//! Core types for finanse
//!
//! This crate provides the value types and the grouping algebra the rest of
//! finanse is built on:
//!
//! - [`Money`] - An amount spread over one or more currencies
//! - [`Transaction`] - A dated, tagged amount of money
//! - [`Transactions`] - An ordered collection of transactions
//! - [`Grouped`] - Values under sorted keys, combined through [`Monoid`]
//! - [`GroupedTransactions`] - Transactions partitioned by key, possibly nested
//! - [`RateCache`] - Exchange rates used to convert and order money
//!
//! # Example
//!
//! ```
//! use finanse_core::{parse_document, GroupedMoney};
//!
//! let transactions = parse_document(
//!     "2016-01-01 food 10zł\n# rent is paid monthly\n2016-02-01 rent 20zł",
//! )
//! .unwrap();
//!
//! let by_month = transactions.group(|t| t.date.format("%Y-%m").to_string());
//! let expected: GroupedMoney = "- 2016-01 = 10zł\n- 2016-02 = 20zł".parse().unwrap();
//! assert_eq!(by_month.sum(), expected);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod grouped;
pub mod money;
pub mod rates;
pub mod transaction;
pub mod transactions;

pub use grouped::{CommutativeMonoid, Grouped, GroupedMoney, Monoid};
pub use money::{Money, MoneyParseError};
pub use rates::{ConversionError, RateCache, RateCacheError, RateSource, REFERENCE_CURRENCY};
pub use transaction::{parse_line, Tags, Transaction, TransactionParseError};
pub use transactions::{parse_document, Group, GroupedTransactions, Transactions};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
