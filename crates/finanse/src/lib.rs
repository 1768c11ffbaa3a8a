//! Command-line tools for finanse.
//!
//! This crate provides the `fin` binary, which loads a transaction document,
//! filters it with a query, groups it by one or more keys and prints the
//! totals.
//!
//! # Example Usage
//!
//! ```bash
//! fin budget.txt
//! fin budget.txt -q "food and not (shop = corner)" -b year-month
//! fin budget.txt -b year -b shop --convert zł
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
