//! Query language for finanse transactions.
//!
//! A query is a boolean expression over tags and a few keywords:
//!
//! - `food` - the transaction has the tag `food`
//! - `food shop` - both tags (adjacent tags are joined with `and`)
//! - `shop = market`, `shop ^= super` - compare a tag parameter
//! - `date >= 2016-01-01`, `date = today` - compare the day
//! - `money > 100zł` - compare the amount
//! - `currency = €` - compare the currencies used
//! - `and`, `or`, `not` and parentheses combine conditions
//!
//! # Example
//!
//! ```
//! use finanse_core::parse_document;
//! use finanse_query::{GroupKey, TransactionsExt};
//!
//! let transactions = parse_document(
//!     "2016-01-01 food 10zł\n2016-01-05 food shop(market) 25zł\n2016-02-01 rent 500zł",
//! )
//! .unwrap();
//!
//! let food = transactions.filter_query("food and not (shop = corner)").unwrap();
//! let per_month = food.group_by(&GroupKey::YearMonth).sum();
//! assert_eq!(per_month.to_string(), "2016-01: 35,00 zł");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod error;
pub mod eval;
pub mod group_by;
pub mod lexer;
pub mod parser;

pub use ast::{Ast, Atom, AtomKind, BinaryOp, Relation};
pub use error::{ParseErrorKind, QueryParseError};
pub use eval::Query;
pub use group_by::{GroupKey, TransactionsExt};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse;
