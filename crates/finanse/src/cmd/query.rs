//! fin - Filter, group and sum tagged transactions.
//!
//! Reads a transaction document, keeps the transactions matching a query,
//! groups them by one or more keys and prints the total of every group.
//!
//! # Usage
//!
//! ```bash
//! fin budget.txt
//! fin budget.txt -q "food or coffee" -b year-month -b shop
//! fin budget.txt -q "date >= 2016-01-01" --list
//! fin budget.txt --convert zł --add-rate 2016-02-10:€:zł:4.3
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use finanse_core::{
    parse_document, Decimal, Group, GroupedTransactions, NaiveDate, RateCache, Transactions,
};
use finanse_query::{GroupKey, Query, TransactionsExt};
use tracing_subscriber::EnvFilter;

/// Filter, group and sum tagged transactions
#[derive(Parser, Debug)]
#[command(name = "fin")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The transaction document to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Keep only the transactions matching this query
    #[arg(short, long)]
    pub query: Option<String>,

    /// Group by a key (year, month, day, weekday, year-month, date or a tag name).
    /// Repeat to nest groups.
    #[arg(short, long = "by", value_name = "KEY")]
    pub by: Vec<GroupKey>,

    /// Convert every transaction to this currency before summing
    #[arg(short, long, value_name = "CURRENCY")]
    pub convert: Option<String>,

    /// Rate table to use [default: <cache dir>/finanse/rates.json]
    #[arg(long, value_name = "PATH")]
    pub rates: Option<PathBuf>,

    /// Record a rate in the rate table, as DATE:FROM:TO:RATE
    #[arg(long = "add-rate", value_name = "RATE")]
    pub add_rate: Vec<RateEntry>,

    /// Merge the transactions that share every group key
    #[arg(short, long)]
    pub merge: bool,

    /// Print the transactions instead of their totals
    #[arg(short, long)]
    pub list: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// One rate given on the command line: one `from` unit buys `rate` units
/// of `to` on `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateEntry {
    /// Day the rate applies to.
    pub date: NaiveDate,
    /// Currency being converted from.
    pub from: String,
    /// Currency being converted to.
    pub to: String,
    /// Units of `to` per unit of `from`.
    pub rate: Decimal,
}

impl FromStr for RateEntry {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let fields: Vec<_> = text.split(':').collect();
        let [date, from, to, rate] = fields.as_slice() else {
            return Err(format!("expected DATE:FROM:TO:RATE, got '{text}'"));
        };
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{date}': {e}"))?;
        let rate = rate
            .replace(',', ".")
            .parse()
            .map_err(|e| format!("invalid rate '{rate}': {e}"))?;
        if from.is_empty() || to.is_empty() {
            return Err(format!("missing currency in '{text}'"));
        }
        Ok(Self {
            date,
            from: (*from).to_string(),
            to: (*to).to_string(),
            rate,
        })
    }
}

/// Main entry point for the fin command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let output = report(args)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Produce everything the command prints for `args`.
pub fn report(args: &Args) -> Result<String> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let mut transactions = parse_document(&text)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;
    tracing::debug!(count = transactions.len(), "loaded transactions");

    let rates_path = rates_path(args)?;
    let mut rates = RateCache::load(&rates_path)?;
    if !args.add_rate.is_empty() {
        for entry in &args.add_rate {
            rates.insert(entry.date, &entry.from, &entry.to, entry.rate);
        }
        rates.save(&rates_path)?;
    }

    if let Some(text) = &args.query {
        let query = Query::parse(text)?.with_rates(Arc::new(rates.clone()));
        transactions = transactions.filter_by(&query);
        tracing::debug!(query = %query, kept = transactions.len(), "filtered transactions");
    }

    if let Some(currency) = &args.convert {
        transactions = transactions
            .convert(currency, &rates)
            .with_context(|| format!("failed to convert to {currency}"))?;
    }

    if args.merge {
        transactions = transactions.merge(|t| {
            args.by
                .iter()
                .map(|key| key.key(t))
                .collect::<Vec<_>>()
                .join("\u{1f}")
        });
    }

    let Some(grouped) = group_all(&transactions, &args.by) else {
        return Ok(if args.list {
            transactions.to_string()
        } else {
            transactions.sum().to_string()
        });
    };

    if args.list {
        return Ok(grouped.to_string());
    }
    let mut lines = Vec::new();
    render_sums(&grouped, 0, &mut lines);
    Ok(lines.join("\n"))
}

fn rates_path(args: &Args) -> Result<PathBuf> {
    if let Some(path) = &args.rates {
        return Ok(path.clone());
    }
    let cache = dirs::cache_dir().context("could not determine cache directory")?;
    Ok(default_rates_path(&cache))
}

fn default_rates_path(cache: &Path) -> PathBuf {
    cache.join("finanse").join("rates.json")
}

fn group_all(transactions: &Transactions, keys: &[GroupKey]) -> Option<GroupedTransactions> {
    let (first, rest) = keys.split_first()?;
    let grouped = rest
        .iter()
        .fold(transactions.group_by(first), |grouped, key| grouped.group_by(key));
    Some(grouped)
}

fn render_sums(grouped: &GroupedTransactions, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for (key, group) in grouped.iter() {
        lines.push(format!("{indent}{key}: {}", group.sum()));
        if let Group::Nested(inner) = group {
            render_sums(inner, depth + 1, lines);
        }
    }
}
