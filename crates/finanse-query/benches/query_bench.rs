//! Query compilation and filtering benchmarks.
//!
//! Run with: cargo bench -p finanse-query

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::NaiveDate;
use finanse_core::{Money, Transaction, Transactions};
use finanse_query::{GroupKey, Query, TransactionsExt};

/// Generate sample transactions for benchmarking.
fn generate_transactions(count: usize) -> Transactions {
    let categories = ["food", "coffee", "groceries", "transport"];
    let shops = ["corner", "market", "cafe", "station", "supermarket"];

    let mut day = 1u32;
    let mut month = 1u32;
    let mut year = 2016i32;

    let mut transactions = Transactions::new();
    for i in 0..count {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let minor = 1000 + (i as i64 % 100) * 10;
        transactions.push(
            Transaction::new(date, Money::from_minor(minor, "zł"))
                .with_tag(categories[i % categories.len()])
                .with_param("shop", shops[i % shops.len()]),
        );

        day += 1;
        if day > 28 {
            day = 1;
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
    }
    transactions
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_compile");

    group.bench_function("simple_tag", |b| {
        b.iter(|| Query::parse(black_box("food")));
    });

    group.bench_function("mixed", |b| {
        b.iter(|| {
            Query::parse(black_box(
                "(food or coffee) and not (shop ^= super) and date >= 2016-03-01 and money < 15zł",
            ))
        });
    });

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let transactions = generate_transactions(1000);

    let mut group = c.benchmark_group("query_filter");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("tag", |b| {
        let query = Query::parse("food").unwrap();
        b.iter(|| black_box(&transactions).filter_by(&query));
    });

    group.bench_function("tag_param_and_date", |b| {
        let query = Query::parse("shop *= market and date < 2017-01-01").unwrap();
        b.iter(|| black_box(&transactions).filter_by(&query));
    });

    group.finish();
}

fn bench_group_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by_scaling");

    for size in [100, 500, 1000, 5000] {
        let transactions = generate_transactions(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &transactions,
            |b, transactions| {
                b.iter(|| {
                    black_box(transactions)
                        .group_by(&GroupKey::YearMonth)
                        .group_by(&GroupKey::Tag("shop".to_string()))
                        .sum()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_filter, bench_group_scaling);
criterion_main!(benches);
