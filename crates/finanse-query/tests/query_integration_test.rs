//! Integration tests for the query language.
//!
//! Tests cover filtering and grouping documents end to end, rate-aware money
//! comparisons, and property tests over arbitrary query text.

use std::sync::Arc;

use finanse_core::{parse_document, GroupedMoney, NaiveDate, RateCache, Transaction, Transactions};
use finanse_query::{parse, GroupKey, ParseErrorKind, Query, TransactionsExt};
use proptest::prelude::*;
use rust_decimal_macros::dec;

// ============================================================================
// Helper Functions
// ============================================================================

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn make_test_transactions() -> Transactions {
    parse_document(
        "\
# January
2016-01-01 food shop(market) 10zł
2016-01-03 12:15 coffee shop(cafe) 4,50zł
2016-01-15 rent 1000zł

# February
2016-02-01 food shop(corner) 20zł
2016-02-10 travel 30€
2016-02-14 gift(anna) 50zł
",
    )
    .unwrap()
}

fn money_groups(text: &str) -> GroupedMoney {
    text.parse().unwrap()
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_group_by_year_month() {
    let transactions = parse_document("2016-01-01 a 10zł\n2016-02-01 b 20zł").unwrap();
    let grouped = transactions.group_by(&GroupKey::YearMonth);

    assert_eq!(grouped.groups().collect::<Vec<_>>(), ["2016-01", "2016-02"]);
    assert_eq!(
        grouped.get("2016-01").unwrap().flatten(),
        parse_document("2016-01-01 a 10zł").unwrap()
    );
    assert_eq!(
        grouped.sum(),
        money_groups("- 2016-01 = 10zł\n- 2016-02 = 20zł")
    );
    assert_eq!(
        grouped.sum().to_string(),
        "2016-01: 10,00 zł\n2016-02: 20,00 zł"
    );
}

#[test]
fn test_filter_then_group() {
    let spending = make_test_transactions()
        .filter_query("not rent and currency = zł")
        .unwrap();
    assert_eq!(spending.len(), 4);

    let by_shop = spending.group_by(&GroupKey::Tag("shop".to_string()));
    assert_eq!(
        by_shop.sum(),
        money_groups("- = 50zł\n- cafe = 4,50zł\n- corner = 20zł\n- market = 10zł")
    );
}

#[test]
fn test_nested_grouping() {
    let grouped = make_test_transactions()
        .filter_query("food or coffee")
        .unwrap()
        .group_by(&GroupKey::Month)
        .group_by(&GroupKey::Tag("shop".to_string()));

    assert_eq!(grouped.sum(), money_groups("- 01 = 14,50zł\n- 02 = 20zł"));
    assert_eq!(
        grouped.to_string(),
        "\
01:
  cafe:
    2016-01-03 12:15 coffee shop(cafe) 4,50 zł
  market:
    2016-01-01 food shop(market) 10,00 zł
02:
  corner:
    2016-02-01 food shop(corner) 20,00 zł"
    );
}

#[test]
fn test_grouped_difference_between_months() {
    let january = make_test_transactions()
        .filter_query("date < 2016-02-01")
        .unwrap()
        .group_by(&GroupKey::Tag("shop".to_string()))
        .sum();
    let february = make_test_transactions()
        .filter_query("date >= 2016-02-01 and currency = zł")
        .unwrap()
        .group_by(&GroupKey::Tag("shop".to_string()))
        .sum();

    let change = &february - &january;
    assert_eq!(
        change,
        money_groups(
            "- = -950zł\n- cafe = -4,50zł\n- corner = 20zł\n- market = -10zł"
        )
    );
}

#[test]
fn test_date_range_and_today() {
    let transactions = make_test_transactions();
    let query = Query::parse("date >= 2016-01-03 and date <= today").unwrap();

    let matching: Vec<_> = transactions
        .iter()
        .filter(|t| query.matches_on(t, date(2016, 2, 1)))
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        matching,
        [
            "2016-01-03 12:15 coffee shop(cafe) 4,50 zł",
            "2016-01-15 rent 1000,00 zł",
            "2016-02-01 food shop(corner) 20,00 zł",
        ]
    );
}

#[test]
fn test_money_comparison_across_currencies() {
    let transactions = make_test_transactions();
    let expensive = Query::parse("money > 25zł").unwrap();

    // without rates only same-currency amounts compare
    let found = transactions.filter_by(&expensive);
    assert_eq!(found.len(), 2);

    let mut rates = RateCache::new();
    rates.insert(date(2016, 2, 10), "zł", "€", dec!(0.25));
    let found = transactions.filter_by(&expensive.with_rates(Arc::new(rates)));
    assert_eq!(found.len(), 3);
    assert!(found.iter().any(|t| t.has_tag("travel")));
}

#[test]
fn test_convert_before_summing() {
    let mut rates = RateCache::new();
    rates.insert(date(2016, 2, 10), "€", "zł", dec!(4));
    let february = make_test_transactions()
        .filter_query("date >= 2016-02-01")
        .unwrap()
        .convert("zł", &rates)
        .unwrap();
    assert_eq!(february.sum(), "190zł".parse().unwrap());
}

#[test]
fn test_error_messages() {
    let cases = [
        ("test =", "unexpected end of query"),
        (")", "unbalanced parenthesis"),
        ("test == test", "invalid operator '=='"),
        ("= test", "missing expression"),
        ("money", "money can't be standalone"),
        ("date = 2016-13-01", "invalid date '2016-13-01'"),
    ];
    for (query, reason) in cases {
        let err = Query::parse(query).unwrap_err();
        assert_eq!(err.to_string(), format!("can't parse '{query}': {reason}"));
    }
}

#[test]
fn test_invalid_left_operand_kind() {
    let err = Query::parse("currency *= z").unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::InvalidLeftOperand {
            operand: "currency".to_string(),
            operator: "*=".to_string(),
        }
    );
}

#[test]
fn test_single_transaction_helpers() {
    let transaction: Transaction = "2016-01-01 Food 1zł".parse().unwrap();
    assert!(Query::parse("food").unwrap().matches(&transaction));
    assert!(Query::parse("FOOD and currency ^= z").is_err());
}

#[test]
fn test_long_flat_chain_is_rejected() {
    let err = Query::parse(&vec!["food"; 1_000].join(" ")).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TooDeep);

    let query = Query::parse(&vec!["food"; 200].join(" or ")).unwrap();
    assert_eq!(make_test_transactions().filter_by(&query).len(), 2);
}

// ============================================================================
// Properties
// ============================================================================

fn arb_query_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("food".to_string()),
            Just("shop".to_string()),
            Just("date".to_string()),
            Just("money".to_string()),
            Just("currency".to_string()),
            Just("and".to_string()),
            Just("or".to_string()),
            Just("not".to_string()),
            Just("(".to_string()),
            Just(")".to_string()),
            Just("=".to_string()),
            Just("^=".to_string()),
            Just("<".to_string()),
            Just("==".to_string()),
            Just("'market'".to_string()),
            Just("\"".to_string()),
            Just("2016-01-01".to_string()),
            Just("today".to_string()),
            Just("10zł".to_string()),
            "[a-z]{1,3}",
        ],
        0..12,
    )
    .prop_map(|words| words.join(" "))
}

fn arb_tag_expression() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("food".to_string()),
        Just("rent".to_string()),
        Just("shop = market".to_string()),
        Just("shop ^= m".to_string()),
    ];
    leaf.prop_recursive(4, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} and {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a}) or ({b})")),
            inner.prop_map(|a| format!("not ({a})")),
        ]
    })
}

proptest! {
    /// Compiling never panics, and a compiled query evaluates to a plain bool
    #[test]
    fn prop_evaluation_is_total(text in arb_query_text()) {
        if let Ok(query) = Query::parse(&text) {
            for transaction in &make_test_transactions() {
                let _ = query.matches_on(transaction, date(2016, 1, 1));
            }
        }
    }

    /// The canonical rendering parses back to the same tree
    #[test]
    fn prop_canonical_rendering_is_stable(text in arb_tag_expression()) {
        let ast = parse(&text).unwrap();
        prop_assert_eq!(parse(&ast.to_string()).unwrap(), ast);
    }

    /// `not` flips every result
    #[test]
    fn prop_not_negates(text in arb_tag_expression()) {
        let query = Query::parse(&text).unwrap();
        let negated = Query::parse(&format!("not ({text})")).unwrap();
        for transaction in &make_test_transactions() {
            prop_assert_ne!(query.matches(transaction), negated.matches(transaction));
        }
    }

    /// Filtering by a query and its negation partitions the transactions
    #[test]
    fn prop_filter_partitions(text in arb_tag_expression()) {
        let transactions = make_test_transactions();
        let kept = transactions.filter_query(&text).unwrap();
        let dropped = transactions.filter_query(&format!("not ({text})")).unwrap();
        prop_assert_eq!(&kept + &dropped, transactions);
    }
}
