//! Property-based tests for finanse-core.
//!
//! These tests verify the algebraic laws of money and groupings hold for
//! arbitrary inputs using proptest.
//!
//! Run with: cargo test -p finanse-core --test `property_tests`

use chrono::NaiveDate;
use finanse_core::{
    CommutativeMonoid, Grouped, GroupedMoney, Money, Monoid, Transaction, Transactions,
};
use proptest::prelude::*;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_currency() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("zł".to_string()),
        Just("€".to_string()),
        Just("$".to_string()),
        Just("CHF".to_string()),
    ]
}

fn arb_money() -> impl Strategy<Value = Money> {
    prop::collection::vec((arb_currency(), -1_000_000i64..1_000_000i64), 0..4)
        .prop_map(|amounts| Money::from_amounts(amounts))
}

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("food".to_string()),
        Just("rent".to_string()),
        Just("2016-01".to_string()),
        Just("2016-02".to_string()),
        Just(String::new()),
    ]
}

fn arb_grouped() -> impl Strategy<Value = GroupedMoney> {
    prop::collection::btree_map(arb_key(), arb_money(), 0..5).prop_map(Grouped::from)
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2015i32..2018i32, 1u32..13u32, 1u32..29u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_transactions() -> impl Strategy<Value = Transactions> {
    prop::collection::vec((arb_date(), arb_key(), arb_money()), 0..10).prop_map(|items| {
        items
            .into_iter()
            .map(|(date, tag, money)| {
                let t = Transaction::new(date, money);
                if tag.is_empty() {
                    t
                } else {
                    t.with_tag(tag)
                }
            })
            .collect()
    })
}

// ============================================================================
// Money Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Zero is the additive identity
    #[test]
    fn prop_money_zero_identity(m in arb_money()) {
        prop_assert_eq!(&m + &Money::zero(), m.clone());
        prop_assert_eq!(&Money::zero() + &m, m);
    }

    /// Addition is commutative and associative
    #[test]
    fn prop_money_addition_laws(a in arb_money(), b in arb_money(), c in arb_money()) {
        prop_assert_eq!(&a + &b, &b + &a);
        prop_assert_eq!(&(&a + &b) + &c, &a + &(&b + &c));
    }

    /// Subtraction undoes addition
    #[test]
    fn prop_money_sub_inverse(a in arb_money(), b in arb_money()) {
        prop_assert_eq!(a.combine(&b).difference(&b), a);
    }

    /// The canonical rendering parses back to the same value
    #[test]
    fn prop_money_display_parses_back(m in arb_money()) {
        prop_assume!(!m.is_zero());
        let parsed: Money = m.to_string().parse().unwrap();
        prop_assert_eq!(parsed, m);
    }
}

// ============================================================================
// Grouping Properties
// ============================================================================

proptest! {
    /// g + zero == g
    #[test]
    fn prop_grouped_zero_identity(g in arb_grouped()) {
        prop_assert_eq!(&g + &GroupedMoney::zero(), g.clone());
        prop_assert_eq!(&GroupedMoney::zero() + &g, g);
    }

    /// (g1 + g2) - g2 == g1
    #[test]
    fn prop_grouped_sub_inverse(g1 in arb_grouped(), g2 in arb_grouped()) {
        prop_assert_eq!(&(&g1 + &g2) - &g2, g1);
    }

    /// g.map(identity) == g
    #[test]
    fn prop_grouped_map_identity(g in arb_grouped()) {
        prop_assert_eq!(g.map(Clone::clone), g);
    }

    /// The sum of a combination is the combination of the sums
    #[test]
    fn prop_grouped_sum_distributes(g1 in arb_grouped(), g2 in arb_grouped()) {
        prop_assert_eq!((&g1 + &g2).sum(), &g1.sum() + &g2.sum());
    }

    /// Grouping never loses money
    #[test]
    fn prop_group_preserves_total(t in arb_transactions()) {
        let grouped = t.group(|t| t.date.format("%Y-%m").to_string());
        prop_assert_eq!(grouped.sum().sum(), t.sum());
        prop_assert_eq!(grouped.flatten(), t);
    }

    /// Nesting a grouping keeps the totals per key
    #[test]
    fn prop_nested_group_keeps_totals(t in arb_transactions()) {
        let grouped = t.group(|t| t.tags.keys().cloned().collect::<String>());
        let nested = grouped.group(|t| t.date.format("%Y").to_string());
        prop_assert_eq!(nested.sum(), grouped.sum());
    }

    /// Filtering splits a collection in two
    #[test]
    fn prop_filter_partitions(t in arb_transactions()) {
        let food = t.filter(|t| t.has_tag("food"));
        let rest = t.filter(|t| !t.has_tag("food"));
        prop_assert_eq!(&food + &rest, t);
    }
}
