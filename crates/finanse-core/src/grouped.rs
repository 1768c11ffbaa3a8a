//! Ordered groups of values with algebraic composition.
//!
//! [`Grouped`] maps sorted keys to values. Value types opt into combination
//! through [`Monoid`] (zero and `+`) and [`CommutativeMonoid`] (`-`); the
//! container inherits whatever its values support:
//!
//! - `map` is always available,
//! - `+` and `sum` need `V: Monoid`,
//! - `-` needs `V: CommutativeMonoid`.
//!
//! A key that is missing from a group behaves like a key holding zero, both
//! for combination and for equality.
//!
//! # Example
//!
//! ```
//! use finanse_core::{GroupedMoney, Money};
//!
//! let jan: GroupedMoney = [("food".to_string(), Money::from_minor(1000, "zł"))].into_iter().collect();
//! let feb: GroupedMoney = [("rent".to_string(), Money::from_minor(5000, "zł"))].into_iter().collect();
//!
//! let both = &jan + &feb;
//! assert_eq!(both.groups().count(), 2);
//! assert_eq!(&both - &feb, jan);
//! ```

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::money::{Money, MoneyParseError};

/// A value with an identity element and an associative combination.
pub trait Monoid {
    /// The identity element: `zero().combine(v) == v`.
    fn zero() -> Self;

    /// Combine two values.
    #[must_use]
    fn combine(&self, other: &Self) -> Self;
}

/// A monoid whose combination can be undone.
pub trait CommutativeMonoid: Monoid {
    /// `self` with `other` taken away: `a.combine(b).difference(b) == a`.
    #[must_use]
    fn difference(&self, other: &Self) -> Self;
}

impl Monoid for Money {
    fn zero() -> Self {
        Self::new()
    }

    fn combine(&self, other: &Self) -> Self {
        self + other
    }
}

impl CommutativeMonoid for Money {
    fn difference(&self, other: &Self) -> Self {
        self - other
    }
}

/// Values grouped under sorted keys.
#[derive(Debug, Clone)]
pub struct Grouped<K, V> {
    groups: BTreeMap<K, V>,
}

/// Money grouped by a string key.
pub type GroupedMoney = Grouped<String, Money>;

impl<K: Ord, V> Grouped<K, V> {
    /// Create a group from a map.
    pub const fn new(groups: BTreeMap<K, V>) -> Self {
        Self { groups }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Keys in sorted order.
    pub fn groups(&self) -> impl Iterator<Item = &K> {
        self.groups.keys()
    }

    /// Values in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.groups.values()
    }

    /// `(key, value)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.groups.iter()
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.groups.get(key)
    }

    /// The value stored under `key`, or `default`.
    pub fn get_or(&self, key: &K, default: V) -> V
    where
        V: Clone,
    {
        self.groups.get(key).cloned().unwrap_or(default)
    }

    /// Apply `f` to every value, keeping the keys.
    pub fn map<W>(&self, mut f: impl FnMut(&V) -> W) -> Grouped<K, W>
    where
        K: Clone,
    {
        Grouped {
            groups: self.groups.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
        }
    }

    /// Unwrap into the underlying map.
    pub fn into_inner(self) -> BTreeMap<K, V> {
        self.groups
    }
}

impl<K: Ord + Clone, V: Monoid> Grouped<K, V> {
    /// The value stored under `key`, or zero.
    pub fn value(&self, key: &K) -> V
    where
        V: Clone,
    {
        self.groups.get(key).cloned().unwrap_or_else(V::zero)
    }

    /// Combine every value, starting from zero.
    pub fn sum(&self) -> V {
        self.groups
            .values()
            .fold(V::zero(), |acc, value| acc.combine(value))
    }

    fn pointwise(&self, other: &Self, f: impl Fn(&V, &V) -> V) -> Self {
        let zero = V::zero();
        let mut groups = BTreeMap::new();
        for key in self.groups.keys().chain(other.groups.keys()) {
            if groups.contains_key(key) {
                continue;
            }
            let left = self.groups.get(key).unwrap_or(&zero);
            let right = other.groups.get(key).unwrap_or(&zero);
            groups.insert(key.clone(), f(left, right));
        }
        Self { groups }
    }
}

impl<K: Ord + Clone, V: Monoid> Monoid for Grouped<K, V> {
    fn zero() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    fn combine(&self, other: &Self) -> Self {
        self.pointwise(other, V::combine)
    }
}

impl<K: Ord + Clone, V: CommutativeMonoid> CommutativeMonoid for Grouped<K, V> {
    fn difference(&self, other: &Self) -> Self {
        self.pointwise(other, V::difference)
    }
}

impl<K: Ord + Clone, V: Monoid> Add for &Grouped<K, V> {
    type Output = Grouped<K, V>;

    fn add(self, other: &Grouped<K, V>) -> Grouped<K, V> {
        self.combine(other)
    }
}

impl<K: Ord + Clone, V: Monoid> Add for Grouped<K, V> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.combine(&other)
    }
}

impl<K: Ord + Clone, V: CommutativeMonoid> Sub for &Grouped<K, V> {
    type Output = Grouped<K, V>;

    fn sub(self, other: &Grouped<K, V>) -> Grouped<K, V> {
        self.difference(other)
    }
}

impl<K: Ord + Clone, V: CommutativeMonoid> Sub for Grouped<K, V> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.difference(&other)
    }
}

/// Two groups are equal when every key maps to equal values, a missing key
/// counting as zero.
impl<K: Ord, V: Monoid + PartialEq> PartialEq for Grouped<K, V> {
    fn eq(&self, other: &Self) -> bool {
        let zero = V::zero();
        let covers = |a: &Self, b: &Self| {
            a.groups
                .iter()
                .all(|(k, v)| b.groups.get(k).unwrap_or(&zero) == v)
        };
        covers(self, other) && covers(other, self)
    }
}

impl<K: Ord, V: Monoid + Eq> Eq for Grouped<K, V> {}

impl<K: Ord, V> Default for Grouped<K, V> {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Grouped<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().collect(),
        }
    }
}

impl<K: Ord, V> From<BTreeMap<K, V>> for Grouped<K, V> {
    fn from(groups: BTreeMap<K, V>) -> Self {
        Self { groups }
    }
}

impl<'a, K, V> IntoIterator for &'a Grouped<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = btree_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Grouped<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.groups.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

/// Parses one `- <title> = <money>` entry per line; blank lines are skipped.
impl FromStr for GroupedMoney {
    type Err = MoneyParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut groups = BTreeMap::new();
        for line in text.lines().map(|l| l.trim_matches([' ', '-', '\t'])) {
            if line.is_empty() {
                continue;
            }
            let (title, money) = line.split_once('=').ok_or_else(|| MoneyParseError {
                text: line.to_string(),
            })?;
            groups.insert(title.trim().to_string(), money.parse()?);
        }
        Ok(Self { groups })
    }
}
