//! Three-valued truth and partial truth assignments.

use std::collections::hash_map::{self, HashMap};
use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};

use crate::predicate::PredicateId;

/// Kleene three-valued truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    /// Known to hold.
    True,
    /// Known not to hold.
    False,
    /// Not determined by the available facts.
    Unknown,
}

impl TriState {
    /// Returns true only for [`TriState::True`].
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// Returns true only for [`TriState::False`].
    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::False)
    }

    /// Returns true only for [`TriState::Unknown`].
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Converts to `Some(bool)` for known values.
    #[must_use]
    pub const fn known(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unknown => None,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unknown, Self::from)
    }
}

impl Not for TriState {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Partial mapping from predicates to booleans.
///
/// A missing key means *unknown*, never false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TruthAssignment(HashMap<PredicateId, bool>);

impl TruthAssignment {
    /// Creates an empty assignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the truth of `predicate`.
    #[must_use]
    pub fn get(&self, predicate: PredicateId) -> TriState {
        self.0.get(&predicate).copied().into()
    }

    /// Records a known value, returning the previous one if any.
    pub fn insert(&mut self, predicate: PredicateId, value: bool) -> Option<bool> {
        self.0.insert(predicate, value)
    }

    /// Returns true if `predicate` has a known value.
    #[must_use]
    pub fn contains(&self, predicate: PredicateId) -> bool {
        self.0.contains_key(&predicate)
    }

    /// Number of known predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the known predicates.
    pub fn predicates(&self) -> impl Iterator<Item = PredicateId> + '_ {
        self.0.keys().copied()
    }

    /// Iterates over `(predicate, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PredicateId, bool)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Returns true if every fact in `other` is present here with the same
    /// value.
    #[must_use]
    pub fn extends(&self, other: &Self) -> bool {
        other.iter().all(|(p, v)| self.0.get(&p) == Some(&v))
    }
}

impl FromIterator<(PredicateId, bool)> for TruthAssignment {
    fn from_iter<I: IntoIterator<Item = (PredicateId, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TruthAssignment {
    type Item = (PredicateId, bool);
    type IntoIter = hash_map::IntoIter<PredicateId, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_keeps_unknown() {
        assert_eq!(!TriState::True, TriState::False);
        assert_eq!(!TriState::False, TriState::True);
        assert_eq!(!TriState::Unknown, TriState::Unknown);
    }

    #[test]
    fn option_conversion() {
        assert_eq!(TriState::from(None), TriState::Unknown);
        assert_eq!(TriState::from(Some(false)), TriState::False);
        assert_eq!(TriState::True.known(), Some(true));
        assert_eq!(TriState::Unknown.known(), None);
    }

    #[test]
    fn absent_key_is_unknown() {
        let p = PredicateId::new();
        let q = PredicateId::new();
        let mut a = TruthAssignment::new();
        a.insert(p, false);
        assert_eq!(a.get(p), TriState::False);
        assert_eq!(a.get(q), TriState::Unknown);
        assert!(a.contains(p));
        assert!(!a.contains(q));
    }

    #[test]
    fn extends_requires_equal_values() {
        let p = PredicateId::new();
        let q = PredicateId::new();
        let small: TruthAssignment = [(p, true)].into_iter().collect();
        let big: TruthAssignment = [(p, true), (q, false)].into_iter().collect();
        let flipped: TruthAssignment = [(p, false), (q, false)].into_iter().collect();
        assert!(big.extends(&small));
        assert!(!small.extends(&big));
        assert!(!flipped.extends(&small));
    }
}
