//! Serializable knowledge-base contents.

use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::predicate::Predicate;
use crate::rule::Rule;

/// A materialized knowledge base: every predicate, expression and rule.
///
/// This is the exchange form between an external data store and
/// [`InMemoryKnowledgeBase`](crate::InMemoryKnowledgeBase). Back-reference
/// indexes are rebuilt on load, so they are not part of the format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    /// All predicates.
    #[serde(default)]
    pub predicates: Vec<Predicate>,
    /// All expressions, in any order.
    #[serde(default)]
    pub expressions: Vec<Expression>,
    /// All rules.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl KnowledgeSnapshot {
    /// Returns true if the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty() && self.expressions.is_empty() && self.rules.is_empty()
    }
}
