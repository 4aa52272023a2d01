//! Rules: implications between two expressions.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::expression::ExpressionId;
use crate::predicate::validate_node;

/// Stable identifier for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(Uuid);

impl RuleId {
    /// Creates a new random rule ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a rule ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An implication `antecedent => consequent`.
///
/// Any expression shape is legal on either side. The engine only derives
/// facts from literal consequents; see [`crate::engine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier.
    pub id: RuleId,
    /// Machine name (slug).
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// Condition that must hold for the rule to fire.
    pub antecedent: ExpressionId,
    /// What the rule concludes.
    pub consequent: ExpressionId,
}

impl Rule {
    /// Creates a validated rule with a fresh ID.
    ///
    /// # Errors
    /// Returns a `ValidationError` if `name` is not a slug or `label` is blank.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        antecedent: ExpressionId,
        consequent: ExpressionId,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let label = label.into();
        validate_node(&name, &label)?;
        Ok(Self {
            id: RuleId::new(),
            name,
            label,
            comment: String::new(),
            antecedent,
            consequent,
        })
    }

    /// Attaches a comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Re-checks the name/label invariants.
    ///
    /// # Errors
    /// Same conditions as [`Rule::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_node(&self.name, &self.label)
    }
}
