//! Predicates: the atomic named propositions rules talk about.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Stable identifier for a predicate.
///
/// # Examples
///
/// ```
/// use ponens::PredicateId;
///
/// let id = PredicateId::new();
/// assert!(!id.is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredicateId(Uuid);

impl PredicateId {
    /// Creates a new random predicate ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a predicate ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns true if this is a nil (all zeros) UUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for PredicateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PredicateId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

static SLUG: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// Returns true if `value` is a non-empty slug of ASCII letters, digits,
/// hyphens and underscores.
#[must_use]
pub fn is_slug(value: &str) -> bool {
    match SLUG.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$")) {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

/// Validates the name/label pair shared by predicates and rules.
pub(crate) fn validate_node(name: &str, label: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::MissingField {
            field: "name".to_string(),
        });
    }
    if !is_slug(name) {
        return Err(ValidationError::InvalidSlug {
            field: "name".to_string(),
            value: name.to_string(),
        });
    }
    if label.trim().is_empty() {
        return Err(ValidationError::EmptyLabel);
    }
    Ok(())
}

/// An atomic named proposition.
///
/// Predicates carry no truth value themselves; truth lives in a
/// [`TruthAssignment`](crate::TruthAssignment) built per inference request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Unique identifier.
    pub id: PredicateId,
    /// Machine name (slug).
    pub name: String,
    /// Human-readable label, used when rendering expressions.
    pub label: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl Predicate {
    /// Creates a validated predicate with a fresh ID and no comment.
    ///
    /// # Errors
    /// Returns a `ValidationError` if `name` is not a slug or `label` is blank.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let label = label.into();
        validate_node(&name, &label)?;
        Ok(Self {
            id: PredicateId::new(),
            name,
            label,
            comment: String::new(),
        })
    }

    /// Attaches a comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Re-checks the invariants of a predicate built by hand or deserialized.
    ///
    /// # Errors
    /// Same conditions as [`Predicate::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_node(&self.name, &self.label)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_displays_label() {
        let human = Predicate::new("human", "is Human").unwrap();
        assert_eq!(human.to_string(), "is Human");
        assert_eq!(human.name, "human");
        assert!(human.comment.is_empty());
    }

    #[test]
    fn predicate_rejects_bad_names() {
        assert!(matches!(
            Predicate::new("", "x"),
            Err(ValidationError::MissingField { .. })
        ));
        assert!(matches!(
            Predicate::new("is human", "x"),
            Err(ValidationError::InvalidSlug { .. })
        ));
        assert!(matches!(
            Predicate::new("human", "   "),
            Err(ValidationError::EmptyLabel)
        ));
    }

    #[test]
    fn slug_accepts_hyphen_and_underscore() {
        assert!(is_slug("is-a_god2"));
        assert!(!is_slug("dot.name"));
        assert!(!is_slug(""));
    }

    #[test]
    fn predicate_serde_skips_empty_comment() {
        let p = Predicate::new("mortal", "is Mortal").unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("comment").is_none());

        let back: Predicate = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
