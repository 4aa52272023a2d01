//! Read interface between the inference core and the knowledge base.
//!
//! The engine never writes through this trait. Any backend (the in-memory
//! store in this crate, a database adapter, a frozen snapshot) only has to
//! answer these lookups quickly and keep its answers stable for the
//! duration of one inference call.

use thiserror::Error;

use crate::error::ValidationError;
use crate::expression::{Expression, ExpressionId};
use crate::predicate::{Predicate, PredicateId};
use crate::rule::{Rule, RuleId};

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Predicate not found.
    #[error("Predicate not found: {0}")]
    PredicateNotFound(PredicateId),

    /// Expression not found.
    #[error("Expression not found: {0}")]
    ExpressionNotFound(ExpressionId),

    /// Rule not found.
    #[error("Rule not found: {0}")]
    RuleNotFound(RuleId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Record violates a data-model invariant.
    #[error("Invalid record: {0}")]
    Invalid(#[from] ValidationError),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Read accessors the inference core consumes.
///
/// # Consistency
/// Implementations must present a stable view for the lifetime of an
/// [`EntailmentEngine`](crate::EntailmentEngine) built over them; rebuild the
/// engine after mutating the knowledge base.
pub trait KnowledgeBase: Send + Sync {
    /// Get a predicate by ID.
    fn predicate(&self, id: PredicateId) -> Result<Option<Predicate>, StorageError>;

    /// Find a predicate by its slug name.
    fn predicate_by_name(&self, name: &str) -> Result<Option<Predicate>, StorageError>;

    /// Get an expression by ID.
    fn expression(&self, id: ExpressionId) -> Result<Option<Expression>, StorageError>;

    /// Get a rule by ID.
    fn rule(&self, id: RuleId) -> Result<Option<Rule>, StorageError>;

    /// All predicates.
    fn predicates(&self) -> Result<Vec<Predicate>, StorageError>;

    /// All expressions.
    fn expressions(&self) -> Result<Vec<Expression>, StorageError>;

    /// All rules.
    fn rules(&self) -> Result<Vec<Rule>, StorageError>;

    /// Expressions that list `id` as an immediate child.
    fn direct_parents(&self, id: ExpressionId) -> Result<Vec<ExpressionId>, StorageError>;

    /// Rules whose antecedent is exactly `id`.
    fn rules_with_antecedent(&self, id: ExpressionId) -> Result<Vec<RuleId>, StorageError>;

    /// Identity expressions wrapping `predicate`.
    fn expressions_containing(&self, predicate: PredicateId) -> Result<Vec<ExpressionId>, StorageError>;
}
