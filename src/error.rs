//! Error types for ponens.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific failure. Conditions that merely prevent a derivation
//! (unknown antecedent, unsupported consequent shape) are not errors.

use thiserror::Error;

use crate::expression::ExpressionId;
use crate::predicate::PredicateId;
use crate::rule::RuleId;
use crate::storage::StorageError;

/// Validation errors raised when input violates a data-model invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Malformed expression {id}: {reason}")]
    MalformedExpression {
        id: ExpressionId,
        reason: String,
    },

    #[error("Invalid slug '{value}' for field '{field}'")]
    InvalidSlug {
        field: String,
        value: String,
    },

    #[error("Label cannot be empty")]
    EmptyLabel,

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Invalid engine configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

impl ValidationError {
    /// Creates a malformed-expression error.
    #[must_use]
    pub fn malformed(id: ExpressionId, reason: impl Into<String>) -> Self {
        Self::MalformedExpression {
            id,
            reason: reason.into(),
        }
    }
}

/// Execution errors raised while evaluating or entailing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Predicate not found: {id}")]
    PredicateNotFound {
        id: PredicateId,
    },

    #[error("Expression not found: {id}")]
    ExpressionNotFound {
        id: ExpressionId,
    },

    #[error("Rule not found: {id}")]
    RuleNotFound {
        id: RuleId,
    },

    #[error("Inference budget exceeded: no fixpoint after {max_passes} passes")]
    InferenceBudgetExceeded {
        max_passes: usize,
    },

    #[error("Inference deadline exceeded after {elapsed_ms}ms (deadline: {deadline_ms}ms)")]
    DeadlineExceeded {
        elapsed_ms: u64,
        deadline_ms: u64,
    },

    #[error("Expression nesting exceeds {max_depth} levels (cyclic expression graph?)")]
    ExpressionTooDeep {
        max_depth: usize,
    },

    #[error("Contradiction on predicate {predicate}: known {existing}, rule {rule} derives {derived}")]
    Contradiction {
        predicate: PredicateId,
        existing: bool,
        derived: bool,
        rule: RuleId,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
    },
}

/// Top-level error type for ponens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PonensError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl PonensError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if the failure came from a rule set that derives both
    /// values for one predicate.
    #[must_use]
    pub const fn is_contradiction(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Contradiction { .. }))
    }

    /// Returns true if inference was cut off by a pass or time bound.
    #[must_use]
    pub const fn is_budget_exceeded(&self) -> bool {
        matches!(
            self,
            Self::Execution(
                ExecutionError::InferenceBudgetExceeded { .. }
                    | ExecutionError::DeadlineExceeded { .. }
            )
        )
    }
}

impl From<StorageError> for PonensError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Invalid(e) => Self::Validation(e),
            StorageError::PredicateNotFound(id) => ExecutionError::PredicateNotFound { id }.into(),
            StorageError::ExpressionNotFound(id) => ExecutionError::ExpressionNotFound { id }.into(),
            StorageError::RuleNotFound(id) => ExecutionError::RuleNotFound { id }.into(),
            other => ExecutionError::Storage {
                message: other.to_string(),
            }
            .into(),
        }
    }
}

/// Result type alias for ponens operations.
pub type PonensResult<T> = Result<T, PonensError>;
