//! Engine configuration (resource bounds and policies).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// What to do when a rule derives the opposite of an already-known value.
///
/// Two rules deriving opposite values within the same pass are always a
/// contradiction; there is no order to prefer one over the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionPolicy {
    /// Fail the inference call.
    #[default]
    Reject,
    /// Keep the known value and count the rejected derivation.
    PreferKnown,
}

/// Which predicates each fixpoint pass re-derives from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainingStrategy {
    /// Only predicates added by the previous pass (semi-naive).
    #[default]
    Frontier,
    /// Every known predicate, every pass (naive).
    FullRescan,
}

/// Bounds and policies for one [`EntailmentEngine`](crate::EntailmentEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum fixpoint passes before `InferenceBudgetExceeded`.
    pub max_passes: usize,
    /// Maximum expression nesting depth before `ExpressionTooDeep`.
    pub max_expression_depth: usize,
    /// Optional wall-clock bound per `entail` call, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
    /// Handling of derivations that oppose known values.
    pub contradiction_policy: ContradictionPolicy,
    /// Pass strategy.
    pub strategy: ChainingStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: 1024,
            max_expression_depth: 256,
            deadline_ms: None,
            contradiction_policy: ContradictionPolicy::Reject,
            strategy: ChainingStrategy::Frontier,
        }
    }
}

impl EngineConfig {
    /// Validate bounds.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for zero bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_passes == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "max_passes must be > 0".to_string(),
            });
        }
        if self.max_expression_depth == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "max_expression_depth must be > 0".to_string(),
            });
        }
        if self.deadline_ms == Some(0) {
            return Err(ValidationError::InvalidConfig {
                reason: "deadline_ms must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Parses a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for malformed JSON or invalid bounds.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the deadline as a `Duration`.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Sets `max_passes`.
    #[must_use]
    pub const fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Sets `max_expression_depth`.
    #[must_use]
    pub const fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }

    /// Sets the per-call deadline.
    #[must_use]
    pub const fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    /// Sets the contradiction policy.
    #[must_use]
    pub const fn with_contradiction_policy(mut self, policy: ContradictionPolicy) -> Self {
        self.contradiction_policy = policy;
        self
    }

    /// Sets the pass strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: ChainingStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
