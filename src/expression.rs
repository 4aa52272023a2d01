//! Boolean formula nodes.
//!
//! Expressions reference their children by ID rather than owning them, so a
//! single sub-expression can be shared by any number of parents and rules.
//! The parent/child relation forms a DAG; back-references (child to parent)
//! live in the knowledge base indexes, never in the node itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::predicate::PredicateId;

/// Stable identifier for an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionId(Uuid);

impl ExpressionId {
    /// Creates a new random expression ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an expression ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ExpressionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Single-term expression wrapping one predicate.
    Identity,
    /// Conjunction of one or more children.
    And,
    /// Disjunction of one or more children.
    Or,
    /// Negation of exactly one child.
    Not,
}

impl Operator {
    /// Returns the keyword used when rendering compound expressions.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Identity => "ID",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A boolean formula node.
///
/// Exactly one of `predicate` (for [`Operator::Identity`]) or a non-empty
/// `children` list (for compound operators) is populated. Use the
/// constructors to get this right; [`Expression::validate`] re-checks it for
/// data that arrives from elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    /// Unique identifier.
    pub id: ExpressionId,
    /// Operator applied to the children.
    pub operator: Operator,
    /// Ordered child expressions (empty for identity).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExpressionId>,
    /// Leaf predicate (identity only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<PredicateId>,
}

impl Expression {
    /// Creates an identity expression over `predicate`.
    #[must_use]
    pub fn identity(predicate: PredicateId) -> Self {
        Self {
            id: ExpressionId::new(),
            operator: Operator::Identity,
            children: Vec::new(),
            predicate: Some(predicate),
        }
    }

    /// Creates a conjunction.
    ///
    /// # Errors
    /// Returns `MalformedExpression` if `children` is empty.
    pub fn and(children: Vec<ExpressionId>) -> Result<Self, ValidationError> {
        Self::compound(Operator::And, children)
    }

    /// Creates a disjunction.
    ///
    /// # Errors
    /// Returns `MalformedExpression` if `children` is empty.
    pub fn or(children: Vec<ExpressionId>) -> Result<Self, ValidationError> {
        Self::compound(Operator::Or, children)
    }

    /// Creates a negation.
    #[must_use]
    pub fn not(child: ExpressionId) -> Self {
        Self {
            id: ExpressionId::new(),
            operator: Operator::Not,
            children: vec![child],
            predicate: None,
        }
    }

    fn compound(operator: Operator, children: Vec<ExpressionId>) -> Result<Self, ValidationError> {
        let expr = Self {
            id: ExpressionId::new(),
            operator,
            children,
            predicate: None,
        };
        expr.validate()?;
        Ok(expr)
    }

    /// Checks the shape invariants for this node's operator.
    ///
    /// Does not check that children exist or that the graph is acyclic; that
    /// needs the knowledge base.
    ///
    /// # Errors
    /// Returns `MalformedExpression` describing the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.operator {
            Operator::Identity => {
                if self.predicate.is_none() {
                    return Err(ValidationError::malformed(
                        self.id,
                        "identity expression has no predicate",
                    ));
                }
                if !self.children.is_empty() {
                    return Err(ValidationError::malformed(
                        self.id,
                        "identity expression cannot have children",
                    ));
                }
            }
            Operator::And | Operator::Or | Operator::Not => {
                if self.predicate.is_some() {
                    return Err(ValidationError::malformed(
                        self.id,
                        format!("{} expression cannot wrap a predicate", self.operator),
                    ));
                }
                if self.children.is_empty() {
                    return Err(ValidationError::malformed(
                        self.id,
                        format!("{} expression has no children", self.operator),
                    ));
                }
                if self.operator == Operator::Not && self.children.len() != 1 {
                    return Err(ValidationError::malformed(
                        self.id,
                        format!("NOT requires exactly one child, found {}", self.children.len()),
                    ));
                }
                if self.children.contains(&self.id) {
                    return Err(ValidationError::malformed(self.id, "expression lists itself as a child"));
                }
            }
        }
        Ok(())
    }

    /// Returns true for identity expressions.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.operator == Operator::Identity
    }

    /// Returns the leaf predicate of an identity expression.
    #[must_use]
    pub fn leaf(&self) -> Option<PredicateId> {
        if self.is_identity() {
            self.predicate
        } else {
            None
        }
    }
}
