//! Three-valued expression evaluation.
//!
//! Evaluation is a pure function of `(expression, assignment)`. The
//! [`Evaluator`] caches results for shared sub-expressions while the
//! assignment it borrows is frozen, and bounds recursion depth so a cyclic
//! expression graph fails instead of overflowing the stack.

use std::borrow::Cow;
use std::collections::HashMap;

use log::trace;

use crate::config::EngineConfig;
use crate::error::{ExecutionError, PonensError, PonensResult};
use crate::expression::{Expression, ExpressionId, Operator};
use crate::storage::KnowledgeBase;
use crate::truth::{TriState, TruthAssignment};

/// Resolves expression IDs to nodes.
///
/// Implemented for any [`KnowledgeBase`] trait object (one lookup per node)
/// and for the materialized [`AncestryIndex`](crate::AncestryIndex).
pub trait ExpressionGraph {
    /// Returns the node for `id`.
    ///
    /// # Errors
    /// `ExpressionNotFound` for dangling IDs, `Storage` for backend failures.
    fn node(&self, id: ExpressionId) -> PonensResult<Cow<'_, Expression>>;
}

impl ExpressionGraph for dyn KnowledgeBase + '_ {
    fn node(&self, id: ExpressionId) -> PonensResult<Cow<'_, Expression>> {
        self.expression(id)?
            .map(Cow::Owned)
            .ok_or(PonensError::Execution(ExecutionError::ExpressionNotFound { id }))
    }
}

/// Memoizing evaluator over one frozen assignment.
pub struct Evaluator<'a, G: ExpressionGraph + ?Sized> {
    graph: &'a G,
    assignment: &'a TruthAssignment,
    max_depth: usize,
    memo: HashMap<ExpressionId, TriState>,
}

impl<'a, G: ExpressionGraph + ?Sized> Evaluator<'a, G> {
    /// Creates an evaluator. `max_depth` bounds expression nesting.
    #[must_use]
    pub fn new(graph: &'a G, assignment: &'a TruthAssignment, max_depth: usize) -> Self {
        Self {
            graph,
            assignment,
            max_depth,
            memo: HashMap::new(),
        }
    }

    /// Evaluates `id` against the borrowed assignment.
    ///
    /// # Errors
    /// `MalformedExpression` for nodes that break their operator's shape,
    /// `ExpressionTooDeep` past the depth bound, lookup errors from the graph.
    pub fn evaluate(&mut self, id: ExpressionId) -> PonensResult<TriState> {
        self.eval_at(id, 0)
    }

    /// Number of distinct expressions evaluated so far.
    #[must_use]
    pub fn evaluated(&self) -> usize {
        self.memo.len()
    }

    fn eval_at(&mut self, id: ExpressionId, depth: usize) -> PonensResult<TriState> {
        if let Some(value) = self.memo.get(&id) {
            return Ok(*value);
        }
        if depth > self.max_depth {
            return Err(ExecutionError::ExpressionTooDeep {
                max_depth: self.max_depth,
            }
            .into());
        }

        let graph = self.graph;
        let node = graph.node(id)?;
        node.validate()?;

        let value = match node.operator {
            Operator::Identity => match node.predicate {
                Some(pid) => self.assignment.get(pid),
                None => TriState::Unknown,
            },
            Operator::And => {
                let values = self.eval_children(&node.children, depth)?;
                conjunction(&values)
            }
            Operator::Or => {
                let values = self.eval_children(&node.children, depth)?;
                disjunction(&values)
            }
            Operator::Not => match node.children.first() {
                Some(child) => !self.eval_at(*child, depth + 1)?,
                None => TriState::Unknown,
            },
        };

        trace!("evaluated expression {id} ({}) = {value}", node.operator);
        self.memo.insert(id, value);
        Ok(value)
    }

    // All children are evaluated (no early exit) so malformed nodes anywhere
    // under the expression are reported.
    fn eval_children(&mut self, children: &[ExpressionId], depth: usize) -> PonensResult<Vec<TriState>> {
        children
            .iter()
            .map(|child| self.eval_at(*child, depth + 1))
            .collect()
    }
}

/// False dominates, then unknown.
fn conjunction(values: &[TriState]) -> TriState {
    if values.contains(&TriState::False) {
        TriState::False
    } else if values.contains(&TriState::Unknown) {
        TriState::Unknown
    } else {
        TriState::True
    }
}

/// True dominates, then unknown.
fn disjunction(values: &[TriState]) -> TriState {
    if values.contains(&TriState::True) {
        TriState::True
    } else if values.contains(&TriState::Unknown) {
        TriState::Unknown
    } else {
        TriState::False
    }
}

/// Evaluates `expression` against `assignment`, reading nodes from `kb`.
///
/// # Errors
/// See [`Evaluator::evaluate`].
pub fn evaluate(
    kb: &dyn KnowledgeBase,
    expression: ExpressionId,
    assignment: &TruthAssignment,
) -> PonensResult<TriState> {
    let max_depth = EngineConfig::default().max_expression_depth;
    Evaluator::new(kb, assignment, max_depth).evaluate(expression)
}
