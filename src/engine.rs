//! Forward-chaining entailment.
//!
//! [`EntailmentEngine::entail`] takes a seed assignment and returns its
//! closure under every rule in the knowledge base. Each pass looks only at
//! rules whose antecedent mentions a predicate learned in the previous pass
//! (see [`ChainingStrategy`]), evaluates those antecedents against the
//! assignment as it stood when the pass began, and merges the derived facts
//! at the end of the pass. The assignment only ever grows, so the loop stops
//! once a pass adds nothing.
//!
//! Only *literal* consequents produce facts: `(p)` derives `p = true` and
//! `(NOT (p))` derives `p = false`. Any other consequent shape is skipped and
//! counted in [`EntailStats::unsupported_consequents`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace};

use crate::config::{ChainingStrategy, ContradictionPolicy, EngineConfig};
use crate::error::{ExecutionError, PonensError, PonensResult};
use crate::eval::{Evaluator, ExpressionGraph};
use crate::expression::{ExpressionId, Operator};
use crate::index::AncestryIndex;
use crate::predicate::PredicateId;
use crate::rule::RuleId;
use crate::storage::KnowledgeBase;
use crate::truth::{TriState, TruthAssignment};

/// Counters collected during one `entail` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntailStats {
    /// Fixpoint passes run, including the final pass that added nothing.
    pub passes: usize,
    /// Rule antecedents evaluated.
    pub rules_evaluated: usize,
    /// Facts added on top of the seed.
    pub derived: usize,
    /// Rules that fired but whose consequent is not a literal.
    pub unsupported_consequents: usize,
    /// Derivations dropped because they opposed a known value
    /// (`ContradictionPolicy::PreferKnown` only).
    pub overridden: usize,
}

/// Result of an `entail` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entailment {
    /// The seed plus everything derived from it.
    pub assignment: TruthAssignment,
    /// Work counters.
    pub stats: EntailStats,
}

impl Entailment {
    /// Consumes the result, keeping only the assignment.
    #[must_use]
    pub fn into_assignment(self) -> TruthAssignment {
        self.assignment
    }
}

/// Forward-chaining engine over one knowledge-base snapshot.
///
/// The engine is immutable once built and can be shared across threads;
/// each `entail` call keeps its own working assignment. Call
/// [`EntailmentEngine::refresh`] after the knowledge base changes.
#[derive(Clone)]
pub struct EntailmentEngine {
    kb: Arc<dyn KnowledgeBase>,
    index: Arc<AncestryIndex>,
    config: EngineConfig,
}

impl EntailmentEngine {
    /// Validates `config` and indexes the knowledge base.
    ///
    /// # Errors
    /// `InvalidConfig` for bad bounds, storage errors while indexing.
    pub fn new(kb: Arc<dyn KnowledgeBase>, config: EngineConfig) -> PonensResult<Self> {
        config.validate()?;
        let index = Arc::new(AncestryIndex::build(kb.as_ref())?);
        Ok(Self { kb, index, config })
    }

    /// Builds an engine with [`EngineConfig::default`].
    ///
    /// # Errors
    /// Storage errors while indexing.
    pub fn with_defaults(kb: Arc<dyn KnowledgeBase>) -> PonensResult<Self> {
        Self::new(kb, EngineConfig::default())
    }

    /// Re-reads the knowledge base into a fresh index.
    ///
    /// # Errors
    /// Storage errors while indexing.
    pub fn refresh(&mut self) -> PonensResult<()> {
        self.index = Arc::new(AncestryIndex::build(self.kb.as_ref())?);
        Ok(())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The index the engine reads from.
    #[must_use]
    pub fn index(&self) -> &AncestryIndex {
        &self.index
    }

    /// Evaluates an expression against the indexed snapshot.
    ///
    /// # Errors
    /// See [`Evaluator::evaluate`].
    pub fn evaluate(&self, expression: ExpressionId, assignment: &TruthAssignment) -> PonensResult<TriState> {
        Evaluator::new(self.index.as_ref(), assignment, self.config.max_expression_depth)
            .evaluate(expression)
    }

    /// Applies a single rule to `assignment` without chaining.
    ///
    /// Returns the fact the rule derives, or an empty assignment when its
    /// antecedent is not true or its consequent is not a literal.
    ///
    /// # Errors
    /// `RuleNotFound`, or evaluation errors.
    pub fn fire(&self, rule: RuleId, assignment: &TruthAssignment) -> PonensResult<TruthAssignment> {
        let found = self
            .index
            .rule(rule)
            .ok_or(PonensError::Execution(ExecutionError::RuleNotFound { id: rule }))?;
        let mut out = TruthAssignment::new();
        if self.evaluate(found.antecedent, assignment)?.is_true() {
            if let Some((predicate, value)) = self.literal(found.consequent)? {
                out.insert(predicate, value);
            }
        }
        Ok(out)
    }

    /// Computes the closure of `seed` under all rules.
    ///
    /// # Errors
    /// - `Contradiction` when rules derive opposite values for one predicate
    ///   in a pass, or (under `ContradictionPolicy::Reject`) oppose a known value
    /// - `InferenceBudgetExceeded` / `DeadlineExceeded` past the configured bounds
    /// - `MalformedExpression`, `ExpressionTooDeep` from evaluation
    pub fn entail(&self, seed: &TruthAssignment) -> PonensResult<Entailment> {
        let started = Instant::now();
        let mut combined = seed.clone();
        let mut stats = EntailStats::default();
        let mut frontier: Vec<PredicateId> = seed.predicates().collect();

        while !frontier.is_empty() {
            if stats.passes >= self.config.max_passes {
                return Err(ExecutionError::InferenceBudgetExceeded {
                    max_passes: self.config.max_passes,
                }
                .into());
            }
            self.check_deadline(started)?;
            stats.passes += 1;

            let candidates = self.candidate_rules(&frontier)?;
            debug!(
                "entail pass {}: {} frontier predicates, {} candidate rules",
                stats.passes,
                frontier.len(),
                candidates.len()
            );

            let pending = self.run_pass(&combined, &candidates, &mut stats)?;

            let mut added = Vec::with_capacity(pending.len());
            for (predicate, (value, rule)) in pending {
                debug!("rule {rule} derived {predicate} = {value}");
                combined.insert(predicate, value);
                added.push(predicate);
            }
            stats.derived += added.len();

            frontier = if added.is_empty() {
                Vec::new()
            } else {
                match self.config.strategy {
                    ChainingStrategy::Frontier => added,
                    ChainingStrategy::FullRescan => combined.predicates().collect(),
                }
            };
        }

        debug!(
            "entail reached fixpoint after {} passes: {} derived, {} unsupported consequents",
            stats.passes, stats.derived, stats.unsupported_consequents
        );
        Ok(Entailment {
            assignment: combined,
            stats,
        })
    }

    /// Shorthand for `entail(seed)` keeping only the assignment.
    ///
    /// # Errors
    /// As [`EntailmentEngine::entail`].
    pub fn closure(&self, seed: &TruthAssignment) -> PonensResult<TruthAssignment> {
        self.entail(seed).map(Entailment::into_assignment)
    }

    /// Rules reachable from any frontier predicate, in ID order so passes
    /// are reproducible.
    fn candidate_rules(&self, frontier: &[PredicateId]) -> PonensResult<Vec<RuleId>> {
        let mut rules: HashSet<RuleId> = HashSet::new();
        for predicate in frontier {
            rules.extend(self.index.rules_for_predicate(*predicate)?);
        }
        let mut ordered: Vec<RuleId> = rules.into_iter().collect();
        ordered.sort_unstable();
        Ok(ordered)
    }

    /// Evaluates `candidates` against a frozen `combined` and returns the new
    /// facts, keyed by predicate, with the rule that produced each.
    fn run_pass(
        &self,
        combined: &TruthAssignment,
        candidates: &[RuleId],
        stats: &mut EntailStats,
    ) -> PonensResult<HashMap<PredicateId, (bool, RuleId)>> {
        let mut evaluator = Evaluator::new(self.index.as_ref(), combined, self.config.max_expression_depth);
        let mut pending: HashMap<PredicateId, (bool, RuleId)> = HashMap::new();

        for rule_id in candidates {
            let rule = self
                .index
                .rule(*rule_id)
                .ok_or(PonensError::Execution(ExecutionError::RuleNotFound { id: *rule_id }))?;
            stats.rules_evaluated += 1;

            let antecedent = evaluator.evaluate(rule.antecedent)?;
            trace!("rule {} antecedent = {antecedent}", rule.name);
            if !antecedent.is_true() {
                continue;
            }

            let Some((predicate, derived)) = self.literal(rule.consequent)? else {
                debug!("rule {} fired but its consequent is not a literal; skipped", rule.name);
                stats.unsupported_consequents += 1;
                continue;
            };

            if let Some(existing) = combined.get(predicate).known() {
                if existing != derived {
                    match self.config.contradiction_policy {
                        ContradictionPolicy::Reject => {
                            return Err(ExecutionError::Contradiction {
                                predicate,
                                existing,
                                derived,
                                rule: *rule_id,
                            }
                            .into());
                        }
                        ContradictionPolicy::PreferKnown => {
                            debug!("rule {} opposes known {predicate} = {existing}; kept known value", rule.name);
                            stats.overridden += 1;
                        }
                    }
                }
                continue;
            }

            match pending.get(&predicate) {
                Some((other, _)) if *other != derived => {
                    return Err(ExecutionError::Contradiction {
                        predicate,
                        existing: *other,
                        derived,
                        rule: *rule_id,
                    }
                    .into());
                }
                Some(_) => {}
                None => {
                    pending.insert(predicate, (derived, *rule_id));
                }
            }
        }

        Ok(pending)
    }

    /// `(p)` yields `(p, true)`, `(NOT (p))` yields `(p, false)`, anything
    /// else yields `None`.
    fn literal(&self, consequent: ExpressionId) -> PonensResult<Option<(PredicateId, bool)>> {
        let node = self.index.node(consequent)?;
        node.validate()?;
        match node.operator {
            Operator::Identity => Ok(node.leaf().map(|p| (p, true))),
            Operator::Not => {
                let Some(child) = node.children.first() else {
                    return Ok(None);
                };
                let inner = self.index.node(*child)?;
                inner.validate()?;
                Ok(inner.leaf().map(|p| (p, false)))
            }
            Operator::And | Operator::Or => Ok(None),
        }
    }

    fn check_deadline(&self, started: Instant) -> PonensResult<()> {
        let Some(deadline) = self.config.deadline() else {
            return Ok(());
        };
        let elapsed = started.elapsed();
        if elapsed > deadline {
            return Err(ExecutionError::DeadlineExceeded {
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                deadline_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            }
            .into());
        }
        Ok(())
    }
}
