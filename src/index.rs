//! Ancestry index: which rules could a new fact unlock?
//!
//! A predicate's truth only matters to rules whose antecedent contains it,
//! directly or nested under AND/OR/NOT. The index materializes the knowledge
//! base once (nodes plus child-to-parent back-references) so that lookups
//! during a fixpoint pass never touch the backing store, then walks parent
//! edges outward from a predicate's identity expressions.
//!
//! Expressions form a DAG with shared children, so ancestor sets are
//! computed with a worklist and a visited set: every ancestor appears once
//! however many paths lead to it, and a cyclic graph terminates.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use log::debug;

use crate::error::{ExecutionError, PonensError, PonensResult};
use crate::eval::ExpressionGraph;
use crate::expression::{Expression, ExpressionId};
use crate::predicate::{Predicate, PredicateId};
use crate::rule::{Rule, RuleId};
use crate::storage::KnowledgeBase;

/// Materialized knowledge base with ancestor lookups.
#[derive(Debug)]
pub struct AncestryIndex {
    predicates: HashMap<PredicateId, Predicate>,
    expressions: HashMap<ExpressionId, Expression>,
    rules: HashMap<RuleId, Rule>,
    parents: HashMap<ExpressionId, Vec<ExpressionId>>,
    by_antecedent: HashMap<ExpressionId, Vec<RuleId>>,
    by_predicate: HashMap<PredicateId, Vec<ExpressionId>>,
    ancestors: RwLock<HashMap<ExpressionId, Arc<HashSet<ExpressionId>>>>,
}

impl AncestryIndex {
    /// Reads the whole knowledge base through its accessors.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn build(kb: &dyn KnowledgeBase) -> PonensResult<Self> {
        let predicates: HashMap<PredicateId, Predicate> =
            kb.predicates()?.into_iter().map(|p| (p.id, p)).collect();
        let expressions: HashMap<ExpressionId, Expression> =
            kb.expressions()?.into_iter().map(|e| (e.id, e)).collect();
        let rules: HashMap<RuleId, Rule> = kb.rules()?.into_iter().map(|r| (r.id, r)).collect();

        let mut parents = HashMap::new();
        let mut by_antecedent = HashMap::new();
        for id in expressions.keys() {
            let direct = kb.direct_parents(*id)?;
            if !direct.is_empty() {
                parents.insert(*id, direct);
            }
            let rules_here = kb.rules_with_antecedent(*id)?;
            if !rules_here.is_empty() {
                by_antecedent.insert(*id, rules_here);
            }
        }

        let mut by_predicate = HashMap::new();
        for id in predicates.keys() {
            let wrapping = kb.expressions_containing(*id)?;
            if !wrapping.is_empty() {
                by_predicate.insert(*id, wrapping);
            }
        }

        debug!(
            "built ancestry index: {} predicates, {} expressions, {} rules",
            predicates.len(),
            expressions.len(),
            rules.len()
        );

        Ok(Self {
            predicates,
            expressions,
            rules,
            parents,
            by_antecedent,
            by_predicate,
            ancestors: RwLock::new(HashMap::new()),
        })
    }

    /// Looks up a predicate.
    #[must_use]
    pub fn predicate(&self, id: PredicateId) -> Option<&Predicate> {
        self.predicates.get(&id)
    }

    /// Looks up an expression.
    #[must_use]
    pub fn expression(&self, id: ExpressionId) -> Option<&Expression> {
        self.expressions.get(&id)
    }

    /// Looks up a rule.
    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// Number of rules indexed.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Expressions that list `id` as an immediate child.
    #[must_use]
    pub fn direct_parents(&self, id: ExpressionId) -> &[ExpressionId] {
        self.parents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rules whose antecedent is exactly `id`.
    #[must_use]
    pub fn rules_with_antecedent(&self, id: ExpressionId) -> &[RuleId] {
        self.by_antecedent.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Identity expressions wrapping `predicate`.
    #[must_use]
    pub fn expressions_containing(&self, predicate: PredicateId) -> &[ExpressionId] {
        self.by_predicate.get(&predicate).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every expression that transitively contains `id`, deduplicated.
    ///
    /// Results are memoized per expression.
    ///
    /// # Errors
    /// Returns `Internal` if the memo lock is poisoned.
    pub fn ancestors_of(&self, id: ExpressionId) -> PonensResult<Arc<HashSet<ExpressionId>>> {
        {
            let memo = self
                .ancestors
                .read()
                .map_err(|_| PonensError::internal("ancestry memo lock poisoned"))?;
            if let Some(found) = memo.get(&id) {
                return Ok(Arc::clone(found));
            }
        }

        let mut seen: HashSet<ExpressionId> = HashSet::new();
        let mut stack: Vec<ExpressionId> = self.direct_parents(id).to_vec();
        while let Some(next) = stack.pop() {
            if seen.insert(next) {
                stack.extend_from_slice(self.direct_parents(next));
            }
        }
        let computed = Arc::new(seen);

        let mut memo = self
            .ancestors
            .write()
            .map_err(|_| PonensError::internal("ancestry memo lock poisoned"))?;
        // Another thread may have filled it while we walked.
        let entry = memo.entry(id).or_insert(computed);
        Ok(Arc::clone(entry))
    }

    /// Rules whose antecedent is `id` or any ancestor of `id`.
    ///
    /// # Errors
    /// As [`AncestryIndex::ancestors_of`].
    pub fn applicable_rules(&self, id: ExpressionId) -> PonensResult<HashSet<RuleId>> {
        let mut rules: HashSet<RuleId> = self.rules_with_antecedent(id).iter().copied().collect();
        for ancestor in self.ancestors_of(id)?.iter() {
            rules.extend(self.rules_with_antecedent(*ancestor).iter().copied());
        }
        Ok(rules)
    }

    /// Rules whose antecedent mentions `predicate` anywhere.
    ///
    /// # Errors
    /// As [`AncestryIndex::ancestors_of`].
    pub fn rules_for_predicate(&self, predicate: PredicateId) -> PonensResult<HashSet<RuleId>> {
        let mut rules = HashSet::new();
        for expression in self.expressions_containing(predicate) {
            rules.extend(self.applicable_rules(*expression)?);
        }
        Ok(rules)
    }
}

impl ExpressionGraph for AncestryIndex {
    fn node(&self, id: ExpressionId) -> PonensResult<Cow<'_, Expression>> {
        self.expressions
            .get(&id)
            .map(Cow::Borrowed)
            .ok_or(PonensError::Execution(ExecutionError::ExpressionNotFound { id }))
    }
}
