//! In-memory knowledge-base backend.
//!
//! Thread-safe (one `RwLock` over the whole knowledge base) and intended for
//! embedded usage, tests, and as a reference implementation of
//! [`KnowledgeBase`]. Records are validated on insert and the back-reference
//! indexes (child to parents, predicate to identity expressions, antecedent
//! to rules) are maintained alongside the primary maps.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::expression::{Expression, ExpressionId};
use crate::predicate::{Predicate, PredicateId};
use crate::rule::{Rule, RuleId};
use crate::storage::snapshot::KnowledgeSnapshot;
use crate::storage::traits::{KnowledgeBase, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

fn sorted<T: Ord + Copy>(set: Option<&HashSet<T>>) -> Vec<T> {
    let mut out: Vec<T> = set.map(|s| s.iter().copied().collect()).unwrap_or_default();
    out.sort_unstable();
    out
}

#[derive(Debug, Default)]
struct KnowledgeState {
    predicates: HashMap<PredicateId, Predicate>,
    predicate_names: HashMap<String, PredicateId>,
    expressions: HashMap<ExpressionId, Expression>,
    parents: HashMap<ExpressionId, HashSet<ExpressionId>>,
    by_predicate: HashMap<PredicateId, HashSet<ExpressionId>>,
    rules: HashMap<RuleId, Rule>,
    by_antecedent: HashMap<ExpressionId, HashSet<RuleId>>,
}

impl KnowledgeState {
    fn add_predicate(&mut self, predicate: Predicate) -> Result<(), StorageError> {
        predicate.validate()?;
        if self.predicates.contains_key(&predicate.id) {
            return Err(StorageError::DuplicateKey(predicate.id.to_string()));
        }
        if self.predicate_names.contains_key(&predicate.name) {
            return Err(StorageError::DuplicateKey(predicate.name.clone()));
        }
        self.predicate_names.insert(predicate.name.clone(), predicate.id);
        self.predicates.insert(predicate.id, predicate);
        Ok(())
    }

    /// Checks that every reference of `expression` resolves, using `known`
    /// for expressions not yet inserted (bulk loads).
    fn check_references(
        &self,
        expression: &Expression,
        known: &HashSet<ExpressionId>,
    ) -> Result<(), StorageError> {
        if let Some(pid) = expression.predicate {
            if !self.predicates.contains_key(&pid) {
                return Err(StorageError::PredicateNotFound(pid));
            }
        }
        for child in &expression.children {
            if !self.expressions.contains_key(child) && !known.contains(child) {
                return Err(StorageError::ExpressionNotFound(*child));
            }
        }
        Ok(())
    }

    fn add_expression(&mut self, expression: Expression) -> Result<(), StorageError> {
        expression.validate()?;
        if self.expressions.contains_key(&expression.id) {
            return Err(StorageError::DuplicateKey(expression.id.to_string()));
        }

        for child in &expression.children {
            self.parents.entry(*child).or_default().insert(expression.id);
        }
        if let Some(pid) = expression.leaf() {
            self.by_predicate.entry(pid).or_default().insert(expression.id);
        }
        self.expressions.insert(expression.id, expression);
        Ok(())
    }

    fn add_rule(&mut self, rule: Rule) -> Result<(), StorageError> {
        rule.validate()?;
        if self.rules.contains_key(&rule.id) {
            return Err(StorageError::DuplicateKey(rule.id.to_string()));
        }
        for side in [rule.antecedent, rule.consequent] {
            if !self.expressions.contains_key(&side) {
                return Err(StorageError::ExpressionNotFound(side));
            }
        }
        self.by_antecedent.entry(rule.antecedent).or_default().insert(rule.id);
        self.rules.insert(rule.id, rule);
        Ok(())
    }
}

/// In-memory knowledge base.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeBase {
    state: RwLock<KnowledgeState>,
}

impl InMemoryKnowledgeBase {
    /// Creates an empty knowledge base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a knowledge base from a snapshot.
    ///
    /// Expressions may appear in any order within the snapshot; child
    /// references only have to resolve somewhere in it. Cycles are not
    /// rejected here; the engine bounds its traversal instead.
    ///
    /// # Errors
    /// Returns `Invalid` for records that break an invariant, `*NotFound` for
    /// dangling references and `DuplicateKey` for repeated IDs or names.
    pub fn from_snapshot(snapshot: KnowledgeSnapshot) -> Result<Self, StorageError> {
        let mut state = KnowledgeState::default();
        for predicate in snapshot.predicates {
            state.add_predicate(predicate)?;
        }

        let pending: HashSet<ExpressionId> = snapshot.expressions.iter().map(|e| e.id).collect();
        for expression in &snapshot.expressions {
            state.check_references(expression, &pending)?;
        }
        for expression in snapshot.expressions {
            state.add_expression(expression)?;
        }

        for rule in snapshot.rules {
            state.add_rule(rule)?;
        }
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Parses a JSON snapshot and loads it.
    ///
    /// # Errors
    /// `SerializationError` for malformed JSON, otherwise as
    /// [`InMemoryKnowledgeBase::from_snapshot`].
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let snapshot: KnowledgeSnapshot = serde_json::from_str(json)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    /// Captures the current contents, sorted by ID.
    ///
    /// # Errors
    /// Returns `BackendError` if the lock is poisoned.
    pub fn snapshot(&self) -> Result<KnowledgeSnapshot, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("kb.snapshot"))?;
        let mut predicates: Vec<Predicate> = state.predicates.values().cloned().collect();
        predicates.sort_by_key(|p| p.id);
        let mut expressions: Vec<Expression> = state.expressions.values().cloned().collect();
        expressions.sort_by_key(|e| e.id);
        let mut rules: Vec<Rule> = state.rules.values().cloned().collect();
        rules.sort_by_key(|r| r.id);
        Ok(KnowledgeSnapshot {
            predicates,
            expressions,
            rules,
        })
    }

    /// Serializes the current contents as JSON.
    ///
    /// # Errors
    /// `BackendError` on a poisoned lock, `SerializationError` if encoding fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        let snapshot = self.snapshot()?;
        serde_json::to_string(&snapshot).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    /// Insert a predicate. Names are unique.
    ///
    /// # Errors
    /// `DuplicateKey` if the ID or name exists, `Invalid` for a bad slug/label.
    pub fn insert_predicate(&self, predicate: Predicate) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("kb.insert_predicate"))?;
        state.add_predicate(predicate)
    }

    /// Insert an expression. Its predicate and children must already exist.
    ///
    /// # Errors
    /// `Invalid` for a malformed node, `*NotFound` for dangling references.
    pub fn insert_expression(&self, expression: Expression) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("kb.insert_expression"))?;
        state.check_references(&expression, &HashSet::new())?;
        state.add_expression(expression)
    }

    /// Insert a rule. Both expressions must already exist.
    ///
    /// # Errors
    /// `ExpressionNotFound` for dangling references, `Invalid` for a bad slug/label.
    pub fn insert_rule(&self, rule: Rule) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("kb.insert_rule"))?;
        state.add_rule(rule)
    }

    /// Creates and inserts a predicate, returning its ID.
    ///
    /// # Errors
    /// As [`InMemoryKnowledgeBase::insert_predicate`].
    pub fn add_predicate(
        &self,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<PredicateId, StorageError> {
        let predicate = Predicate::new(name, label)?;
        let id = predicate.id;
        self.insert_predicate(predicate)?;
        Ok(id)
    }

    /// Creates and inserts an identity expression over `predicate`.
    ///
    /// # Errors
    /// `PredicateNotFound` if the predicate is unknown.
    pub fn identity(&self, predicate: PredicateId) -> Result<ExpressionId, StorageError> {
        self.add_expression(Expression::identity(predicate))
    }

    /// Creates and inserts a conjunction.
    ///
    /// # Errors
    /// `Invalid` if `children` is empty, `ExpressionNotFound` for unknown children.
    pub fn and(&self, children: Vec<ExpressionId>) -> Result<ExpressionId, StorageError> {
        self.add_expression(Expression::and(children)?)
    }

    /// Creates and inserts a disjunction.
    ///
    /// # Errors
    /// `Invalid` if `children` is empty, `ExpressionNotFound` for unknown children.
    pub fn or(&self, children: Vec<ExpressionId>) -> Result<ExpressionId, StorageError> {
        self.add_expression(Expression::or(children)?)
    }

    /// Creates and inserts a negation.
    ///
    /// # Errors
    /// `ExpressionNotFound` if `child` is unknown.
    pub fn not(&self, child: ExpressionId) -> Result<ExpressionId, StorageError> {
        self.add_expression(Expression::not(child))
    }

    /// Creates and inserts a rule.
    ///
    /// # Errors
    /// As [`InMemoryKnowledgeBase::insert_rule`].
    pub fn add_rule(
        &self,
        name: impl Into<String>,
        label: impl Into<String>,
        antecedent: ExpressionId,
        consequent: ExpressionId,
    ) -> Result<RuleId, StorageError> {
        let rule = Rule::new(name, label, antecedent, consequent)?;
        let id = rule.id;
        self.insert_rule(rule)?;
        Ok(id)
    }

    fn add_expression(&self, expression: Expression) -> Result<ExpressionId, StorageError> {
        let id = expression.id;
        self.insert_expression(expression)?;
        Ok(id)
    }

    /// Number of `(predicates, expressions, rules)` stored.
    ///
    /// # Errors
    /// Returns `BackendError` if the lock is poisoned.
    pub fn counts(&self) -> Result<(usize, usize, usize), StorageError> {
        let state = self.state.read().map_err(|_| lock_err("kb.counts"))?;
        Ok((state.predicates.len(), state.expressions.len(), state.rules.len()))
    }
}

impl KnowledgeBase for InMemoryKnowledgeBase {
    fn predicate(&self, id: PredicateId) -> Result<Option<Predicate>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("kb.predicate"))?;
        Ok(state.predicates.get(&id).cloned())
    }

    fn predicate_by_name(&self, name: &str) -> Result<Option<Predicate>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("kb.predicate_by_name"))?;
        Ok(state
            .predicate_names
            .get(name.trim())
            .and_then(|id| state.predicates.get(id))
            .cloned())
    }

    fn expression(&self, id: ExpressionId) -> Result<Option<Expression>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("kb.expression"))?;
        Ok(state.expressions.get(&id).cloned())
    }

    fn rule(&self, id: RuleId) -> Result<Option<Rule>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("kb.rule"))?;
        Ok(state.rules.get(&id).cloned())
    }

    fn predicates(&self) -> Result<Vec<Predicate>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("kb.predicates"))?;
        Ok(state.predicates.values().cloned().collect())
    }

    fn expressions(&self) -> Result<Vec<Expression>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("kb.expressions"))?;
        Ok(state.expressions.values().cloned().collect())
    }

    fn rules(&self) -> Result<Vec<Rule>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("kb.rules"))?;
        Ok(state.rules.values().cloned().collect())
    }

    fn direct_parents(&self, id: ExpressionId) -> Result<Vec<ExpressionId>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("kb.direct_parents"))?;
        Ok(sorted(state.parents.get(&id)))
    }

    fn rules_with_antecedent(&self, id: ExpressionId) -> Result<Vec<RuleId>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("kb.rules_with_antecedent"))?;
        Ok(sorted(state.by_antecedent.get(&id)))
    }

    fn expressions_containing(&self, predicate: PredicateId) -> Result<Vec<ExpressionId>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("kb.expressions_containing"))?;
        Ok(sorted(state.by_predicate.get(&predicate)))
    }
}

impl TryFrom<KnowledgeSnapshot> for InMemoryKnowledgeBase {
    type Error = StorageError;

    fn try_from(snapshot: KnowledgeSnapshot) -> Result<Self, Self::Error> {
        Self::from_snapshot(snapshot)
    }
}
