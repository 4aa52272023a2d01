//! # ponens - forward-chaining propositional inference
//!
//! ponens models propositional rules over named predicates and computes
//! everything a set of known facts entails, to closure.
//!
//! ## Core Concepts
//!
//! - **Predicate**: an atomic named proposition
//! - **Expression**: an IDENTITY/AND/OR/NOT node; children are shared by ID,
//!   so expressions form a DAG reusable across rules
//! - **Rule**: `antecedent => consequent` over two expressions
//! - **TruthAssignment**: partial map from predicates to booleans; a missing
//!   key is *unknown*, never false
//! - **AncestryIndex**: finds every rule whose antecedent contains a predicate
//! - **EntailmentEngine**: runs the fixpoint loop
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use ponens::{EntailmentEngine, InMemoryKnowledgeBase, TriState, TruthAssignment};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let kb = Arc::new(InMemoryKnowledgeBase::new());
//! let human = kb.add_predicate("human", "is Human")?;
//! let mortal = kb.add_predicate("mortal", "is Mortal")?;
//! let h = kb.identity(human)?;
//! let m = kb.identity(mortal)?;
//! kb.add_rule("example", "example rule", h, m)?;
//!
//! let engine = EntailmentEngine::with_defaults(kb)?;
//! let seed: TruthAssignment = [(human, true)].into_iter().collect();
//! let closed = engine.closure(&seed)?;
//! assert_eq!(closed.get(mortal), TriState::True);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod expression;
pub mod index;
pub mod predicate;
pub mod render;
pub mod rule;
pub mod storage;
pub mod truth;

// Re-export primary types at crate root for convenience
pub use config::{ChainingStrategy, ContradictionPolicy, EngineConfig};
pub use engine::{EntailStats, Entailment, EntailmentEngine};
pub use error::{ExecutionError, PonensError, PonensResult, ValidationError};
pub use eval::{evaluate, Evaluator, ExpressionGraph};
pub use expression::{Expression, ExpressionId, Operator};
pub use index::AncestryIndex;
pub use predicate::{Predicate, PredicateId};
pub use render::{render_expression, render_rule};
pub use rule::{Rule, RuleId};
pub use storage::{InMemoryKnowledgeBase, KnowledgeBase, KnowledgeSnapshot, StorageError};
pub use truth::{TriState, TruthAssignment};
