//! Knowledge-base storage.
//!
//! The trait in `traits` is the boundary the inference core reads through;
//! `memory` is a thread-safe in-memory backend and `snapshot` its
//! serializable exchange form.

mod memory;
mod snapshot;
mod traits;

pub use memory::InMemoryKnowledgeBase;
pub use snapshot::KnowledgeSnapshot;
pub use traits::{KnowledgeBase, StorageError};
