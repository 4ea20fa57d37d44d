pub mod error;
pub mod keywords;
pub mod maintenance;
pub mod relations;
pub mod search;
pub mod stats;
pub mod store;
pub mod timeline;
pub mod types;
pub mod vectors;

pub use error::StoreError;
pub use search::QueryCriteria;
pub use store::MemoryStore;
pub use types::{Memory, MemoryType, Metadata, NewMemory, Relation};

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared lock, recovering from poisoning. Every mutation keeps the guarded
/// structure valid between statements, so a panicked holder leaves nothing
/// half-written.
pub(crate) fn read_guard<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        tracing::warn!(lock = what, "recovering poisoned lock");
        poisoned.into_inner()
    })
}

/// Exclusive lock, recovering from poisoning.
pub(crate) fn write_guard<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        tracing::warn!(lock = what, "recovering poisoned lock");
        poisoned.into_inner()
    })
}
