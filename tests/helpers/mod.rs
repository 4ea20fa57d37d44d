#![allow(dead_code)]

use mnemo::config::{MaintenanceConfig, StoreConfig};
use mnemo::memory::{Memory, MemoryStore, MemoryType, NewMemory};

/// A store with the given capacity and default settings otherwise.
pub fn test_store(max_memories: usize) -> MemoryStore {
    MemoryStore::with_capacity(max_memories)
}

/// A store whose maintenance settings are overridden, for decay tests.
pub fn test_store_with(maintenance: MaintenanceConfig) -> MemoryStore {
    MemoryStore::new(StoreConfig::default(), maintenance)
}

/// Generate a deterministic 384-dim embedding with a spike at position `seed`.
/// Each seed produces a distinct, orthogonal vector.
pub fn test_embedding(seed: u16) -> Vec<f32> {
    let mut v = vec![0.0f32; 384];
    v[seed as usize % 384] = 1.0;
    v
}

/// Extend a short vector with zeros to the default embedding dimension.
pub fn padded(head: &[f32]) -> Vec<f32> {
    let mut v = vec![0.0f32; 384];
    v[..head.len()].copy_from_slice(head);
    v
}

/// Store plain text and return the created memory.
pub fn remember(store: &MemoryStore, memory_type: MemoryType, content: &str) -> Memory {
    store
        .store_memory(NewMemory::new(memory_type, content))
        .unwrap()
}

/// Store plain text with an explicit importance.
pub fn remember_with_importance(store: &MemoryStore, content: &str, importance: f64) -> Memory {
    store
        .store_memory(NewMemory::new(MemoryType::ShortTerm, content).with_importance(importance))
        .unwrap()
}

pub fn ids(memories: &[Memory]) -> Vec<&str> {
    memories.iter().map(|m| m.id.as_str()).collect()
}
