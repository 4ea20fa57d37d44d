//! Write path: validation, capacity eviction, multi-index insert and removal.
//!
//! [`MemoryStore`] owns every record in a single table keyed by id. The type
//! index and relation graph live beside the table under one `RwLock`; the
//! time, keyword and embedding indexes carry their own locks but are only
//! mutated while that outer write lock is held, so no reader ever sees a
//! record in one index and not another.
//!
//! [`MemoryStore::remove`] and the internal `remove_locked` are the single
//! chokepoint for every destructive path: forget, capacity eviction and decay.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::error::StoreError;
use super::keywords::KeywordIndex;
use super::relations::{resolve_strength, RelationGraph, DEFAULT_STRENGTH};
use super::timeline::TimeIndex;
use super::types::{Memory, MemoryType, Metadata, NewMemory, Relation};
use super::vectors::{is_finite, EmbeddingIndex};
use super::{read_guard, write_guard};
use crate::config::{MaintenanceConfig, StoreConfig};

/// Edge label for links requested through [`NewMemory::relations`].
pub const STORE_LINK_TYPE: &str = "related";

/// A record as held in the table. Access statistics are atomics so that
/// queries running under the shared lock keep exact counts.
#[derive(Debug)]
pub(crate) struct MemoryRecord {
    pub(crate) id: String,
    pub(crate) memory_type: MemoryType,
    pub(crate) content: String,
    pub(crate) embedding: Option<Vec<f32>>,
    pub(crate) metadata: Metadata,
    pub(crate) relations: Vec<String>,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) importance: f64,
    pub(crate) decay_rate: f64,
    access_count: AtomicU64,
    /// Microseconds since the Unix epoch.
    last_access_us: AtomicI64,
}

impl MemoryRecord {
    fn from_memory(memory: Memory) -> Self {
        Self {
            access_count: AtomicU64::new(memory.access_count),
            last_access_us: AtomicI64::new(memory.last_access.timestamp_micros()),
            id: memory.id,
            memory_type: memory.memory_type,
            content: memory.content,
            embedding: memory.embedding,
            metadata: memory.metadata,
            relations: memory.relations,
            timestamp: memory.timestamp,
            importance: memory.importance,
            decay_rate: memory.decay_rate,
        }
    }

    pub(crate) fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    pub(crate) fn last_access(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.last_access_us.load(Ordering::Relaxed))
            .unwrap_or(self.timestamp)
    }

    /// Record a read: bump the counter and move `last_access` to `now`.
    pub(crate) fn touch(&self, now: DateTime<Utc>) {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        self.last_access_us
            .fetch_max(now.timestamp_micros(), Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> Memory {
        Memory {
            id: self.id.clone(),
            memory_type: self.memory_type,
            content: self.content.clone(),
            embedding: self.embedding.clone(),
            metadata: self.metadata.clone(),
            relations: self.relations.clone(),
            timestamp: self.timestamp,
            last_access: self.last_access(),
            access_count: self.access_count(),
            importance: self.importance,
            decay_rate: self.decay_rate,
        }
    }

    /// Eviction order: lowest importance first, then least recently
    /// accessed, then smallest id.
    fn eviction_cmp(&self, other: &Self) -> CmpOrdering {
        let last_access = |r: &Self| r.last_access_us.load(Ordering::Relaxed);
        self.importance
            .total_cmp(&other.importance)
            .then_with(|| last_access(self).cmp(&last_access(other)))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Table, type index and relation graph: everything behind the outer lock.
#[derive(Debug)]
pub(crate) struct StoreState {
    pub(crate) records: HashMap<String, MemoryRecord>,
    pub(crate) by_type: HashMap<MemoryType, BTreeSet<String>>,
    pub(crate) graph: RelationGraph,
}

impl StoreState {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            by_type: MemoryType::ALL
                .into_iter()
                .map(|t| (t, BTreeSet::new()))
                .collect(),
            graph: RelationGraph::default(),
        }
    }

    /// Sort `ids` by creation time, then id.
    pub(crate) fn chronological(&self, mut ids: Vec<String>) -> Vec<String> {
        ids.retain(|id| self.records.contains_key(id));
        ids.sort_by(|a, b| {
            let (ra, rb) = (&self.records[a], &self.records[b]);
            ra.timestamp.cmp(&rb.timestamp).then_with(|| a.cmp(b))
        });
        ids
    }
}

/// Result returned from a forget operation.
#[derive(Debug, Serialize)]
pub struct ForgetResult {
    /// ID of the forgotten memory.
    pub id: String,
    /// Outgoing relations dropped along with it.
    pub relations_removed: usize,
}

/// The in-process memory engine.
#[derive(Debug)]
pub struct MemoryStore {
    pub(crate) state: RwLock<StoreState>,
    pub(crate) timeline: TimeIndex,
    pub(crate) keywords: KeywordIndex,
    pub(crate) vectors: EmbeddingIndex,
    pub(crate) config: StoreConfig,
    pub(crate) maintenance: MaintenanceConfig,
    shutdown: CancellationToken,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default(), MaintenanceConfig::default())
    }
}

impl MemoryStore {
    pub fn new(mut config: StoreConfig, maintenance: MaintenanceConfig) -> Self {
        config.max_memories = config.max_memories.max(1);
        Self {
            state: RwLock::new(StoreState::new()),
            timeline: TimeIndex::default(),
            keywords: KeywordIndex::default(),
            vectors: EmbeddingIndex::new(config.embedding_dim),
            config,
            maintenance,
            shutdown: CancellationToken::new(),
        }
    }

    /// Store with the given capacity and otherwise default settings.
    pub fn with_capacity(max_memories: usize) -> Self {
        Self::new(
            StoreConfig {
                max_memories,
                ..StoreConfig::default()
            },
            MaintenanceConfig::default(),
        )
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        read_guard(&self.state, "store").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        read_guard(&self.state, "store").records.contains_key(id)
    }

    /// Create a memory from caller input: assigns the id, timestamps and
    /// decay rate, defaults out-of-range importance, then inserts it and
    /// links any requested relations in the same critical section.
    pub fn store_memory(&self, input: NewMemory) -> Result<Memory, StoreError> {
        if input.content.is_empty() {
            return Err(StoreError::validation("content must not be empty"));
        }

        let importance = match input.importance {
            Some(i) if (0.0..=1.0).contains(&i) => i,
            _ => self.config.default_importance,
        };
        let now = Utc::now();
        let memory = Memory {
            id: uuid::Uuid::now_v7().to_string(),
            memory_type: input.memory_type,
            content: input.content,
            embedding: input.embedding,
            metadata: input.metadata,
            relations: input.relations,
            timestamp: now,
            last_access: now,
            access_count: 0,
            importance,
            decay_rate: self.config.default_decay_rate,
        };

        let mut state = write_guard(&self.state, "store");
        self.insert_locked(&mut state, memory.clone())?;

        for target in &memory.relations {
            if target == &memory.id || !state.records.contains_key(target) {
                tracing::warn!(from = %memory.id, to = %target, "skipping link to unknown memory");
                continue;
            }
            state.graph.add(Relation {
                from: memory.id.clone(),
                to: target.clone(),
                relation_type: STORE_LINK_TYPE.to_string(),
                strength: DEFAULT_STRENGTH,
            });
        }

        tracing::info!(
            id = %memory.id,
            memory_type = %memory.memory_type,
            importance = memory.importance,
            "memory stored"
        );
        Ok(memory)
    }

    /// Insert a fully-formed record with a caller-assigned id.
    ///
    /// Fails on an empty id or content, importance outside `[0, 1]`, a wrong
    /// embedding dimension, or an id already present. At capacity, the least
    /// important record is evicted first.
    pub fn put(&self, memory: Memory) -> Result<(), StoreError> {
        let mut state = write_guard(&self.state, "store");
        self.insert_locked(&mut state, memory)
    }

    fn insert_locked(&self, state: &mut StoreState, memory: Memory) -> Result<(), StoreError> {
        self.validate(&memory)?;
        if state.records.contains_key(&memory.id) {
            return Err(StoreError::Conflict(format!(
                "memory with id {} already exists",
                memory.id
            )));
        }

        if state.records.len() >= self.config.max_memories {
            self.evict_least_important(state);
        }

        let record = MemoryRecord::from_memory(memory);
        if let Some(ids) = state.by_type.get_mut(&record.memory_type) {
            ids.insert(record.id.clone());
        }
        self.timeline.insert(&record.id, record.timestamp);
        self.keywords.insert(&record.id, &record.content);
        if let Some(embedding) = &record.embedding {
            self.vectors.insert(&record.id, embedding);
        }
        state.records.insert(record.id.clone(), record);
        Ok(())
    }

    fn validate(&self, memory: &Memory) -> Result<(), StoreError> {
        if memory.id.is_empty() {
            return Err(StoreError::validation("memory id must not be empty"));
        }
        if memory.content.is_empty() {
            return Err(StoreError::validation("content must not be empty"));
        }
        if !(0.0..=1.0).contains(&memory.importance) {
            return Err(StoreError::validation(format!(
                "importance must be between 0.0 and 1.0, got {}",
                memory.importance
            )));
        }
        if let Some(embedding) = &memory.embedding {
            if embedding.len() != self.config.embedding_dim {
                return Err(StoreError::validation(format!(
                    "embedding must have {} dimensions, got {}",
                    self.config.embedding_dim,
                    embedding.len()
                )));
            }
            if !is_finite(embedding) {
                return Err(StoreError::validation(
                    "embedding must contain only finite values",
                ));
            }
        }
        Ok(())
    }

    fn evict_least_important(&self, state: &mut StoreState) {
        let victim = state
            .records
            .values()
            .min_by(|a, b| a.eviction_cmp(b))
            .map(|r| r.id.clone());

        if let Some(id) = victim {
            if let Some(record) = self.remove_locked(state, &id) {
                tracing::info!(
                    id = %record.id,
                    importance = record.importance,
                    "evicted least important memory at capacity"
                );
            }
        }
    }

    /// Remove a memory from the table and every index.
    pub fn remove(&self, id: &str) -> Result<Memory, StoreError> {
        let mut state = write_guard(&self.state, "store");
        self.remove_locked(&mut state, id)
            .map(|record| record.snapshot())
            .ok_or_else(|| StoreError::NotFound(format!("memory not found: {id}")))
    }

    /// Remove a memory on a caller's request, logging why.
    pub fn forget(&self, id: &str, reason: Option<&str>) -> Result<ForgetResult, StoreError> {
        let mut state = write_guard(&self.state, "store");
        let relations_removed = state.graph.outgoing(id).len();
        let record = self
            .remove_locked(&mut state, id)
            .ok_or_else(|| StoreError::NotFound(format!("memory not found: {id}")))?;

        tracing::info!(id = %record.id, reason = reason.unwrap_or("none"), "memory forgotten");
        Ok(ForgetResult {
            id: record.id,
            relations_removed,
        })
    }

    /// The removal chokepoint. Caller holds the outer write lock.
    pub(crate) fn remove_locked(&self, state: &mut StoreState, id: &str) -> Option<MemoryRecord> {
        let record = state.records.remove(id)?;

        if let Some(ids) = state.by_type.get_mut(&record.memory_type) {
            ids.remove(id);
        }
        state.graph.remove_outgoing(id);
        self.timeline.remove(id, record.timestamp);
        self.keywords.remove(id, &record.content);
        if record.embedding.is_some() {
            self.vectors.remove(id);
        }

        let retention = Duration::days(i64::from(self.maintenance.retention_days));
        let pruned = self.timeline.prune(Utc::now(), retention);
        if pruned > 0 {
            tracing::debug!(buckets = pruned, "pruned expired time buckets");
        }

        Some(record)
    }

    /// Link two existing memories with a directed, typed edge.
    ///
    /// Strength outside `[0, 1]` (or absent) falls back to 0.5 rather than
    /// being rejected.
    pub fn create_relation(
        &self,
        from: &str,
        to: &str,
        relation_type: &str,
        strength: Option<f64>,
    ) -> Result<Relation, StoreError> {
        if from.is_empty() {
            return Err(StoreError::validation("from id must not be empty"));
        }
        if to.is_empty() {
            return Err(StoreError::validation("to id must not be empty"));
        }
        if relation_type.is_empty() {
            return Err(StoreError::validation("relation type must not be empty"));
        }

        let mut state = write_guard(&self.state, "store");
        for (role, id) in [("from", from), ("to", to)] {
            if !state.records.contains_key(id) {
                return Err(StoreError::NotFound(format!("{role} memory not found: {id}")));
            }
        }

        let relation = Relation {
            from: from.to_string(),
            to: to.to_string(),
            relation_type: relation_type.to_string(),
            strength: resolve_strength(strength),
        };
        state.graph.add(relation.clone());

        tracing::info!(
            from = %relation.from,
            to = %relation.to,
            relation_type = %relation.relation_type,
            strength = relation.strength,
            "relation created"
        );
        Ok(relation)
    }

    /// Signal the maintenance tasks to stop. Idempotent; in-flight calls
    /// are not interrupted.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!("memory store shutting down");
        }
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
