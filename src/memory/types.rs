//! Core memory type definitions.
//!
//! Defines [`MemoryType`] (the five cognitive memory categories), [`Memory`]
//! (a point-in-time snapshot of a record), [`NewMemory`] (the store input),
//! and [`Relation`] (directed graph edges between records).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StoreError;

/// Open string-keyed bag attached to a memory. Opaque to the engine.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// The five cognitive memory types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Fresh working memory, candidates for consolidation.
    ShortTerm,
    /// Consolidated memory, promoted from short-term.
    LongTerm,
    /// Events, decisions, session logs.
    Episodic,
    /// Facts, knowledge, preferences.
    Semantic,
    /// Workflows, patterns, how-to.
    Procedural,
}

impl MemoryType {
    /// Every variant, in stats order.
    pub const ALL: [MemoryType; 5] = [
        Self::ShortTerm,
        Self::LongTerm,
        Self::Episodic,
        Self::Semantic,
        Self::Procedural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortTerm => "short_term",
            Self::LongTerm => "long_term",
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Procedural => "procedural",
        }
    }
}

impl Default for MemoryType {
    fn default() -> Self {
        Self::ShortTerm
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_term" => Ok(Self::ShortTerm),
            "long_term" => Ok(Self::LongTerm),
            "episodic" => Ok(Self::Episodic),
            "semantic" => Ok(Self::Semantic),
            "procedural" => Ok(Self::Procedural),
            _ => Err(StoreError::validation(format!("unknown memory type: {s}"))),
        }
    }
}

/// A memory record as returned to callers.
///
/// Snapshots are copies: mutating one never touches the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// UUID v7 (time-sortable) identifier.
    pub id: String,
    /// Cognitive category of this memory.
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    /// The full text content of the memory.
    pub content: String,
    /// Raw embedding as supplied by the caller (not normalized).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub metadata: Metadata,
    /// Ids the caller asked to link when the memory was stored.
    pub relations: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    /// Number of times this memory has been returned by a query.
    pub access_count: u64,
    /// Eviction rank in `[0.0, 1.0]` at creation; decay may push it lower.
    pub importance: f64,
    /// Importance lost per hour without access.
    pub decay_rate: f64,
}

/// Input to [`MemoryStore::store_memory`](super::store::MemoryStore::store_memory).
#[derive(Debug, Clone, Default)]
pub struct NewMemory {
    pub memory_type: MemoryType,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
    pub metadata: Metadata,
    /// Existing ids to link from the new memory with a `related` edge.
    pub relations: Vec<String>,
    /// Falls back to the configured default when absent or outside `[0, 1]`.
    pub importance: Option<f64>,
}

impl NewMemory {
    pub fn new(memory_type: MemoryType, content: impl Into<String>) -> Self {
        Self {
            memory_type,
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_relations(mut self, relations: Vec<String>) -> Self {
        self.relations = relations;
        self
    }
}

/// A directed, typed, weighted edge between two memories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub from: String,
    pub to: String,
    /// Relationship label (e.g. `"causes"`, `"part_of"`).
    #[serde(rename = "type")]
    pub relation_type: String,
    /// In `[0.0, 1.0]` at creation; consolidation multiplies it without a cap.
    pub strength: f64,
}
