use serde::Serialize;
use std::collections::BTreeMap;

use super::read_guard;
use super::store::MemoryStore;
use super::types::MemoryType;

/// Response from memory_stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_memories: usize,
    /// Every memory type appears, including those with zero entries.
    pub by_type: BTreeMap<String, usize>,
    /// Directed edges in the relation graph.
    pub total_relations: usize,
    /// `total_memories / max_memories`.
    pub capacity_used: f64,
    pub max_memories: usize,
    pub indexed_embeddings: usize,
    pub indexed_keywords: usize,
    pub time_buckets: usize,
}

/// Node and edge counts of the relation graph.
#[derive(Debug, Serialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

impl MemoryStore {
    pub fn graph_summary(&self) -> GraphSummary {
        let state = read_guard(&self.state, "store");
        GraphSummary {
            nodes: state.records.len(),
            edges: state.graph.edge_count(),
        }
    }

    /// Point-in-time counts, taken under one shared lock.
    pub fn stats(&self) -> StatsResponse {
        let state = read_guard(&self.state, "store");

        let by_type = MemoryType::ALL
            .into_iter()
            .map(|t| {
                let count = state.by_type.get(&t).map_or(0, |ids| ids.len());
                (t.as_str().to_string(), count)
            })
            .collect();

        let total_memories = state.records.len();
        let max_memories = self.config.max_memories;
        StatsResponse {
            total_memories,
            by_type,
            total_relations: state.graph.edge_count(),
            capacity_used: total_memories as f64 / max_memories as f64,
            max_memories,
            indexed_embeddings: self.vectors.len(),
            indexed_keywords: self.keywords.token_count(),
            time_buckets: self.timeline.bucket_count(),
        }
    }
}
