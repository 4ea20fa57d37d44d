//! Read path: query dispatch across the five retrieval strategies, plus
//! side-effect-free inspection.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::StoreError;
use super::read_guard;
use super::store::{MemoryStore, StoreState};
use super::types::{Memory, MemoryType, Relation};
use super::vectors::is_finite;

/// Hard upper bound on `limit`.
pub const MAX_LIMIT: i64 = 1000;
/// Limit used when the caller passes 0.
pub const DEFAULT_LIMIT: usize = 10;

// ── Public types ──────────────────────────────────────────────────────────────

/// Which index answers a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStrategy {
    Similarity,
    Temporal,
    Type,
    Related,
    Keywords,
}

impl QueryStrategy {
    /// Parse a strategy tag. Any non-empty tag that is not one of the named
    /// strategies falls through to keyword search.
    pub fn from_tag(tag: &str) -> Result<Self, StoreError> {
        match tag {
            "" => Err(StoreError::validation("query type must not be empty")),
            "similarity" => Ok(Self::Similarity),
            "temporal" => Ok(Self::Temporal),
            "type" => Ok(Self::Type),
            "related" => Ok(Self::Related),
            _ => Ok(Self::Keywords),
        }
    }
}

/// What to look for and how many results to return.
#[derive(Debug, Clone, Default)]
pub struct QueryCriteria {
    /// Strategy tag: `similarity`, `temporal`, `type`, `related`, or anything
    /// else for keywords.
    pub query_type: String,
    pub keywords: Vec<String>,
    pub memory_type: Option<MemoryType>,
    pub embedding: Option<Vec<f32>>,
    /// Exclusive lower bound; `None` is unbounded.
    pub start_time: Option<DateTime<Utc>>,
    /// Exclusive upper bound; `None` is unbounded.
    pub end_time: Option<DateTime<Utc>>,
    /// Traversal start for `related`.
    pub memory_id: Option<String>,
    /// Traversal hops for `related`.
    pub depth: usize,
    /// 0 means the default of 10; negative or above 1000 is rejected.
    pub limit: i64,
}

impl QueryCriteria {
    pub fn keywords<S: Into<String>>(keywords: impl IntoIterator<Item = S>) -> Self {
        Self {
            query_type: "keywords".into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn similarity(embedding: Vec<f32>) -> Self {
        Self {
            query_type: "similarity".into(),
            embedding: Some(embedding),
            ..Default::default()
        }
    }

    pub fn by_type(memory_type: MemoryType) -> Self {
        Self {
            query_type: "type".into(),
            memory_type: Some(memory_type),
            ..Default::default()
        }
    }

    pub fn temporal(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            query_type: "temporal".into(),
            start_time: start,
            end_time: end,
            ..Default::default()
        }
    }

    pub fn related(memory_id: impl Into<String>, depth: usize) -> Self {
        Self {
            query_type: "related".into(),
            memory_id: Some(memory_id.into()),
            depth,
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }
}

/// Full inspection response for a single memory.
#[derive(Debug, Serialize)]
pub struct InspectResponse {
    pub memory: Memory,
    /// Outgoing edges, in creation order.
    pub relations: Vec<Relation>,
}

/// Validate `limit` and apply the default.
pub fn resolve_limit(limit: i64) -> Result<usize, StoreError> {
    match limit {
        l if l < 0 => Err(StoreError::validation("query limit cannot be negative")),
        l if l > MAX_LIMIT => Err(StoreError::validation(format!(
            "query limit cannot exceed {MAX_LIMIT}"
        ))),
        0 => Ok(DEFAULT_LIMIT),
        // Bounded by MAX_LIMIT above
        l => Ok(l as usize),
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

impl MemoryStore {
    /// Run a query and record the access on every returned memory.
    ///
    /// Returned snapshots already carry the updated `access_count` and
    /// `last_access`.
    pub fn query(&self, criteria: &QueryCriteria) -> Result<Vec<Memory>, StoreError> {
        let strategy = QueryStrategy::from_tag(&criteria.query_type)?;
        let limit = resolve_limit(criteria.limit)?;

        let state = read_guard(&self.state, "store");
        let ids = match strategy {
            QueryStrategy::Similarity => self.find_similar(criteria, limit)?,
            QueryStrategy::Temporal => find_temporal(self, &state, criteria, limit),
            QueryStrategy::Type => find_by_type(&state, criteria, limit)?,
            QueryStrategy::Related => find_related(&state, criteria, limit)?,
            QueryStrategy::Keywords => {
                let ids = self.keywords.lookup(criteria.keywords.as_slice());
                truncated(state.chronological(ids.into_iter().collect()), limit)
            }
        };

        let now = Utc::now();
        let results: Vec<Memory> = ids
            .iter()
            .filter_map(|id| state.records.get(id))
            .map(|record| {
                record.touch(now);
                record.snapshot()
            })
            .collect();

        tracing::debug!(
            query_type = %criteria.query_type,
            results = results.len(),
            "query served"
        );
        Ok(results)
    }

    /// Look up one memory and its outgoing relations without counting it as
    /// an access.
    pub fn inspect(&self, id: &str) -> Result<InspectResponse, StoreError> {
        let state = read_guard(&self.state, "store");
        let record = state
            .records
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("memory not found: {id}")))?;
        Ok(InspectResponse {
            memory: record.snapshot(),
            relations: state.graph.outgoing(id).to_vec(),
        })
    }

    fn find_similar(&self, criteria: &QueryCriteria, limit: usize) -> Result<Vec<String>, StoreError> {
        let query = match criteria.embedding.as_deref() {
            Some(e) if !e.is_empty() => e,
            _ => return Err(StoreError::validation("similarity query requires an embedding")),
        };
        if query.len() != self.vectors.dimension() {
            return Err(StoreError::validation(format!(
                "query embedding must have {} dimensions, got {}",
                self.vectors.dimension(),
                query.len()
            )));
        }
        if !is_finite(query) {
            return Err(StoreError::validation(
                "query embedding must contain only finite values",
            ));
        }
        Ok(self
            .vectors
            .search(query, limit)
            .into_iter()
            .map(|scored| scored.id)
            .collect())
    }
}

// ── Strategies ────────────────────────────────────────────────────────────────

fn find_temporal(
    store: &MemoryStore,
    state: &StoreState,
    criteria: &QueryCriteria,
    limit: usize,
) -> Vec<String> {
    let after_start = |ts: DateTime<Utc>| criteria.start_time.map_or(true, |start| ts > start);
    let before_end = |ts: DateTime<Utc>| criteria.end_time.map_or(true, |end| ts < end);

    let ids = store.timeline.scan(|id| {
        state
            .records
            .get(id)
            .is_some_and(|r| after_start(r.timestamp) && before_end(r.timestamp))
    });
    truncated(state.chronological(ids), limit)
}

fn find_by_type(
    state: &StoreState,
    criteria: &QueryCriteria,
    limit: usize,
) -> Result<Vec<String>, StoreError> {
    let memory_type = criteria
        .memory_type
        .ok_or_else(|| StoreError::validation("type query requires a memory type"))?;
    let ids = state
        .by_type
        .get(&memory_type)
        .map(|ids| ids.iter().cloned().collect())
        .unwrap_or_default();
    Ok(truncated(state.chronological(ids), limit))
}

fn find_related(
    state: &StoreState,
    criteria: &QueryCriteria,
    limit: usize,
) -> Result<Vec<String>, StoreError> {
    let start = match criteria.memory_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => return Err(StoreError::validation("related query requires a memory id")),
    };
    let ids = state
        .graph
        .traverse(start, criteria.depth, |id| state.records.contains_key(id));
    Ok(truncated(ids, limit))
}

fn truncated(mut ids: Vec<String>, limit: usize) -> Vec<String> {
    ids.truncate(limit);
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::NewMemory;
    use chrono::Duration;

    fn padded(head: &[f32]) -> Vec<f32> {
        let mut v = vec![0.0f32; 384];
        v[..head.len()].copy_from_slice(head);
        v
    }

    fn store_text(store: &MemoryStore, memory_type: MemoryType, content: &str) -> Memory {
        store
            .store_memory(NewMemory::new(memory_type, content))
            .unwrap()
    }

    #[test]
    fn strategy_tags() {
        assert_eq!(QueryStrategy::from_tag("similarity").unwrap(), QueryStrategy::Similarity);
        assert_eq!(QueryStrategy::from_tag("related").unwrap(), QueryStrategy::Related);
        assert_eq!(QueryStrategy::from_tag("keywords").unwrap(), QueryStrategy::Keywords);
        assert_eq!(QueryStrategy::from_tag("anything").unwrap(), QueryStrategy::Keywords);
        assert!(QueryStrategy::from_tag("").is_err());
    }

    #[test]
    fn limit_validation() {
        assert_eq!(resolve_limit(0).unwrap(), DEFAULT_LIMIT);
        assert_eq!(resolve_limit(1000).unwrap(), 1000);
        assert!(resolve_limit(-1).is_err());
        assert!(resolve_limit(1001).is_err());
    }

    #[test]
    fn query_rejects_bad_criteria() {
        let store = MemoryStore::default();
        let empty = QueryCriteria::default();
        assert!(matches!(store.query(&empty), Err(StoreError::Validation(_))));

        let negative = QueryCriteria::keywords(["x"]).with_limit(-5);
        assert!(store.query(&negative).is_err());

        let no_embedding = QueryCriteria {
            query_type: "similarity".into(),
            ..Default::default()
        };
        assert!(store.query(&no_embedding).is_err());

        let wrong_dim = QueryCriteria::similarity(vec![1.0, 0.0]);
        assert!(store.query(&wrong_dim).is_err());

        let nan_query = QueryCriteria::similarity(padded(&[f32::NAN]));
        let err = store.query(&nan_query).unwrap_err();
        assert!(err.to_string().contains("finite"));

        let no_type = QueryCriteria {
            query_type: "type".into(),
            ..Default::default()
        };
        assert!(store.query(&no_type).is_err());

        let no_start = QueryCriteria {
            query_type: "related".into(),
            depth: 2,
            ..Default::default()
        };
        assert!(store.query(&no_start).is_err());
    }

    #[test]
    fn keyword_query_counts_accesses() {
        let store = MemoryStore::default();
        store_text(&store, MemoryType::ShortTerm, "The quick brown fox");

        for expected in 1..=3 {
            let results = store.query(&QueryCriteria::keywords(["quick"])).unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].access_count, expected);
        }
    }

    #[test]
    fn temporal_bounds_are_exclusive() {
        let store = MemoryStore::default();
        let m = store_text(&store, MemoryType::Episodic, "event");

        let inside = QueryCriteria::temporal(
            Some(m.timestamp - Duration::seconds(1)),
            Some(m.timestamp + Duration::seconds(1)),
        );
        assert_eq!(store.query(&inside).unwrap().len(), 1);

        let at_start = QueryCriteria::temporal(Some(m.timestamp), None);
        assert!(store.query(&at_start).unwrap().is_empty());

        let unbounded = QueryCriteria::temporal(None, None);
        assert_eq!(store.query(&unbounded).unwrap().len(), 1);
    }

    #[test]
    fn limit_truncates_every_strategy() {
        let store = MemoryStore::default();
        for i in 0..5 {
            store
                .store_memory(
                    NewMemory::new(MemoryType::Semantic, format!("shared token {i}"))
                        .with_embedding(padded(&[1.0, i as f32])),
                )
                .unwrap();
        }

        let by_type = QueryCriteria::by_type(MemoryType::Semantic).with_limit(2);
        assert_eq!(store.query(&by_type).unwrap().len(), 2);
        let keywords = QueryCriteria::keywords(["shared"]).with_limit(3);
        assert_eq!(store.query(&keywords).unwrap().len(), 3);
        let similar = QueryCriteria::similarity(padded(&[1.0])).with_limit(4);
        assert_eq!(store.query(&similar).unwrap().len(), 4);
        let temporal = QueryCriteria::temporal(None, None).with_limit(1);
        assert_eq!(store.query(&temporal).unwrap().len(), 1);
    }

    #[test]
    fn type_query_returns_creation_order() {
        let store = MemoryStore::default();
        let a = store_text(&store, MemoryType::Procedural, "step one");
        let b = store_text(&store, MemoryType::Procedural, "step two");
        store_text(&store, MemoryType::Semantic, "unrelated");

        let results = store
            .query(&QueryCriteria::by_type(MemoryType::Procedural))
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str()]);
    }

    #[test]
    fn inspect_does_not_count_access() {
        let store = MemoryStore::default();
        let a = store_text(&store, MemoryType::Semantic, "alpha");
        let b = store_text(&store, MemoryType::Semantic, "beta");
        store.create_relation(&a.id, &b.id, "precedes", Some(0.4)).unwrap();

        let inspected = store.inspect(&a.id).unwrap();
        assert_eq!(inspected.memory.access_count, 0);
        assert_eq!(inspected.relations.len(), 1);
        assert_eq!(inspected.relations[0].to, b.id);

        assert!(matches!(store.inspect("missing"), Err(StoreError::NotFound(_))));
    }
}
