//! Importance decay, short-term consolidation, and the periodic tasks that run them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::store::MemoryStore;
use super::types::MemoryType;
use super::write_guard;
use crate::config::MaintenanceConfig;

/// Consolidation runs on a fixed period, independent of configuration.
pub const CONSOLIDATION_INTERVAL: Duration = Duration::from_secs(600);
/// Short-term memories accessed more often than this are promoted.
pub const PROMOTION_ACCESS_COUNT: u64 = 3;
/// Short-term memories more important than this are promoted.
pub const PROMOTION_IMPORTANCE: f64 = 0.7;
/// Outgoing edge strength multiplier on promotion. Not clamped to 1.0.
pub const RELATION_REINFORCEMENT: f64 = 1.2;

const MS_PER_HOUR: f64 = 3_600_000.0;

// ── Result types ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DecayResult {
    /// Memories whose importance was lowered.
    pub decayed: usize,
    /// Memories that fell below the floor and were removed.
    pub removed: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConsolidateResult {
    /// Short-term memories promoted to long-term.
    pub promoted: Vec<String>,
    pub relations_strengthened: usize,
}

// ── Decay ────────────────────────────────────────────────────────────────────

impl MemoryStore {
    /// Apply one decay pass as of now.
    pub fn apply_decay(&self) -> DecayResult {
        self.apply_decay_at(Utc::now())
    }

    /// Apply one decay pass as of `now`.
    ///
    /// Every memory loses `decay_rate × hours since last access`. Memories
    /// below the configured floor are removed after the full pass.
    pub fn apply_decay_at(&self, now: DateTime<Utc>) -> DecayResult {
        let floor = self.maintenance.decay_floor;
        let mut state = write_guard(&self.state, "store");

        let mut decayed = 0;
        let mut doomed = Vec::new();
        for record in state.records.values_mut() {
            let idle_ms = (now - record.last_access()).num_milliseconds().max(0);
            let loss = record.decay_rate * idle_ms as f64 / MS_PER_HOUR;
            if loss > 0.0 {
                record.importance -= loss;
                decayed += 1;
            }
            if record.importance < floor {
                doomed.push(record.id.clone());
            }
        }

        doomed.sort();
        for id in &doomed {
            if let Some(record) = self.remove_locked(&mut state, id) {
                tracing::debug!(id = %record.id, importance = record.importance, "decayed memory removed");
            }
        }

        DecayResult {
            decayed,
            removed: doomed,
        }
    }

    // ── Consolidation ────────────────────────────────────────────────────────

    /// Promote frequently-accessed or important short-term memories to
    /// long-term and reinforce their outgoing relations.
    pub fn consolidate(&self) -> ConsolidateResult {
        let mut state = write_guard(&self.state, "store");

        let candidates: Vec<String> = state
            .by_type
            .get(&MemoryType::ShortTerm)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();

        let mut promoted = Vec::new();
        let mut relations_strengthened = 0;
        for id in candidates {
            let Some(record) = state.records.get_mut(&id) else {
                continue;
            };
            if record.access_count() <= PROMOTION_ACCESS_COUNT
                && record.importance <= PROMOTION_IMPORTANCE
            {
                continue;
            }

            record.memory_type = MemoryType::LongTerm;
            if let Some(ids) = state.by_type.get_mut(&MemoryType::ShortTerm) {
                ids.remove(&id);
            }
            state
                .by_type
                .entry(MemoryType::LongTerm)
                .or_default()
                .insert(id.clone());
            relations_strengthened += state.graph.scale_outgoing(&id, RELATION_REINFORCEMENT);
            promoted.push(id);
        }

        ConsolidateResult {
            promoted,
            relations_strengthened,
        }
    }
}

// ── Scheduler ────────────────────────────────────────────────────────────────

/// Join handles for the two background maintenance tasks.
pub struct MaintenanceHandle {
    decay: JoinHandle<()>,
    consolidation: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Wait for both tasks to exit. They exit once the store is shut down.
    pub async fn join(self) {
        for (name, handle) in [("decay", self.decay), ("consolidation", self.consolidation)] {
            if let Err(e) = handle.await {
                tracing::warn!(task = name, error = %e, "maintenance task ended abnormally");
            }
        }
    }
}

/// Start the decay and consolidation tasks on the current tokio runtime.
///
/// Each first fires one full period after start, takes the store's write
/// lock per tick, and stops at its next wake-up after
/// [`MemoryStore::shutdown`].
pub fn spawn(store: Arc<MemoryStore>, config: &MaintenanceConfig) -> MaintenanceHandle {
    let decay_period = Duration::from_secs(config.decay_interval_secs.max(1));
    let token = store.shutdown_token();

    let decay_store = Arc::clone(&store);
    let decay = tokio::spawn(run_periodic("decay", decay_period, token.clone(), move || {
        let result = decay_store.apply_decay();
        if result.removed.is_empty() {
            tracing::debug!(decayed = result.decayed, "decay pass complete");
        } else {
            tracing::info!(
                decayed = result.decayed,
                removed = result.removed.len(),
                "decay pass removed memories"
            );
        }
    }));

    let consolidation = tokio::spawn(run_periodic(
        "consolidation",
        CONSOLIDATION_INTERVAL,
        token,
        move || {
            let result = store.consolidate();
            if !result.promoted.is_empty() {
                tracing::info!(
                    promoted = result.promoted.len(),
                    relations_strengthened = result.relations_strengthened,
                    "consolidation pass promoted memories"
                );
            }
        },
    ));

    tracing::info!(
        decay_secs = decay_period.as_secs(),
        consolidation_secs = CONSOLIDATION_INTERVAL.as_secs(),
        "maintenance tasks started"
    );
    MaintenanceHandle {
        decay,
        consolidation,
    }
}

async fn run_periodic(
    name: &'static str,
    period: Duration,
    token: CancellationToken,
    mut pass: impl FnMut() + Send,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => pass(),
        }
    }
    tracing::debug!(task = name, "maintenance task stopped");
}
