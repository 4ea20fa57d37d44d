//! Hour-bucketed time index.
//!
//! Buckets exist for retention cleanup, not range search: a temporal query
//! still visits every bucket and filters members by exact timestamp.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use super::{read_guard, write_guard};

/// Lexically sortable hour key, e.g. `2026-02-14-09`.
pub fn bucket_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d-%H").to_string()
}

#[derive(Debug, Default)]
pub struct TimeIndex {
    buckets: RwLock<HashMap<String, Vec<String>>>,
}

impl TimeIndex {
    pub fn insert(&self, id: &str, timestamp: DateTime<Utc>) {
        write_guard(&self.buckets, "time index")
            .entry(bucket_key(timestamp))
            .or_default()
            .push(id.to_string());
    }

    pub fn remove(&self, id: &str, timestamp: DateTime<Utc>) {
        let key = bucket_key(timestamp);
        let mut buckets = write_guard(&self.buckets, "time index");
        if let Some(members) = buckets.get_mut(&key) {
            members.retain(|member| member != id);
            if members.is_empty() {
                buckets.remove(&key);
            }
        }
    }

    /// Drop every bucket older than the hour of `now - retention`.
    /// Returns the number of buckets dropped.
    pub fn prune(&self, now: DateTime<Utc>, retention: Duration) -> usize {
        let cutoff = bucket_key(now - retention);
        let mut buckets = write_guard(&self.buckets, "time index");
        let before = buckets.len();
        buckets.retain(|key, _| *key >= cutoff);
        before - buckets.len()
    }

    /// Every indexed id for which `keep` returns true.
    pub fn scan(&self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let buckets = read_guard(&self.buckets, "time index");
        buckets
            .values()
            .flatten()
            .filter(|id| keep(id))
            .cloned()
            .collect()
    }

    pub fn bucket_count(&self) -> usize {
        read_guard(&self.buckets, "time index").len()
    }
}
