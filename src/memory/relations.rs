//! Directed relation graph between memories and bounded-depth traversal.
//!
//! Edges are stored keyed by `from`. Endpoint existence is checked by the
//! store when an edge is created; removing a record drops its outgoing edges
//! but incoming edges from other records are left dangling and skipped here.

use std::collections::{HashMap, HashSet};

use super::types::Relation;

/// Strength used when the caller supplies none or one outside `[0, 1]`.
pub const DEFAULT_STRENGTH: f64 = 0.5;

/// Clamp an optional caller strength to the default when out of range.
pub fn resolve_strength(strength: Option<f64>) -> f64 {
    match strength {
        Some(s) if (0.0..=1.0).contains(&s) => s,
        _ => DEFAULT_STRENGTH,
    }
}

#[derive(Debug, Default)]
pub struct RelationGraph {
    edges: HashMap<String, Vec<Relation>>,
}

impl RelationGraph {
    pub fn add(&mut self, relation: Relation) {
        self.edges
            .entry(relation.from.clone())
            .or_default()
            .push(relation);
    }

    pub fn outgoing(&self, from: &str) -> &[Relation] {
        self.edges.get(from).map(Vec::as_slice).unwrap_or_default()
    }

    /// Drop every edge leaving `from`. Returns how many were removed.
    pub fn remove_outgoing(&mut self, from: &str) -> usize {
        self.edges.remove(from).map_or(0, |edges| edges.len())
    }

    /// Multiply the strength of every edge leaving `from` by `factor`.
    /// No upper clamp is applied. Returns the number of edges touched.
    pub fn scale_outgoing(&mut self, from: &str, factor: f64) -> usize {
        match self.edges.get_mut(from) {
            Some(edges) => {
                for edge in edges.iter_mut() {
                    edge.strength *= factor;
                }
                edges.len()
            }
            None => 0,
        }
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Breadth-first walk from `start` up to `depth` hops.
    ///
    /// Returns ids in first-discovery order, excluding `start`, without
    /// duplicates. `exists` filters out dangling endpoints, which are neither
    /// emitted nor expanded.
    pub fn traverse(&self, start: &str, depth: usize, exists: impl Fn(&str) -> bool) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut frontier: Vec<&str> = vec![start];
        let mut found = Vec::new();

        for _ in 0..depth {
            if frontier.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for id in frontier {
                for edge in self.outgoing(id) {
                    let to = edge.to.as_str();
                    if !visited.insert(to) || !exists(to) {
                        continue;
                    }
                    found.push(to.to_string());
                    next.push(to);
                }
            }
            frontier = next;
        }

        found
    }
}
