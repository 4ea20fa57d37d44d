//! Embedding index and top-K cosine similarity search.
//!
//! Vectors are normalized to unit length on insert, so a single dot product
//! against a normalized query equals cosine similarity. Top-K selection keeps
//! a bounded min-heap of capacity K instead of sorting every score.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::RwLock;

use super::{read_guard, write_guard};

/// Scale `v` to unit length. Zero vectors are returned unchanged.
///
/// The norm is accumulated in `f64`: squaring components above ~1.8e19
/// overflows `f32`.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = v
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|&x| (f64::from(x) / norm) as f32).collect()
}

/// True when every component is a finite number.
pub fn is_finite(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// A candidate in the top-K heap.
#[derive(Debug, Clone)]
pub struct Scored {
    pub id: String,
    pub score: f32,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keeps the `k` highest-scoring candidates seen so far.
pub struct TopK {
    k: usize,
    heap: BinaryHeap<Reverse<Scored>>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k),
        }
    }

    pub fn offer(&mut self, candidate: Scored) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(Reverse(candidate));
            return;
        }
        if let Some(mut min) = self.heap.peek_mut() {
            if candidate > min.0 {
                *min = Reverse(candidate);
            }
        }
    }

    /// Drain in descending score order.
    pub fn into_sorted(mut self) -> Vec<Scored> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(Reverse(min)) = self.heap.pop() {
            out.push(min);
        }
        out.reverse();
        out
    }
}

#[derive(Debug)]
pub struct EmbeddingIndex {
    dimension: usize,
    vectors: RwLock<HashMap<String, Vec<f32>>>,
}

impl EmbeddingIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: RwLock::new(HashMap::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Store a normalized copy of `embedding` under `id`.
    pub fn insert(&self, id: &str, embedding: &[f32]) {
        write_guard(&self.vectors, "embedding index").insert(id.to_string(), normalize(embedding));
    }

    pub fn remove(&self, id: &str) {
        write_guard(&self.vectors, "embedding index").remove(id);
    }

    pub fn len(&self) -> usize {
        read_guard(&self.vectors, "embedding index").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-`k` ids by cosine similarity to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<Scored> {
        let query = normalize(query);
        let vectors = read_guard(&self.vectors, "embedding index");
        let mut top = TopK::new(k);
        for (id, vector) in vectors.iter() {
            top.offer(Scored {
                id: id.clone(),
                score: dot(&query, vector),
            });
        }
        top.into_sorted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(head: &[f32]) -> Vec<f32> {
        let mut v = vec![0.0f32; 384];
        v[..head.len()].copy_from_slice(head);
        v
    }

    #[test]
    fn normalize_produces_unit_length() {
        let v = normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((dot(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_handles_large_magnitudes() {
        let v = normalize(&[1e20, 0.0, 0.0]);
        assert_eq!(v, vec![1.0, 0.0, 0.0]);

        let v = normalize(&[3e30, 4e30]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn search_ranks_large_magnitude_vector_by_direction() {
        let index = EmbeddingIndex::new(384);
        index.insert("a", &padded(&[1e20, 0.0]));
        index.insert("b", &padded(&[0.6, 0.8]));

        let hits = index.search(&padded(&[1.0, 0.0]), 2);
        let ids: Vec<&str> = hits.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn finite_check() {
        assert!(is_finite(&[0.0, -1.5, 1e30]));
        assert!(!is_finite(&[0.0, f32::NAN]));
        assert!(!is_finite(&[f32::INFINITY]));
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn top_k_keeps_highest_scores_in_descending_order() {
        let mut top = TopK::new(3);
        for (i, score) in [0.2f32, 0.9, 0.1, 0.5, 0.7, 0.3].into_iter().enumerate() {
            top.offer(Scored {
                id: format!("m{i}"),
                score,
            });
        }
        let scores: Vec<f32> = top.into_sorted().iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn top_k_breaks_score_ties_by_smaller_id() {
        let mut top = TopK::new(2);
        for id in ["d", "b", "c", "a"] {
            top.offer(Scored {
                id: id.into(),
                score: 0.5,
            });
        }
        let ids: Vec<String> = top.into_sorted().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn top_k_zero_keeps_nothing() {
        let mut top = TopK::new(0);
        top.offer(Scored {
            id: "a".into(),
            score: 1.0,
        });
        assert!(top.into_sorted().is_empty());
    }

    #[test]
    fn search_orders_by_cosine_similarity() {
        let index = EmbeddingIndex::new(384);
        index.insert("a", &padded(&[1.0, 0.0, 0.0]));
        index.insert("b", &padded(&[0.8, 0.6, 0.0]));
        index.insert("c", &padded(&[0.0, 1.0, 0.0]));

        let hits = index.search(&padded(&[1.0, 0.0, 0.0]), 2);
        let ids: Vec<&str> = hits.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn search_returns_fewer_than_k_when_index_is_small() {
        let index = EmbeddingIndex::new(384);
        index.insert("a", &padded(&[0.0, 2.0]));
        let hits = index.search(&padded(&[0.0, 5.0]), 10);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }
}
