use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::vector::{cosine, SparseVector};

/// One scored document after ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    /// 1-based position after sorting.
    pub rank: usize,
    /// Index of the document in the input batch.
    pub position: usize,
    pub id: String,
    pub score: f32,
}

/// Score every document against the query by cosine similarity and order them best first.
///
/// The sort is stable, so equal scores keep their input order. No threshold is applied:
/// every document comes back exactly once.
pub fn rank(query: &SparseVector, docs: &[(&str, &SparseVector)]) -> Vec<Ranked> {
    let mut scored: Vec<(usize, f32)> = docs
        .iter()
        .enumerate()
        .map(|(position, (_, vector))| (position, cosine(query, vector)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let ranked: Vec<Ranked> = scored
        .into_iter()
        .enumerate()
        .map(|(i, (position, score))| Ranked { rank: i + 1, position, id: docs[position].0.to_string(), score })
        .collect();
    tracing::debug!(docs = ranked.len(), top = ?ranked.first().map(|r| r.score), "ranked batch");
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(entries: &[(u32, f32)]) -> SparseVector {
        SparseVector::new(entries.to_vec())
    }

    #[test]
    fn orders_by_score_descending() {
        let q = v(&[(0, 1.0)]);
        let a = v(&[(1, 1.0)]);
        let b = v(&[(0, 1.0), (1, 1.0)]);
        let c = v(&[(0, 1.0)]);
        let out = rank(&q, &[("a", &a), ("b", &b), ("c", &c)]);
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(out.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(out[0].position, 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let q = v(&[(0, 1.0)]);
        let same = v(&[(0, 2.0)]);
        let out = rank(&q, &[("x", &same), ("y", &same), ("x", &same)]);
        assert_eq!(out.iter().map(|r| r.position).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn zero_query_keeps_input_order() {
        let q = SparseVector::empty();
        let a = v(&[(0, 1.0)]);
        let b = v(&[(1, 3.0)]);
        let out = rank(&q, &[("a", &a), ("b", &b)]);
        assert!(out.iter().all(|r| r.score == 0.0));
        assert_eq!(out[0].id, "a");
        assert_eq!(out[1].id, "b");
    }

    #[test]
    fn empty_batch() {
        assert!(rank(&v(&[(0, 1.0)]), &[]).is_empty());
    }
}
