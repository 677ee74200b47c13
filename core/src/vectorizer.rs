use anyhow::{bail, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::vector::SparseVector;

pub type Column = u32;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\b\w\w+\b").expect("valid regex");
}

/// Maps normalized text to sparse vectors over a fixed vocabulary.
///
/// Implementations hold no cross-document state: transforming a text alone or inside a
/// batch yields the same vector.
pub trait Vectorizer: Send + Sync {
    fn transform(&self, texts: &[&str]) -> Vec<SparseVector>;
    /// Number of columns in the output space.
    fn dimensions(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Norm {
    /// Scale each vector to unit Euclidean length.
    L2,
    /// Leave raw tf-idf weights.
    Identity,
}

/// Pre-trained tf-idf weighting. Read-only once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, Column>,
    idf: Vec<f32>,
    sublinear_tf: bool,
    norm: Norm,
    #[serde(default)]
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    pub fn new(vocabulary: HashMap<String, Column>, idf: Vec<f32>) -> Result<Self> {
        let v = Self { vocabulary, idf, sublinear_tf: false, norm: Norm::L2, stop_words: HashSet::new() };
        v.validate()?;
        Ok(v)
    }

    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn column(&self, term: &str) -> Option<Column> {
        self.vocabulary.get(term).copied()
    }

    /// Check the artifact is self-consistent: one finite idf weight per column, and every
    /// column used exactly once.
    pub fn validate(&self) -> Result<()> {
        if self.idf.len() != self.vocabulary.len() {
            bail!(
                "vectorizer has {} idf weights for {} vocabulary terms",
                self.idf.len(),
                self.vocabulary.len()
            );
        }
        let mut seen = vec![false; self.idf.len()];
        for (term, &col) in &self.vocabulary {
            let slot = match seen.get_mut(col as usize) {
                Some(slot) => slot,
                None => bail!("term {term:?} maps to column {col}, outside 0..{}", self.idf.len()),
            };
            if *slot {
                bail!("column {col} is assigned to more than one term");
            }
            *slot = true;
        }
        if let Some(pos) = self.idf.iter().position(|w| !w.is_finite()) {
            bail!("idf weight for column {pos} is not finite");
        }
        Ok(())
    }

    fn transform_one(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<Column, u32> = HashMap::new();
        for m in TOKEN.find_iter(text) {
            let token = m.as_str();
            if self.stop_words.contains(token) {
                continue;
            }
            if let Some(&col) = self.vocabulary.get(token) {
                *counts.entry(col).or_insert(0) += 1;
            }
        }
        let entries: Vec<(Column, f32)> = counts
            .into_iter()
            .map(|(col, raw)| {
                let tf = if self.sublinear_tf { 1.0 + (raw as f32).ln() } else { raw as f32 };
                (col, tf * self.idf[col as usize])
            })
            .collect();
        let mut vector = SparseVector::new(entries);
        if self.norm == Norm::L2 {
            vector.l2_normalize();
        }
        vector
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, texts: &[&str]) -> Vec<SparseVector> {
        texts.iter().map(|t| self.transform_one(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.idf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectorizer() -> TfidfVectorizer {
        let vocab: HashMap<String, Column> = [("java", 0), ("developer", 1), ("python", 2), ("the", 3)]
            .into_iter()
            .map(|(t, c)| (t.to_string(), c))
            .collect();
        TfidfVectorizer::new(vocab, vec![2.0, 1.0, 2.0, 1.0]).unwrap()
    }

    #[test]
    fn unknown_terms_contribute_nothing() {
        let v = vectorizer();
        let out = v.transform(&["cobol mainframe"]);
        assert!(out[0].is_empty());
    }

    #[test]
    fn single_char_tokens_are_ignored() {
        let v = vectorizer();
        let out = v.transform(&["a java"]);
        assert_eq!(out[0].indices, vec![0]);
    }

    #[test]
    fn weights_are_tf_times_idf_then_unit_length() {
        let v = vectorizer().with_norm(Norm::Identity);
        let out = v.transform(&["java java developer"]);
        assert_eq!(out[0].indices, vec![0, 1]);
        assert_eq!(out[0].values, vec![4.0, 1.0]);

        let unit = vectorizer().transform(&["java java developer"]);
        assert!((unit[0].norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sublinear_tf_dampens_repeats() {
        let v = vectorizer().with_norm(Norm::Identity).with_sublinear_tf(true);
        let out = v.transform(&["java java"]);
        let expected = (1.0 + 2f32.ln()) * 2.0;
        assert!((out[0].values[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn stop_words_are_skipped() {
        let v = vectorizer().with_stop_words(["the"]);
        let out = v.transform(&["the developer"]);
        assert_eq!(out[0].indices, vec![1]);
    }

    #[test]
    fn batch_matches_single() {
        let v = vectorizer();
        let batch = v.transform(&["java developer", "python the python"]);
        let alone = v.transform(&["python the python"]);
        assert_eq!(batch[1], alone[0]);
    }

    #[test]
    fn rejects_inconsistent_artifacts() {
        let vocab: HashMap<String, Column> = [("a".to_string(), 0), ("b".to_string(), 0)].into_iter().collect();
        assert!(TfidfVectorizer::new(vocab, vec![1.0, 1.0]).is_err());

        let vocab: HashMap<String, Column> = [("a".to_string(), 3)].into_iter().collect();
        assert!(TfidfVectorizer::new(vocab, vec![1.0]).is_err());

        let vocab: HashMap<String, Column> = [("a".to_string(), 0)].into_iter().collect();
        assert!(TfidfVectorizer::new(vocab, vec![f32::NAN]).is_err());
        assert!(TfidfVectorizer::new(HashMap::new(), vec![1.0]).is_err());
    }
}
