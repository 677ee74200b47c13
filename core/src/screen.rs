use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::labeler::{label, CategoryMap, Classifier, Labeling};
use crate::normalizer::{normalize_with, NormalizerConfig};
use crate::ordinal::ordinal;
use crate::ranker::rank;
use crate::vector::SparseVector;
use crate::vectorizer::Vectorizer;

/// Read-only model handle: built once at startup, shared by every request.
pub struct ScreeningModel {
    vectorizer: Box<dyn Vectorizer>,
    classifier: Option<Box<dyn Classifier>>,
    categories: CategoryMap,
}

impl ScreeningModel {
    pub fn new(vectorizer: impl Vectorizer + 'static) -> Self {
        Self { vectorizer: Box::new(vectorizer), classifier: None, categories: CategoryMap::builtin() }
    }

    pub fn with_classifier(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.categories = categories;
        self
    }

    pub fn vectorizer(&self) -> &dyn Vectorizer {
        self.vectorizer.as_ref()
    }

    pub fn classifier(&self) -> Option<&dyn Classifier> {
        self.classifier.as_deref()
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }
}

/// A candidate as handed over by the document source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInput {
    pub id: String,
    pub text: String,
}

impl DocumentInput {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub raw_text: String,
    pub normalized_text: String,
    pub vector: SparseVector,
}

#[derive(Debug, Clone)]
pub struct RankedResult {
    pub rank: usize,
    /// `rank` as an English ordinal ("1st", "2nd", ...).
    pub ordinal: String,
    pub document: Document,
    pub score: f32,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct Screening {
    pub results: Vec<RankedResult>,
    pub labeling_available: bool,
    /// Why categories read "N/A", when they do.
    pub labeling_issue: Option<String>,
}

/// Whether a query carries nothing to rank against. Callers gate on this before screening.
pub fn is_blank_query(query: &str) -> bool {
    query.trim().is_empty()
}

/// Runs one ranking request against a shared model.
pub struct Screener<'m> {
    model: &'m ScreeningModel,
    config: NormalizerConfig,
}

impl<'m> Screener<'m> {
    pub fn new(model: &'m ScreeningModel) -> Self {
        Self::with_config(model, NormalizerConfig::default())
    }

    pub fn with_config(model: &'m ScreeningModel, config: NormalizerConfig) -> Self {
        Self { model, config }
    }

    pub fn normalize(&self, text: &str) -> String {
        normalize_with(text, &self.config)
    }

    /// Clean, vectorize, label and rank one batch of candidates against the query.
    ///
    /// Never fails: a zero query vector scores everything 0, and classifier trouble only turns
    /// the categories into "N/A".
    pub fn screen(&self, query: &str, inputs: Vec<DocumentInput>) -> Screening {
        let start = Instant::now();
        let n = inputs.len();

        let normalized: Vec<String> = inputs.iter().map(|d| self.normalize(&d.text)).collect();
        let texts: Vec<&str> = normalized.iter().map(String::as_str).collect();
        let mut vectors = self.model.vectorizer.transform(&texts);
        if vectors.len() != n {
            tracing::warn!(expected = n, got = vectors.len(), "vectorizer returned a short batch; padding with zero vectors");
            vectors.resize(n, SparseVector::empty());
        }

        let query_norm = self.normalize(query);
        let query_vec = self.model.vectorizer.transform(&[query_norm.as_str()]).into_iter().next().unwrap_or_default();

        let labeling = label(self.model.classifier(), &self.model.categories, &vectors);
        let labeling_available = labeling.is_available();
        let labeling_issue = match &labeling {
            Labeling::Unavailable { reason } => Some(reason.clone()),
            _ => None,
        };
        let labels = labeling.into_labels(n);

        let pairs: Vec<(&str, &SparseVector)> = inputs.iter().map(|d| d.id.as_str()).zip(vectors.iter()).collect();
        let ranked = rank(&query_vec, &pairs);

        let mut slots: Vec<Option<(Document, String)>> = inputs
            .into_iter()
            .zip(normalized)
            .zip(vectors)
            .zip(labels)
            .map(|(((input, normalized_text), vector), category)| {
                Some((Document { id: input.id, raw_text: input.text, normalized_text, vector }, category))
            })
            .collect();

        let results: Vec<RankedResult> = ranked
            .into_iter()
            .filter_map(|r| {
                let (document, category) = slots.get_mut(r.position)?.take()?;
                Some(RankedResult { rank: r.rank, ordinal: ordinal(r.rank), document, score: r.score, category })
            })
            .collect();

        tracing::debug!(
            docs = results.len(),
            labeling_available,
            took_ms = start.elapsed().as_millis() as u64,
            "screened batch"
        );
        Screening { results, labeling_available, labeling_issue }
    }
}
