use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::vector::SparseVector;

pub type ClassId = u32;

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const UNAVAILABLE_LABEL: &str = "N/A";

const BUILTIN_CATEGORIES: [(ClassId, &str); 25] = [
    (0, "Advocate"),
    (1, "Arts"),
    (2, "Automation Testing"),
    (3, "Blockchain"),
    (4, "Business Analyst"),
    (5, "Civil Engineer"),
    (6, "Data Science"),
    (7, "Database"),
    (8, "DevOps Engineer"),
    (9, "DotNet Developer"),
    (10, "ETL Developer"),
    (11, "Electrical Engineering"),
    (12, "HR"),
    (13, "Hadoop"),
    (14, "Health and fitness"),
    (15, "Java Developer"),
    (16, "Mechanical Engineer"),
    (17, "Network Security Engineer"),
    (18, "Operations Manager"),
    (19, "PMO"),
    (20, "Python Developer"),
    (21, "Sap Developer"),
    (22, "Sales"),
    (23, "Testing"),
    (24, "Web Designing"),
];

/// Batch predictor over document vectors.
pub trait Classifier: Send + Sync {
    /// One class id per input vector, in input order.
    fn predict(&self, vectors: &[SparseVector]) -> Result<Vec<ClassId>>;
}

/// One-vs-rest linear model: the class with the highest `coef · x + intercept` wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    classes: Vec<ClassId>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
    n_features: usize,
}

impl LinearClassifier {
    pub fn new(classes: Vec<ClassId>, coef: Vec<Vec<f32>>, intercept: Vec<f32>) -> Result<Self> {
        let n_features = coef.first().map(Vec::len).unwrap_or(0);
        let c = Self { classes, coef, intercept, n_features };
        c.validate()?;
        Ok(c)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            bail!("classifier has no classes");
        }
        if self.coef.len() != self.classes.len() || self.intercept.len() != self.classes.len() {
            bail!(
                "classifier shape mismatch: {} classes, {} coefficient rows, {} intercepts",
                self.classes.len(),
                self.coef.len(),
                self.intercept.len()
            );
        }
        if let Some(row) = self.coef.iter().position(|r| r.len() != self.n_features) {
            bail!("coefficient row {row} does not have {} features", self.n_features);
        }
        Ok(())
    }

    fn decide(&self, vector: &SparseVector) -> Result<ClassId> {
        if let Some(max) = vector.max_index() {
            if max as usize >= self.n_features {
                bail!("vector references column {max} but the classifier expects {} features", self.n_features);
            }
        }
        let mut best: Option<(usize, f32)> = None;
        for (k, (row, b)) in self.coef.iter().zip(&self.intercept).enumerate() {
            let z = vector.iter().map(|(col, x)| row[col as usize] * x).sum::<f32>() + b;
            match best {
                Some((_, top)) if z <= top => {}
                _ => best = Some((k, z)),
            }
        }
        match best {
            Some((k, _)) => Ok(self.classes[k]),
            None => bail!("classifier has no classes"),
        }
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, vectors: &[SparseVector]) -> Result<Vec<ClassId>> {
        vectors.iter().map(|v| self.decide(v)).collect()
    }
}

/// Immutable class id → label table. Ids outside the table read as "Unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    labels: BTreeMap<ClassId, String>,
}

impl CategoryMap {
    /// The 25 job categories the stock classifier predicts.
    pub fn builtin() -> Self {
        Self { labels: BUILTIN_CATEGORIES.iter().map(|(id, l)| (*id, l.to_string())).collect() }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ClassId, S)>,
        S: Into<String>,
    {
        let mut labels = BTreeMap::new();
        for (id, label) in pairs {
            let label: String = label.into();
            if label.trim().is_empty() {
                bail!("category {id} has an empty label");
            }
            if labels.insert(id, label).is_some() {
                bail!("category {id} is defined twice");
            }
        }
        if labels.is_empty() {
            bail!("category map is empty");
        }
        Ok(Self { labels })
    }

    /// Parse `{"<id>": "<label>", ...}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json).context("category map is not a JSON object of strings")?;
        let mut pairs = Vec::with_capacity(raw.len());
        for (key, label) in raw {
            let id: ClassId = key.trim().parse().with_context(|| format!("category id {key:?} is not an integer"))?;
            pairs.push((id, label));
        }
        Self::from_pairs(pairs)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn label(&self, id: ClassId) -> &str {
        self.labels.get(&id).map(String::as_str).unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str)> {
        self.labels.iter().map(|(id, l)| (*id, l.as_str()))
    }

    pub fn to_json(&self) -> Result<String> {
        let raw: BTreeMap<String, &str> = self.labels.iter().map(|(id, l)| (id.to_string(), l.as_str())).collect();
        Ok(serde_json::to_string_pretty(&raw)?)
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Outcome of labeling one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Labeling {
    Labeled(Vec<String>),
    Unavailable { reason: String },
}

impl Labeling {
    pub fn is_available(&self) -> bool {
        matches!(self, Labeling::Labeled(_))
    }

    /// Per-document labels; an unavailable batch reads "N/A" for all `n` documents.
    pub fn into_labels(self, n: usize) -> Vec<String> {
        match self {
            Labeling::Labeled(labels) => labels,
            Labeling::Unavailable { .. } => vec![UNAVAILABLE_LABEL.to_string(); n],
        }
    }
}

/// Predict a category for every vector. Failure is reported once for the whole batch.
pub fn label(classifier: Option<&dyn Classifier>, categories: &CategoryMap, vectors: &[SparseVector]) -> Labeling {
    let Some(classifier) = classifier else {
        return Labeling::Unavailable { reason: "no classifier loaded".into() };
    };
    let outcome = classifier.predict(vectors).and_then(|ids| {
        if ids.len() != vectors.len() {
            bail!("classifier returned {} predictions for {} documents", ids.len(), vectors.len());
        }
        Ok(ids)
    });
    match outcome {
        Ok(ids) => Labeling::Labeled(ids.into_iter().map(|id| categories.label(id).to_string()).collect()),
        Err(e) => {
            tracing::warn!(error = %e, docs = vectors.len(), "category prediction unavailable for batch");
            Labeling::Unavailable { reason: format!("{e:#}") }
        }
    }
}
