use crate::{CategoryMap, LinearClassifier, ScreeningModel, TfidfVectorizer, Vectorizer};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
    /// Free-form note about where the artifacts came from.
    #[serde(default)]
    pub source: Option<String>,
}

/// Layout of a model directory.
pub struct ModelPaths {
    pub root: PathBuf,
}

impl ModelPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn vectorizer(&self) -> PathBuf { self.root.join("vectorizer.bin") }
    fn classifier(&self) -> PathBuf { self.root.join("classifier.bin") }
    fn categories(&self) -> PathBuf { self.root.join("categories.json") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    f.write_all(bytes)?;
    Ok(())
}

pub fn save_vectorizer(paths: &ModelPaths, vectorizer: &TfidfVectorizer) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bytes(&paths.vectorizer(), &bincode::serialize(vectorizer)?)
}

pub fn load_vectorizer(paths: &ModelPaths) -> Result<TfidfVectorizer> {
    let buf = read_bytes(&paths.vectorizer())?;
    let vectorizer: TfidfVectorizer = bincode::deserialize(&buf).context("decoding vectorizer.bin")?;
    vectorizer.validate().context("vectorizer.bin is inconsistent")?;
    Ok(vectorizer)
}

pub fn save_classifier(paths: &ModelPaths, classifier: &LinearClassifier) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bytes(&paths.classifier(), &bincode::serialize(classifier)?)
}

/// The classifier is optional; `Ok(None)` when the directory carries none.
pub fn load_classifier(paths: &ModelPaths) -> Result<Option<LinearClassifier>> {
    let path = paths.classifier();
    if !path.exists() {
        return Ok(None);
    }
    let buf = read_bytes(&path)?;
    let classifier: LinearClassifier = bincode::deserialize(&buf).context("decoding classifier.bin")?;
    classifier.validate().context("classifier.bin is inconsistent")?;
    Ok(Some(classifier))
}

pub fn save_categories(paths: &ModelPaths, categories: &CategoryMap) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bytes(&paths.categories(), categories.to_json()?.as_bytes())
}

/// Category labels from `categories.json`, or the built-in table when the file is absent.
pub fn load_categories(paths: &ModelPaths) -> Result<CategoryMap> {
    let path = paths.categories();
    if !path.exists() {
        return Ok(CategoryMap::builtin());
    }
    CategoryMap::from_file(&path)
}

pub fn save_meta(paths: &ModelPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_bytes(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &ModelPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf).context("parsing meta.json")?;
    Ok(meta)
}

/// Load every artifact needed to serve requests. Any error here is fatal for startup.
pub fn load_model(paths: &ModelPaths) -> Result<ScreeningModel> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        bail!("unsupported model format version {} (expected {FORMAT_VERSION})", meta.version);
    }
    let vectorizer = load_vectorizer(paths)?;
    let classifier = load_classifier(paths)?;
    let categories = load_categories(paths)?;

    tracing::info!(
        root = %paths.root.display(),
        created_at = %meta.created_at,
        vocabulary = vectorizer.vocabulary_len(),
        classifier = classifier.is_some(),
        categories = categories.len(),
        "loaded model"
    );

    let mut model = ScreeningModel::new(vectorizer).with_categories(categories);
    if let Some(classifier) = classifier {
        if classifier.n_features() != model.vectorizer().dimensions() {
            tracing::warn!(
                classifier_features = classifier.n_features(),
                vectorizer_dimensions = model.vectorizer().dimensions(),
                "classifier and vectorizer disagree on dimensions; categories may be unavailable"
            );
        }
        model = model.with_classifier(classifier);
    }
    Ok(model)
}
