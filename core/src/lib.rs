pub mod labeler;
pub mod normalizer;
pub mod ordinal;
pub mod persist;
pub mod ranker;
pub mod screen;
pub mod vector;
pub mod vectorizer;

pub use labeler::{CategoryMap, ClassId, Classifier, Labeling, LinearClassifier};
pub use normalizer::{normalize, normalize_with, NormalizerConfig};
pub use ordinal::{ordinal, rank_label};
pub use ranker::{rank, Ranked};
pub use screen::{is_blank_query, Document, DocumentInput, RankedResult, Screener, Screening, ScreeningModel};
pub use vector::{cosine, SparseVector};
pub use vectorizer::{Column, Norm, TfidfVectorizer, Vectorizer};
