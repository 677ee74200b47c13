use screen_core::persist::{
    load_categories, load_classifier, load_model, save_categories, save_classifier, save_meta, save_vectorizer,
    MetaFile, ModelPaths, FORMAT_VERSION,
};
use screen_core::{CategoryMap, DocumentInput, LinearClassifier, Screener, TfidfVectorizer};
use std::collections::HashMap;
use std::fs;
use tempfile::tempdir;

fn vectorizer() -> TfidfVectorizer {
    let vocabulary: HashMap<String, u32> = [("java", 0u32), ("spring", 1), ("pandas", 2), ("python", 3)]
        .into_iter()
        .map(|(t, c)| (t.to_string(), c))
        .collect();
    TfidfVectorizer::new(vocabulary, vec![1.5, 2.0, 2.0, 1.5]).unwrap().with_sublinear_tf(true)
}

fn classifier(n_features: usize) -> LinearClassifier {
    let mut java = vec![0.0; n_features];
    let mut python = vec![0.0; n_features];
    java[0] = 1.0;
    java[1] = 1.0;
    python[2] = 1.0;
    python[3] = 1.0;
    LinearClassifier::new(vec![15, 20], vec![java, python], vec![0.0, 0.0]).unwrap()
}

fn write_model(paths: &ModelPaths, version: u32) {
    save_vectorizer(paths, &vectorizer()).unwrap();
    save_classifier(paths, &classifier(4)).unwrap();
    save_meta(paths, &MetaFile { version, created_at: "2024-01-01T00:00:00Z".into(), source: None }).unwrap();
}

#[test]
fn saved_model_screens_and_labels() {
    let dir = tempdir().unwrap();
    let paths = ModelPaths::new(dir.path());
    write_model(&paths, FORMAT_VERSION);

    let model = load_model(&paths).unwrap();
    let screening = Screener::new(&model).screen(
        "Python, pandas",
        vec![DocumentInput::new("java.txt", "Java + Spring"), DocumentInput::new("py.txt", "python pandas python")],
    );
    assert!(screening.labeling_available);
    assert_eq!(screening.results[0].document.id, "py.txt");
    assert_eq!(screening.results[0].category, "Python Developer");
    assert_eq!(screening.results[1].category, "Java Developer");
}

#[test]
fn classifier_is_optional() {
    let dir = tempdir().unwrap();
    let paths = ModelPaths::new(dir.path());
    save_vectorizer(&paths, &vectorizer()).unwrap();
    save_meta(&paths, &MetaFile { version: FORMAT_VERSION, created_at: String::new(), source: None }).unwrap();

    assert!(load_classifier(&paths).unwrap().is_none());
    let model = load_model(&paths).unwrap();
    assert!(model.classifier().is_none());
}

#[test]
fn missing_vectorizer_fails_startup() {
    let dir = tempdir().unwrap();
    let paths = ModelPaths::new(dir.path());
    save_meta(&paths, &MetaFile { version: FORMAT_VERSION, created_at: String::new(), source: None }).unwrap();
    assert!(load_model(&paths).is_err());
}

#[test]
fn corrupt_vectorizer_fails_startup() {
    let dir = tempdir().unwrap();
    let paths = ModelPaths::new(dir.path());
    write_model(&paths, FORMAT_VERSION);
    fs::write(dir.path().join("vectorizer.bin"), b"\x01\x02garbage").unwrap();
    assert!(load_model(&paths).is_err());
}

#[test]
fn unsupported_version_is_rejected() {
    let dir = tempdir().unwrap();
    let paths = ModelPaths::new(dir.path());
    write_model(&paths, FORMAT_VERSION + 1);
    let err = load_model(&paths).err().unwrap();
    assert!(err.to_string().contains("unsupported model format version"));
}

#[test]
fn narrow_classifier_degrades_to_na() {
    let dir = tempdir().unwrap();
    let paths = ModelPaths::new(dir.path());
    write_model(&paths, FORMAT_VERSION);
    let narrow = LinearClassifier::new(vec![1], vec![vec![1.0, 1.0]], vec![0.0]).unwrap();
    save_classifier(&paths, &narrow).unwrap();

    let model = load_model(&paths).unwrap();
    let screening = Screener::new(&model).screen(
        "python",
        vec![DocumentInput::new("a", "java"), DocumentInput::new("b", "python")],
    );
    assert!(!screening.labeling_available);
    assert!(screening.results.iter().all(|r| r.category == "N/A"));
    assert_eq!(screening.results[0].document.id, "b");
}

#[test]
fn category_override_round_trips() {
    let dir = tempdir().unwrap();
    let paths = ModelPaths::new(dir.path());
    assert_eq!(load_categories(&paths).unwrap(), CategoryMap::builtin());

    let custom = CategoryMap::from_pairs([(15, "Backend Engineer"), (20, "Data Engineer")]).unwrap();
    save_categories(&paths, &custom).unwrap();
    assert_eq!(load_categories(&paths).unwrap(), custom);

    fs::write(dir.path().join("categories.json"), r#"{"fifteen": "Backend"}"#).unwrap();
    assert!(load_categories(&paths).is_err());
}
