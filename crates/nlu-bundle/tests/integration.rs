//! Integration tests for the nlu-bundle crate.
//!
//! These tests write bundles to disk (via tempfile) and into in-memory zip
//! archives, then load them back through both entry points.

use std::io::{Cursor, Write};
use std::path::Path;

use nlu_bundle::{BundleError, BundleOrigin, ModelBundle};
use zip::write::SimpleFileOptions;

const MANIFEST: &str = r#"{
    "model_version": "1.0.0",
    "training_package_version": "0.4.1",
    "language_code": "en",
    "dataset_metadata": {
        "entities": {
            "builtin/city": {"utterances": {"paris": "Paris", "new york": "New York"}}
        },
        "slot_name_mappings": {
            "weather": {"location": "builtin/city", "date": "builtin/datetime"},
            "greet": {}
        }
    }
}"#;

const CLASSIFIER: &str = r#"{
    "none_bias": 0.5,
    "intents": {
        "weather": {"bias": 0.0, "weights": {"weather": 3.0, "forecast": 2.5}},
        "greet": {"weights": {"hello": 3.0}}
    }
}"#;

const SLOT_FILLER: &str = r#"{"weather": {"location": {"cues": ["in", "at"]}}}"#;

fn write_bundle(dir: &Path, files: &[(&str, &str)]) {
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).unwrap();
    }
}

fn zip_bundle(prefix: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    if !prefix.is_empty() {
        writer.add_directory(prefix, options).unwrap();
    }
    for (name, contents) in files {
        writer.start_file(format!("{prefix}{name}"), options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn full_bundle() -> Vec<(&'static str, &'static str)> {
    vec![
        ("nlu_engine.json", MANIFEST),
        ("intent_classifier.json", CLASSIFIER),
        ("slot_filler.json", SLOT_FILLER),
    ]
}

// ═══════════════════════════════════════════════════════════════════════
//  Directory loading
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn directory_bundle_loads() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), &full_bundle());

    let bundle = ModelBundle::load_from_directory(dir.path()).unwrap();
    assert_eq!(bundle.model_version(), "1.0.0");
    assert_eq!(bundle.training_package_version(), Some("0.4.1"));
    assert_eq!(bundle.language_code(), "en");
    assert_eq!(bundle.intents().collect::<Vec<_>>(), vec!["greet", "weather"]);
    assert!(bundle.has_intent("weather"));
    assert!(!bundle.has_intent("book_flight"));
    assert_eq!(
        bundle.slot_mapping("weather").unwrap()["location"],
        "builtin/city"
    );
    assert_eq!(bundle.slot_filler().cues("weather", "location").len(), 2);
    assert_eq!(
        bundle.origin(),
        &BundleOrigin::Directory(dir.path().to_path_buf())
    );
}

#[test]
fn slot_filler_file_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(
        dir.path(),
        &[
            ("nlu_engine.json", MANIFEST),
            ("intent_classifier.json", CLASSIFIER),
        ],
    );

    let bundle = ModelBundle::load_from_directory(dir.path()).unwrap();
    assert!(bundle.slot_filler().intents.is_empty());
}

#[test]
fn missing_manifest_is_invalid_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), &[("intent_classifier.json", CLASSIFIER)]);

    let err = ModelBundle::load_from_directory(dir.path()).unwrap_err();
    match err {
        BundleError::InvalidBundle { reason } => assert!(reason.contains("nlu_engine.json")),
        other => panic!("expected InvalidBundle, got {other:?}"),
    }
}

#[test]
fn missing_classifier_is_invalid_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), &[("nlu_engine.json", MANIFEST)]);

    let err = ModelBundle::load_from_directory(dir.path()).unwrap_err();
    assert!(matches!(err, BundleError::InvalidBundle { .. }));
}

#[test]
fn malformed_json_is_invalid_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(
        dir.path(),
        &[
            ("nlu_engine.json", "{\"model_version\": "),
            ("intent_classifier.json", CLASSIFIER),
        ],
    );

    let err = ModelBundle::load_from_directory(dir.path()).unwrap_err();
    assert!(matches!(err, BundleError::InvalidBundle { .. }));
}

#[test]
fn nonexistent_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelBundle::load_from_directory(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, BundleError::Io(_)));
}

#[test]
fn file_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nlu_engine.json");
    std::fs::write(&file, MANIFEST).unwrap();

    let err = ModelBundle::load_from_directory(&file).unwrap_err();
    assert!(matches!(err, BundleError::Io(_)));
}

// ═══════════════════════════════════════════════════════════════════════
//  Structural validation
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn negative_weight_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = r#"{"intents": {
        "weather": {"weights": {"weather": -1.0}},
        "greet": {"weights": {"hello": 3.0}}
    }}"#;
    write_bundle(
        dir.path(),
        &[
            ("nlu_engine.json", MANIFEST),
            ("intent_classifier.json", classifier),
        ],
    );

    let err = ModelBundle::load_from_directory(dir.path()).unwrap_err();
    match err {
        BundleError::InvalidBundle { reason } => assert!(reason.contains("non-negative")),
        other => panic!("expected InvalidBundle, got {other:?}"),
    }
}

#[test]
fn classifier_intent_without_mapping_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = r#"{"intents": {
        "weather": {"weights": {}},
        "greet": {"weights": {}},
        "book_flight": {"weights": {"flight": 1.0}}
    }}"#;
    write_bundle(
        dir.path(),
        &[
            ("nlu_engine.json", MANIFEST),
            ("intent_classifier.json", classifier),
        ],
    );

    assert!(matches!(
        ModelBundle::load_from_directory(dir.path()),
        Err(BundleError::InvalidBundle { .. })
    ));
}

#[test]
fn mapped_intent_without_weights_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = r#"{"intents": {"weather": {"weights": {}}}}"#;
    write_bundle(
        dir.path(),
        &[
            ("nlu_engine.json", MANIFEST),
            ("intent_classifier.json", classifier),
        ],
    );

    assert!(matches!(
        ModelBundle::load_from_directory(dir.path()),
        Err(BundleError::InvalidBundle { .. })
    ));
}

#[test]
fn cue_for_unmapped_slot_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(
        dir.path(),
        &[
            ("nlu_engine.json", MANIFEST),
            ("intent_classifier.json", CLASSIFIER),
            ("slot_filler.json", r#"{"weather": {"origin": {"cues": ["from"]}}}"#),
        ],
    );

    assert!(matches!(
        ModelBundle::load_from_directory(dir.path()),
        Err(BundleError::InvalidBundle { .. })
    ));
}

#[test]
fn empty_model_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = MANIFEST.replace("\"1.0.0\"", "\"  \"");
    write_bundle(
        dir.path(),
        &[
            ("nlu_engine.json", manifest.as_str()),
            ("intent_classifier.json", CLASSIFIER),
        ],
    );

    assert!(matches!(
        ModelBundle::load_from_directory(dir.path()),
        Err(BundleError::InvalidBundle { .. })
    ));
}

// ═══════════════════════════════════════════════════════════════════════
//  Archive loading
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn archive_bundle_loads() {
    let bytes = zip_bundle("", &full_bundle());
    let bundle = ModelBundle::load_from_bytes(&bytes).unwrap();
    assert_eq!(bundle.model_version(), "1.0.0");
    assert_eq!(bundle.intent_count(), 2);
    assert_eq!(
        bundle.origin(),
        &BundleOrigin::Archive {
            size_bytes: bytes.len()
        }
    );
}

#[test]
fn archive_with_top_level_folder_loads() {
    let bytes = zip_bundle("trained_engine/", &full_bundle());
    let bundle = ModelBundle::load_from_bytes(&bytes).unwrap();
    assert_eq!(bundle.slot_filler().cues("weather", "location").len(), 2);
}

#[test]
fn archive_and_directory_agree() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), &full_bundle());
    let from_dir = ModelBundle::load_from_directory(dir.path()).unwrap();
    let from_zip = ModelBundle::load_from_bytes(&zip_bundle("", &full_bundle())).unwrap();

    assert_eq!(from_dir.manifest(), from_zip.manifest());
    assert_eq!(from_dir.classifier(), from_zip.classifier());
    assert_eq!(from_dir.slot_filler(), from_zip.slot_filler());
}

#[test]
fn empty_buffer_is_decode_failure() {
    let err = ModelBundle::load_from_bytes(&[]).unwrap_err();
    assert!(matches!(err, BundleError::DecodeFailure { .. }));
}

#[test]
fn garbage_bytes_are_decode_failure() {
    let err = ModelBundle::load_from_bytes(b"definitely not a zip archive").unwrap_err();
    assert!(matches!(err, BundleError::DecodeFailure { .. }));
}

#[test]
fn truncated_archive_is_decode_failure() {
    let bytes = zip_bundle("", &full_bundle());
    let err = ModelBundle::load_from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err, BundleError::DecodeFailure { .. }));
}

#[test]
fn archive_without_manifest_is_invalid_bundle() {
    let bytes = zip_bundle("", &[("intent_classifier.json", CLASSIFIER)]);
    let err = ModelBundle::load_from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, BundleError::InvalidBundle { .. }));
}
