//! Bundle builders shared by the unit tests.

use nlu_bundle::ModelBundle;

/// Load a bundle whose `nlu_engine.json` carries the given slot name
/// mappings and entities, with the given classifier file.
pub(crate) fn bundle_from_json(mappings: &str, entities: &str, classifier: &str) -> ModelBundle {
    bundle_with_cues(mappings, entities, classifier, "{}")
}

/// Like [`bundle_from_json`] with a `slot_filler.json` as well.
pub(crate) fn bundle_with_cues(
    mappings: &str,
    entities: &str,
    classifier: &str,
    slot_filler: &str,
) -> ModelBundle {
    let manifest = format!(
        r#"{{
            "model_version": "{version}",
            "language_code": "en",
            "dataset_metadata": {{
                "entities": {entities},
                "slot_name_mappings": {mappings}
            }}
        }}"#,
        version = crate::MODEL_VERSION,
    );

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(nlu_bundle::MANIFEST_FILE), manifest).unwrap();
    std::fs::write(dir.path().join(nlu_bundle::CLASSIFIER_FILE), classifier).unwrap();
    std::fs::write(dir.path().join(nlu_bundle::SLOT_FILLER_FILE), slot_filler).unwrap();
    ModelBundle::load_from_directory(dir.path()).unwrap()
}
