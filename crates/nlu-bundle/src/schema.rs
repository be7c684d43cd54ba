//! Serde models of the bundle files.
//!
//! All maps are [`BTreeMap`]s so that iteration order, and therefore every
//! index the engine derives from a bundle, is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// nlu_engine.json
// ---------------------------------------------------------------------------

/// Contents of `nlu_engine.json`, the bundle's version marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineManifest {
    /// Schema version the bundle was built against.
    pub model_version: String,
    /// Version of the training tooling that produced the bundle, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_package_version: Option<String>,
    /// ISO 639-1 code of the bundle's language.
    pub language_code: String,
    pub dataset_metadata: DatasetMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Gazetteer entities keyed by identifier.  Builtin gazetteer kinds
    /// (e.g. `builtin/city`) list their values here too.
    #[serde(default)]
    pub entities: BTreeMap<String, EntityDefinition>,
    /// Intent name -> slot name -> entity identifier.  Every intent the
    /// bundle knows appears here, possibly with no slots.
    pub slot_name_mappings: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Surface form -> resolved value.  Synonyms map to their canonical
    /// value.
    pub utterances: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// intent_classifier.json
// ---------------------------------------------------------------------------

/// Linear intent scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassifierModel {
    /// Logit of the "no intent" entry.
    #[serde(default)]
    pub none_bias: f32,
    pub intents: BTreeMap<String, IntentWeights>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntentWeights {
    #[serde(default)]
    pub bias: f32,
    /// Feature (lower-cased word) -> non-negative weight.
    #[serde(default)]
    pub weights: BTreeMap<String, f32>,
}

// ---------------------------------------------------------------------------
// slot_filler.json
// ---------------------------------------------------------------------------

/// Intent name -> slot name -> cues.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotFillerModel {
    pub intents: BTreeMap<String, BTreeMap<String, SlotCues>>,
}

/// Words that, directly preceding a mention, select this slot over other
/// slots typed by the same entity (e.g. "from" vs "to").
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotCues {
    #[serde(default)]
    pub cues: Vec<String>,
}

impl SlotFillerModel {
    /// Cue words for `slot` of `intent`, empty when none are configured.
    pub fn cues(&self, intent: &str, slot: &str) -> &[String] {
        self.intents
            .get(intent)
            .and_then(|slots| slots.get(slot))
            .map(|c| c.cues.as_slice())
            .unwrap_or(&[])
    }
}
