//! The immutable model bundle.
//!
//! [`ModelBundle`] is read once, validated structurally, and then only ever
//! borrowed.  Checks that need engine knowledge (version compatibility,
//! entity resolution) are left to engine construction.
//!
//! # Example
//!
//! ```rust,no_run
//! # use nlu_bundle::ModelBundle;
//! let bundle = ModelBundle::load_from_directory("models/weather").unwrap();
//! println!("bundle v{} ({})", bundle.model_version(), bundle.language_code());
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{BundleError, Result};
use crate::schema::{EngineManifest, EntityDefinition, IntentClassifierModel, SlotFillerModel};
use crate::source::{ArchiveSource, BundleSource, DirectorySource};

/// Version marker and dataset metadata.  Required.
pub const MANIFEST_FILE: &str = "nlu_engine.json";
/// Intent scorer weights.  Required.
pub const CLASSIFIER_FILE: &str = "intent_classifier.json";
/// Slot disambiguation cues.  Optional.
pub const SLOT_FILLER_FILE: &str = "slot_filler.json";

/// Upper bound on the uncompressed size of a single archive entry.
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where a bundle was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleOrigin {
    Directory(PathBuf),
    Archive { size_bytes: usize },
}

/// A loaded, structurally valid model bundle.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    manifest: EngineManifest,
    classifier: IntentClassifierModel,
    slot_filler: SlotFillerModel,
    origin: BundleOrigin,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ModelBundle {
    /// Read a bundle from a directory tree.
    ///
    /// Fails with [`BundleError::Io`] if `path` is not a readable directory
    /// and with [`BundleError::InvalidBundle`] if a required file is missing
    /// or any file is malformed.
    pub fn load_from_directory(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut source = DirectorySource::open(path)?;
        let bundle = Self::from_source(&mut source, BundleOrigin::Directory(path.to_path_buf()))?;
        tracing::info!(
            path = %path.display(),
            model_version = %bundle.model_version(),
            intents = bundle.intent_count(),
            "bundle loaded from directory"
        );
        Ok(bundle)
    }

    /// Read a bundle from the bytes of a zip archive.
    ///
    /// Fails with [`BundleError::DecodeFailure`] if the buffer is empty or is
    /// not a readable archive, and with [`BundleError::InvalidBundle`] if the
    /// archive content is not a valid bundle.
    pub fn load_from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut source = ArchiveSource::open(bytes)?;
        let bundle = Self::from_source(
            &mut source,
            BundleOrigin::Archive {
                size_bytes: bytes.len(),
            },
        )?;
        tracing::info!(
            size_bytes = bytes.len(),
            model_version = %bundle.model_version(),
            intents = bundle.intent_count(),
            "bundle loaded from archive"
        );
        Ok(bundle)
    }

    fn from_source(source: &mut impl BundleSource, origin: BundleOrigin) -> Result<Self> {
        let manifest: EngineManifest = read_required(source, MANIFEST_FILE)?;
        let classifier: IntentClassifierModel = read_required(source, CLASSIFIER_FILE)?;
        let slot_filler: SlotFillerModel =
            read_optional(source, SLOT_FILLER_FILE)?.unwrap_or_default();

        let bundle = Self {
            manifest,
            classifier,
            slot_filler,
            origin,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Structural checks that only need the bundle itself.
    fn validate(&self) -> Result<()> {
        let manifest = &self.manifest;
        if manifest.model_version.trim().is_empty() {
            return Err(BundleError::invalid(format!(
                "{MANIFEST_FILE}: model_version is empty"
            )));
        }
        if manifest.language_code.trim().is_empty() {
            return Err(BundleError::invalid(format!(
                "{MANIFEST_FILE}: language_code is empty"
            )));
        }

        let mappings = &manifest.dataset_metadata.slot_name_mappings;
        if mappings.is_empty() {
            return Err(BundleError::invalid(format!(
                "{MANIFEST_FILE}: slot_name_mappings declares no intents"
            )));
        }

        for (name, entity) in &manifest.dataset_metadata.entities {
            if entity.utterances.keys().any(|u| u.trim().is_empty()) {
                return Err(BundleError::invalid(format!(
                    "{MANIFEST_FILE}: entity `{name}` has an empty utterance"
                )));
            }
        }

        // -- Classifier ------------------------------------------------------
        if !self.classifier.none_bias.is_finite() {
            return Err(BundleError::invalid(format!(
                "{CLASSIFIER_FILE}: none_bias is not finite"
            )));
        }
        for intent in mappings.keys() {
            if !self.classifier.intents.contains_key(intent) {
                return Err(BundleError::invalid(format!(
                    "{CLASSIFIER_FILE}: no weights for intent `{intent}`"
                )));
            }
        }
        for (intent, weights) in &self.classifier.intents {
            if !mappings.contains_key(intent) {
                return Err(BundleError::invalid(format!(
                    "{CLASSIFIER_FILE}: intent `{intent}` is not declared in {MANIFEST_FILE}"
                )));
            }
            if !weights.bias.is_finite() {
                return Err(BundleError::invalid(format!(
                    "{CLASSIFIER_FILE}: bias of `{intent}` is not finite"
                )));
            }
            // Non-negative weights keep scoring monotonic in matched features.
            if let Some((feature, w)) = weights
                .weights
                .iter()
                .find(|(_, w)| !w.is_finite() || **w < 0.0)
            {
                return Err(BundleError::invalid(format!(
                    "{CLASSIFIER_FILE}: weight {w} of feature `{feature}` in `{intent}` \
                     must be finite and non-negative"
                )));
            }
        }

        // -- Slot filler -----------------------------------------------------
        for (intent, slots) in &self.slot_filler.intents {
            let Some(mapped) = mappings.get(intent) else {
                return Err(BundleError::invalid(format!(
                    "{SLOT_FILLER_FILE}: intent `{intent}` is not declared in {MANIFEST_FILE}"
                )));
            };
            if let Some(slot) = slots.keys().find(|s| !mapped.contains_key(*s)) {
                return Err(BundleError::invalid(format!(
                    "{SLOT_FILLER_FILE}: slot `{slot}` is not mapped for intent `{intent}`"
                )));
            }
        }

        Ok(())
    }
}

fn read_required<T: DeserializeOwned>(source: &mut impl BundleSource, name: &str) -> Result<T> {
    read_optional(source, name)?
        .ok_or_else(|| BundleError::invalid(format!("missing required file {name}")))
}

fn read_optional<T: DeserializeOwned>(
    source: &mut impl BundleSource,
    name: &str,
) -> Result<Option<T>> {
    let Some(bytes) = source.read(name)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| BundleError::invalid(format!("{name}: {e}")))
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl ModelBundle {
    /// Schema version the bundle was built against.
    pub fn model_version(&self) -> &str {
        self.manifest.model_version.trim()
    }

    pub fn training_package_version(&self) -> Option<&str> {
        self.manifest.training_package_version.as_deref()
    }

    pub fn language_code(&self) -> &str {
        &self.manifest.language_code
    }

    pub fn origin(&self) -> &BundleOrigin {
        &self.origin
    }

    /// Intent names, sorted.
    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.manifest
            .dataset_metadata
            .slot_name_mappings
            .keys()
            .map(String::as_str)
    }

    pub fn intent_count(&self) -> usize {
        self.manifest.dataset_metadata.slot_name_mappings.len()
    }

    pub fn has_intent(&self, intent: &str) -> bool {
        self.manifest
            .dataset_metadata
            .slot_name_mappings
            .contains_key(intent)
    }

    /// Slot name -> entity identifier for `intent`.
    pub fn slot_mapping(&self, intent: &str) -> Option<&BTreeMap<String, String>> {
        self.manifest.dataset_metadata.slot_name_mappings.get(intent)
    }

    pub fn entities(&self) -> &BTreeMap<String, EntityDefinition> {
        &self.manifest.dataset_metadata.entities
    }

    pub fn manifest(&self) -> &EngineManifest {
        &self.manifest
    }

    pub fn classifier(&self) -> &IntentClassifierModel {
        &self.classifier
    }

    pub fn slot_filler(&self) -> &SlotFillerModel {
        &self.slot_filler
    }
}
