//! Model bundle loading for the NLU engine.
//!
//! A bundle is the packaged, versioned set of model artifacts the engine is
//! built from.  It can be read from a directory tree or from an in-memory zip
//! archive mirroring that tree:
//!
//! ```text
//! bundle/
//! ├── nlu_engine.json          # required, carries `model_version`
//! ├── intent_classifier.json   # required
//! └── slot_filler.json         # optional
//! ```
//!
//! - **[`bundle`]** -- the immutable [`ModelBundle`] and its loaders.
//! - **[`schema`]** -- serde models of the bundle files.
//! - **[`version`]** -- [`ModelVersion`] parsing and compatibility.
//! - **[`error`]** -- [`BundleError`] via [`thiserror`].

pub mod bundle;
pub mod error;
pub mod schema;
mod source;
pub mod version;

pub use bundle::{
    BundleOrigin, CLASSIFIER_FILE, MANIFEST_FILE, MAX_ENTRY_BYTES, ModelBundle, SLOT_FILLER_FILE,
};
pub use error::{BundleError, Result};
pub use schema::{
    DatasetMetadata, EngineManifest, EntityDefinition, IntentClassifierModel, IntentWeights,
    SlotCues, SlotFillerModel,
};
pub use version::ModelVersion;
