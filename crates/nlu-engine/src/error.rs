//! Engine error types.
//!
//! Every public API in this crate returns [`NluError`].  Errors from the
//! bundle and ontology crates are folded into the same taxonomy, keeping
//! their category and message.
//!
//! Loading and construction errors are terminal for the engine being built.
//! Per-call errors ([`NluError::UnknownIntent`],
//! [`NluError::UnknownSlotValueType`]) leave the engine usable.

use nlu_bundle::BundleError;
use nlu_ontology::OntologyError;

/// Unified error type for the NLU engine.
#[derive(Debug, thiserror::Error)]
pub enum NluError {
    // -- Bundle errors -------------------------------------------------------
    /// Model files are missing or malformed.
    #[error("invalid bundle: {reason}")]
    InvalidBundle { reason: String },

    /// The bundle archive bytes could not be decoded.
    #[error("failed to decode bundle archive: {reason}")]
    DecodeFailure { reason: String },

    /// An I/O error occurred while reading a bundle directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // -- Construction errors -------------------------------------------------
    /// The engine could not be built from an otherwise valid bundle
    /// (version mismatch, unresolvable entity, ...).
    #[error("engine initialization failed: {reason}")]
    InitFailure { reason: String },

    /// The engine configuration could not be read or parsed.
    #[error("invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },

    // -- Inference errors ----------------------------------------------------
    /// Slot extraction was requested for an intent absent from the bundle.
    #[error("unknown intent: {intent}")]
    UnknownIntent { intent: String },

    /// A resolved value carried a kind outside the slot value set.  This is
    /// a version-skew bug between the engine and its resolver.
    #[error("unknown slot value type: {kind}")]
    UnknownSlotValueType { kind: String },

    // -- Lifecycle errors ----------------------------------------------------
    /// The engine has been closed and serves no further calls.
    #[error("engine is closed")]
    Closed,

    /// `close()` was called on an engine that is already closed.
    #[error("engine is already closed")]
    AlreadyClosed,

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    // -- Generic -------------------------------------------------------------
    /// Catch-all for broken internal invariants.
    #[error("internal engine error: {0}")]
    Internal(String),
}

impl NluError {
    pub(crate) fn init(reason: impl Into<String>) -> Self {
        Self::InitFailure {
            reason: reason.into(),
        }
    }
}

impl From<BundleError> for NluError {
    fn from(err: BundleError) -> Self {
        match err {
            BundleError::InvalidBundle { reason } => Self::InvalidBundle { reason },
            BundleError::DecodeFailure { reason } => Self::DecodeFailure { reason },
            BundleError::Io(e) => Self::Io(e),
        }
    }
}

impl From<OntologyError> for NluError {
    fn from(err: OntologyError) -> Self {
        match err {
            OntologyError::UnknownSlotValueType { kind } => Self::UnknownSlotValueType { kind },
            OntologyError::Json(e) => Self::Json(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, NluError>;
