//! Ontology error types.
//!
//! Decoding slot values and entity identifiers surfaces failures through
//! [`OntologyError`].

/// Unified error type for the result model.
#[derive(Debug, thiserror::Error)]
pub enum OntologyError {
    // -- Slot value errors ---------------------------------------------------
    /// A tagged slot value carried a `kind` outside the closed variant set.
    #[error("unknown slot value type: {kind}")]
    UnknownSlotValueType { kind: String },

    /// A tagged slot value had a known `kind` but an invalid payload.
    #[error("malformed {kind} slot value: {reason}")]
    MalformedValue { kind: String, reason: String },

    /// A decoded value kind cannot be produced by the entity it was
    /// resolved for (e.g. a `Number` reported for `builtin/city`).
    #[error("entity `{entity}` cannot produce a {kind} value")]
    ValueKindMismatch { entity: String, kind: String },

    // -- Entity errors -------------------------------------------------------
    /// An identifier used the builtin prefix but names no known builtin.
    #[error("unknown builtin entity: {identifier}")]
    UnknownBuiltinEntity { identifier: String },

    /// A gazetteer value was requested for an entity resolved by grammar.
    #[error("entity `{identifier}` is not backed by a gazetteer")]
    NotAGazetteerEntity { identifier: String },

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the ontology crate.
pub type Result<T> = std::result::Result<T, OntologyError>;
