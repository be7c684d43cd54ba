//! Bundle error types.
//!
//! Loading surfaces failures through [`BundleError`].  The split between
//! [`BundleError::InvalidBundle`] and [`BundleError::DecodeFailure`] follows
//! where the problem lies: in the model content, or in the archive bytes
//! carrying it.

/// Unified error type for bundle loading.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// A required model file is missing, or a file is malformed.
    #[error("invalid bundle: {reason}")]
    InvalidBundle { reason: String },

    /// The archive buffer is empty, corrupt, or an entry cannot be read.
    #[error("failed to decode bundle archive: {reason}")]
    DecodeFailure { reason: String },

    /// An I/O error occurred while reading a bundle directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BundleError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidBundle {
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::DecodeFailure {
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the bundle crate.
pub type Result<T> = std::result::Result<T, BundleError>;
