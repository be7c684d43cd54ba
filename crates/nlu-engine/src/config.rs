//! Engine configuration.
//!
//! [`EngineConfig`] tunes engine construction and inference.  Defaults are
//! provided via the [`Default`] implementation, a builder-style API allows
//! callers to customise individual fields fluently, and the whole struct can
//! be read from TOML:
//!
//! ```toml
//! max_slot_alternatives = 3
//! strict_model_version = false
//! reference_time = "2026-10-16T09:30:00+02:00"
//! ```

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{NluError, Result};

/// Tuning knobs for an [`NluEngine`](crate::NluEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on alternatives computed per slot, whatever the caller
    /// asks for.
    ///
    /// Default: **5**.
    pub max_slot_alternatives: usize,

    /// Require the bundle's model version to equal [`crate::MODEL_VERSION`].
    /// When disabled only the major version has to match.
    ///
    /// Default: **true**.
    pub strict_model_version: bool,

    /// Instant relative expressions ("tomorrow", "at 5 pm") are resolved
    /// against.  `None` means the local clock at call time.
    ///
    /// Default: **None**.
    pub reference_time: Option<DateTime<FixedOffset>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_slot_alternatives: 5,
            strict_model_version: true,
            reference_time: None,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_slot_alternatives(mut self, max: usize) -> Self {
        self.max_slot_alternatives = max;
        self
    }

    pub fn with_strict_model_version(mut self, strict: bool) -> Self {
        self.strict_model_version = strict;
        self
    }

    /// Pin the reference instant, making time resolution deterministic.
    pub fn with_reference_time(mut self, reference: DateTime<FixedOffset>) -> Self {
        self.reference_time = Some(reference);
        self
    }

    /// Parse a configuration from TOML.  Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| NluError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| NluError::InvalidConfig {
            reason: format!("{}: {e}", path.display()),
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), ?config, "engine configuration loaded");
        Ok(config)
    }
}
