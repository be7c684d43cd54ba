//! Model schema versions.
//!
//! Versions are `MAJOR.MINOR.PATCH`.  Strict compatibility requires equality;
//! relaxed compatibility only requires the same major version.

use std::fmt;
use std::str::FromStr;

use crate::error::BundleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ModelVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether a bundle at `self` can be served by an engine built for
    /// `engine`.
    pub fn is_compatible_with(&self, engine: &ModelVersion, strict: bool) -> bool {
        if strict {
            self == engine
        } else {
            self.major == engine.major
        }
    }
}

impl FromStr for ModelVersion {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BundleError::invalid(format!("malformed model version `{s}`"));

        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u32, BundleError> {
            parts
                .next()
                .ok_or_else(invalid)?
                .parse::<u32>()
                .map_err(|_| invalid())
        };

        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
