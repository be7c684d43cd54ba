//! Typed result model for the NLU engine.
//!
//! This crate defines everything that crosses the engine's public boundary:
//!
//! - **[`value`]** -- the closed [`SlotValue`] union together with its
//!   [`Grain`] and [`Precision`] enums and the tagged JSON codec.
//! - **[`entity`]** -- entity identifiers, split into custom (bundle
//!   defined) and builtin kinds.
//! - **[`result`]** -- [`IntentResult`], [`Slot`] and [`ParseResult`].
//! - **[`json`]** -- the canonical camelCase JSON projection of results.
//! - **[`error`]** -- [`OntologyError`] via [`thiserror`].

pub mod entity;
pub mod error;
pub mod json;
pub mod result;
pub mod value;

pub use entity::{BUILTIN_PREFIX, BuiltinEntityKind, EntityKind};
pub use error::{OntologyError, Result};
pub use result::{IntentResult, ParseResult, Slot, SlotRange};
pub use value::{
    AmountOfMoneyValue, DurationValue, Grain, InstantTimeValue, Precision, SlotValue,
    SlotValueKind, TemperatureValue, TimeIntervalValue,
};
