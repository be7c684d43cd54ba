//! Intent classification and slot filling engine.
//!
//! [`NluEngine`] is built once from a [`ModelBundle`](nlu_bundle::ModelBundle)
//! and then answers inference calls concurrently:
//!
//! - **[`classifier`]** -- linear intent scorer with a "no intent" entry.
//! - **[`extractor`]** -- slot filling from bundle gazetteers and builtin
//!   entity resolution, with overlap resolution and cue-based slot choice.
//! - **[`gazetteer`]** -- token-aligned surface form matching built on
//!   [`aho_corasick`].
//! - **[`resolver`]** -- the pluggable [`BuiltinEntityResolver`] trait and the
//!   default [`RuleResolver`].
//! - **[`engine`]** -- the lifecycle-managed [`NluEngine`] handle.
//! - **[`config`]** -- [`EngineConfig`], loadable from TOML.
//! - **[`error`]** -- unified [`NluError`] via [`thiserror`].
//!
//! # Example
//!
//! ```rust,no_run
//! # use nlu_engine::NluEngine;
//! let engine = NluEngine::create_from_directory("models/weather")?;
//! let intents = engine.get_intents("what's the weather in Paris tomorrow")?;
//! if let Some(name) = &intents[0].intent_name {
//!     for slot in engine.get_slots("what's the weather in Paris tomorrow", name)? {
//!         println!("{} = {:?}", slot.slot_name, slot.value);
//!     }
//! }
//! engine.close()?;
//! # Ok::<(), nlu_engine::NluError>(())
//! ```

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod gazetteer;
pub mod resolver;
mod tokenizer;

#[cfg(test)]
mod test_support;

pub use classifier::IntentClassifier;
pub use config::EngineConfig;
pub use engine::{MODEL_VERSION, NluEngine, model_version};
pub use error::{NluError, Result};
pub use extractor::SlotExtractor;
pub use resolver::{BuiltinEntityResolver, ResolveRequest, ResolvedEntity, RuleResolver};

pub use nlu_bundle::{BundleOrigin, ModelBundle};
pub use nlu_ontology::json;
pub use nlu_ontology::{
    AmountOfMoneyValue, BuiltinEntityKind, DurationValue, EntityKind, Grain, InstantTimeValue,
    IntentResult, ParseResult, Precision, Slot, SlotRange, SlotValue, SlotValueKind,
    TemperatureValue, TimeIntervalValue,
};
