//! The lifecycle-managed engine handle.
//!
//! An [`NluEngine`] is built once from a [`ModelBundle`] and then serves
//! inference calls from any number of threads.  Calls hold a shared read
//! guard on the engine state for their whole duration; [`NluEngine::close`]
//! takes the exclusive write guard, so it waits for in-flight calls to drain
//! and every call that starts afterwards fails with [`NluError::Closed`].
//!
//! # Example
//!
//! ```rust,no_run
//! # use nlu_engine::{EngineConfig, NluEngine};
//! let config = EngineConfig::from_file("engine.toml")?;
//! let engine = NluEngine::create_from_directory_with_config("models/weather", config)?;
//! let parsed = engine.parse("will it rain in Paris tomorrow", 0)?;
//! println!("{}", serde_json::to_string_pretty(&parsed)?);
//! engine.close()?;
//! # Ok::<(), nlu_engine::NluError>(())
//! ```

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use nlu_bundle::{ModelBundle, ModelVersion};
use nlu_ontology::{IntentResult, ParseResult, Slot, json};
use uuid::Uuid;

use crate::classifier::IntentClassifier;
use crate::config::EngineConfig;
use crate::error::{NluError, Result};
use crate::extractor::SlotExtractor;
use crate::resolver::{BuiltinEntityResolver, RuleResolver};

/// Bundle schema version this engine understands.
pub const MODEL_VERSION: &str = "1.0.0";

/// Returns [`MODEL_VERSION`].
pub fn model_version() -> &'static str {
    MODEL_VERSION
}

/// Everything compiled from the bundle.  Immutable once built.
struct EngineCore {
    bundle_version: String,
    language_code: String,
    classifier: IntentClassifier,
    extractor: SlotExtractor,
}

enum EngineState {
    Ready(Box<EngineCore>),
    Closed,
}

/// Intent classification and slot filling over one model bundle.
///
/// `NluEngine` is `Send + Sync`; share it behind an [`Arc`] or borrow it
/// across scoped threads.
pub struct NluEngine {
    id: Uuid,
    state: RwLock<EngineState>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl NluEngine {
    /// Build an engine with the default configuration.
    pub fn create(bundle: &ModelBundle) -> Result<Self> {
        Self::create_with_config(bundle, EngineConfig::default())
    }

    /// Build an engine resolving builtin entities with [`RuleResolver`].
    pub fn create_with_config(bundle: &ModelBundle, config: EngineConfig) -> Result<Self> {
        let resolver = match config.reference_time {
            Some(reference) => RuleResolver::with_reference_time(reference),
            None => RuleResolver::new(),
        };
        Self::create_with_resolver(bundle, config, Arc::new(resolver))
    }

    /// Build an engine around a caller-supplied builtin entity resolver.
    ///
    /// Fails with [`NluError::InitFailure`] if the bundle version is not
    /// compatible with [`MODEL_VERSION`], if a slot references an unknown
    /// entity, or if the gazetteer cannot be compiled.
    pub fn create_with_resolver(
        bundle: &ModelBundle,
        config: EngineConfig,
        resolver: Arc<dyn BuiltinEntityResolver>,
    ) -> Result<Self> {
        check_version(bundle.model_version(), config.strict_model_version)?;

        let core = EngineCore {
            bundle_version: bundle.model_version().to_string(),
            language_code: bundle.language_code().to_string(),
            classifier: IntentClassifier::from_bundle(bundle),
            extractor: SlotExtractor::new(bundle, resolver, config.max_slot_alternatives)?,
        };

        let id = Uuid::now_v7();
        tracing::info!(
            engine_id = %id,
            model_version = %core.bundle_version,
            language = %core.language_code,
            intents = bundle.intent_count(),
            "engine created"
        );

        Ok(Self {
            id,
            state: RwLock::new(EngineState::Ready(Box::new(core))),
        })
    }

    /// Load a bundle directory and build an engine from it.
    pub fn create_from_directory(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_from_directory_with_config(path, EngineConfig::default())
    }

    pub fn create_from_directory_with_config(
        path: impl AsRef<Path>,
        config: EngineConfig,
    ) -> Result<Self> {
        let bundle = ModelBundle::load_from_directory(path)?;
        Self::create_with_config(&bundle, config)
    }

    /// Load a zipped bundle from memory and build an engine from it.
    pub fn create_from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::create_from_bytes_with_config(bytes, EngineConfig::default())
    }

    pub fn create_from_bytes_with_config(bytes: &[u8], config: EngineConfig) -> Result<Self> {
        let bundle = ModelBundle::load_from_bytes(bytes)?;
        Self::create_with_config(&bundle, config)
    }
}

fn check_version(bundle_version: &str, strict: bool) -> Result<()> {
    let engine: ModelVersion = MODEL_VERSION
        .parse()
        .map_err(|e| NluError::Internal(format!("engine model version: {e}")))?;
    let bundle: ModelVersion = bundle_version
        .parse()
        .map_err(|e| NluError::init(format!("bundle model version: {e}")))?;

    if !bundle.is_compatible_with(&engine, strict) {
        return Err(NluError::init(format!(
            "bundle model version {bundle} is not compatible with engine model version {engine}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl NluEngine {
    /// Instance id, as used in log fields.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Release the compiled model.
    ///
    /// Waits for in-flight calls to finish.  Fails with
    /// [`NluError::AlreadyClosed`] on the second and later calls.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, EngineState::Closed) {
            EngineState::Ready(core) => {
                drop(core);
                tracing::info!(engine_id = %self.id, "engine closed");
                Ok(())
            }
            EngineState::Closed => {
                tracing::warn!(engine_id = %self.id, "close called on a closed engine");
                Err(NluError::AlreadyClosed)
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            *self.state.read().unwrap_or_else(PoisonError::into_inner),
            EngineState::Closed
        )
    }

    /// Run `f` against the live core, or fail with [`NluError::Closed`].
    ///
    /// A poisoned lock is recovered: calls never mutate the core, so a
    /// panic in one of them cannot leave it half-updated.
    fn with_core<T>(&self, op: &'static str, f: impl FnOnce(&EngineCore) -> Result<T>) -> Result<T> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            EngineState::Ready(core) => f(core),
            EngineState::Closed => {
                tracing::warn!(engine_id = %self.id, op, "call rejected: engine is closed");
                Err(NluError::Closed)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Introspection
// ---------------------------------------------------------------------------

impl NluEngine {
    /// Model version of the bundle this engine serves.
    pub fn model_version(&self) -> Result<String> {
        self.with_core("model_version", |core| Ok(core.bundle_version.clone()))
    }

    pub fn language_code(&self) -> Result<String> {
        self.with_core("language_code", |core| Ok(core.language_code.clone()))
    }

    /// Intent names, sorted.
    pub fn intents(&self) -> Result<Vec<String>> {
        self.with_core("intents", |core| {
            Ok(core.classifier.intent_names().map(str::to_string).collect())
        })
    }
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

impl NluEngine {
    /// Rank every intent for `utterance`, most confident first.
    pub fn get_intents(&self, utterance: &str) -> Result<Vec<IntentResult>> {
        self.with_core("get_intents", |core| {
            let intents = core.classifier.get_intents(utterance);
            tracing::debug!(
                engine_id = %self.id,
                top = ?intents.first().and_then(|i| i.intent_name.as_deref()),
                "intents classified"
            );
            Ok(intents)
        })
    }

    pub fn get_intents_json(&self, utterance: &str) -> Result<String> {
        Ok(json::encode_intents(&self.get_intents(utterance)?)?)
    }

    /// Extract the slots of `intent`, without alternatives.
    pub fn get_slots(&self, utterance: &str, intent: &str) -> Result<Vec<Slot>> {
        self.get_slots_with_alternatives(utterance, intent, 0)
    }

    /// Extract the slots of `intent` with up to `alternatives` other
    /// readings per slot (further capped by the engine configuration).
    pub fn get_slots_with_alternatives(
        &self,
        utterance: &str,
        intent: &str,
        alternatives: usize,
    ) -> Result<Vec<Slot>> {
        self.with_core("get_slots", |core| {
            core.extractor
                .get_slots(utterance, intent, alternatives)
                .inspect_err(|e| {
                    tracing::warn!(engine_id = %self.id, intent, error = %e, "slot extraction failed");
                })
        })
    }

    pub fn get_slots_json(&self, utterance: &str, intent: &str) -> Result<String> {
        self.get_slots_with_alternatives_json(utterance, intent, 0)
    }

    pub fn get_slots_with_alternatives_json(
        &self,
        utterance: &str,
        intent: &str,
        alternatives: usize,
    ) -> Result<String> {
        let slots = self.get_slots_with_alternatives(utterance, intent, alternatives)?;
        Ok(json::encode_slots(&slots)?)
    }

    /// Classify `utterance` and fill the slots of the top intent.
    ///
    /// When the top entry is the "no intent" entry the slot list is empty.
    pub fn parse(&self, utterance: &str, alternatives: usize) -> Result<ParseResult> {
        self.with_core("parse", |core| {
            let intent = core
                .classifier
                .get_intents(utterance)
                .into_iter()
                .next()
                .unwrap_or_else(|| IntentResult::none(1.0));
            let slots = match &intent.intent_name {
                Some(name) => core.extractor.get_slots(utterance, name, alternatives)?,
                None => Vec::new(),
            };
            tracing::debug!(
                engine_id = %self.id,
                intent = ?intent.intent_name,
                slots = slots.len(),
                "utterance parsed"
            );
            Ok(ParseResult {
                input: utterance.to_string(),
                intent,
                slots,
            })
        })
    }

    pub fn parse_json(&self, utterance: &str, alternatives: usize) -> Result<String> {
        Ok(json::encode_parse(&self.parse(utterance, alternatives)?)?)
    }
}

impl std::fmt::Debug for NluEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NluEngine")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bundle_from_json;

    fn bundle() -> ModelBundle {
        bundle_from_json(
            r#"{"weather": {"location": "builtin/city"}, "greet": {}}"#,
            r#"{"builtin/city": {"utterances": {"paris": "Paris"}}}"#,
            r#"{"none_bias": 0.5, "intents": {
                "weather": {"weights": {"weather": 3.0, "rain": 2.0}},
                "greet": {"weights": {"hello": 3.0}}
            }}"#,
        )
    }

    fn engine() -> NluEngine {
        NluEngine::create(&bundle()).unwrap()
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NluEngine>();
    }

    #[test]
    fn static_model_version() {
        assert_eq!(model_version(), "1.0.0");
        assert_eq!(engine().model_version().unwrap(), MODEL_VERSION);
    }

    #[test]
    fn introspection() {
        let engine = engine();
        assert_eq!(engine.intents().unwrap(), ["greet", "weather"]);
        assert_eq!(engine.language_code().unwrap(), "en");
        assert!(!engine.is_closed());
    }

    #[test]
    fn parse_fills_top_intent_slots() {
        let parsed = engine().parse("weather in Paris", 0).unwrap();
        assert_eq!(parsed.input, "weather in Paris");
        assert_eq!(parsed.intent.intent_name.as_deref(), Some("weather"));
        assert_eq!(parsed.slots.len(), 1);
        assert_eq!(parsed.slots[0].raw_value, "Paris");
    }

    #[test]
    fn parse_without_intent_has_no_slots() {
        let parsed = engine().parse("Paris", 0).unwrap();
        assert!(parsed.intent.is_none_intent());
        assert!(parsed.slots.is_empty());
    }

    #[test]
    fn close_then_calls_fail() {
        let engine = engine();
        engine.close().unwrap();
        assert!(engine.is_closed());

        assert!(matches!(engine.get_intents("hello"), Err(NluError::Closed)));
        assert!(matches!(engine.get_slots("hello", "greet"), Err(NluError::Closed)));
        assert!(matches!(engine.parse_json("hello", 0), Err(NluError::Closed)));
        assert!(matches!(engine.intents(), Err(NluError::Closed)));
    }

    #[test]
    fn double_close_is_an_error() {
        let engine = engine();
        engine.close().unwrap();
        assert!(matches!(engine.close(), Err(NluError::AlreadyClosed)));
        assert!(matches!(engine.close(), Err(NluError::AlreadyClosed)));
    }

    #[test]
    fn per_call_errors_leave_engine_usable() {
        let engine = engine();
        assert!(matches!(
            engine.get_slots("hello", "dance"),
            Err(NluError::UnknownIntent { .. })
        ));
        assert_eq!(engine.get_intents("hello").unwrap()[0].intent_name.as_deref(), Some("greet"));
    }

    #[test]
    fn version_check() {
        assert!(check_version("1.0.0", true).is_ok());
        assert!(matches!(check_version("1.2.0", true), Err(NluError::InitFailure { .. })));
        assert!(check_version("1.2.0", false).is_ok());
        assert!(matches!(check_version("2.0.0", false), Err(NluError::InitFailure { .. })));
        assert!(matches!(check_version("one", false), Err(NluError::InitFailure { .. })));
    }

    #[test]
    fn json_matches_typed_results() {
        let engine = engine();
        let typed = engine.get_intents("hello").unwrap();
        let decoded = json::decode_intents(&engine.get_intents_json("hello").unwrap()).unwrap();
        assert_eq!(typed, decoded);

        let typed = engine.get_slots("weather in Paris", "weather").unwrap();
        let decoded =
            json::decode_slots(&engine.get_slots_json("weather in Paris", "weather").unwrap())
                .unwrap();
        assert_eq!(typed, decoded);
    }

    #[test]
    fn concurrent_calls_race_close() {
        let engine = engine();
        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        for _ in 0..200 {
                            match engine.parse("will it rain in paris", 0) {
                                Ok(parsed) => assert_eq!(
                                    parsed.intent.intent_name.as_deref(),
                                    Some("weather")
                                ),
                                Err(NluError::Closed) => {}
                                Err(other) => panic!("unexpected error {other:?}"),
                            }
                        }
                    })
                })
                .collect();
            scope.spawn(|| engine.close().unwrap());
            for worker in workers {
                worker.join().unwrap();
            }
        });
        assert!(engine.is_closed());
    }
}
