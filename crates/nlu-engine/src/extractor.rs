//! Slot filling.
//!
//! For one intent, candidate mentions are collected from two sources:
//!
//! 1. the bundle [`Gazetteer`] for custom entities and gazetteer builtins,
//! 2. the [`BuiltinEntityResolver`] for grammar builtins the intent uses.
//!
//! Each mention is assigned to a slot typed by its entity.  When several
//! slots share the entity, cue words just before the mention pick one;
//! failing that the first slot by name is taken at a reduced confidence.
//! Overlapping candidates are then resolved greedily (longer span, then
//! higher confidence, then earlier start) and the survivors are returned in
//! input order.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use nlu_bundle::ModelBundle;
use nlu_ontology::{BuiltinEntityKind, EntityKind, Slot, SlotRange, SlotValue};

use crate::error::{NluError, Result};
use crate::gazetteer::Gazetteer;
use crate::resolver::{BuiltinEntityResolver, ResolveRequest};
use crate::tokenizer::{CharOffsets, Token, normalize, tokenize};

/// How many tokens before a mention are searched for cue words.
const CUE_WINDOW: usize = 2;

#[derive(Debug)]
struct SlotSpec {
    name: String,
    entity: EntityKind,
    /// Normalized cue words.
    cues: Vec<String>,
}

/// A mention assigned to a slot, before overlap resolution.
struct Candidate<'s> {
    spec: &'s SlotSpec,
    bytes: Range<usize>,
    chars: Range<usize>,
    value: SlotValue,
    alternatives: Vec<SlotValue>,
    confidence: f32,
}

/// Fills the slots of an intent from an utterance.
pub struct SlotExtractor {
    /// Intent -> slots sorted by name.
    intents: BTreeMap<String, Vec<SlotSpec>>,
    gazetteer: Gazetteer,
    resolver: Arc<dyn BuiltinEntityResolver>,
    max_alternatives: usize,
}

impl SlotExtractor {
    /// Build the extractor for every intent of `bundle`.
    ///
    /// Fails with [`NluError::InitFailure`] when a slot is mapped to an
    /// unknown builtin or to a custom entity the bundle does not declare.
    pub fn new(
        bundle: &ModelBundle,
        resolver: Arc<dyn BuiltinEntityResolver>,
        max_alternatives: usize,
    ) -> Result<Self> {
        let mut intents = BTreeMap::new();

        for intent in bundle.intents() {
            let mapping = bundle.slot_mapping(intent).into_iter().flatten();
            let mut specs = Vec::new();
            for (slot, identifier) in mapping {
                let entity = EntityKind::parse(identifier).map_err(|e| {
                    NluError::init(format!("slot `{slot}` of intent `{intent}`: {e}"))
                })?;

                let declared = bundle.entities().contains_key(identifier);
                match &entity {
                    EntityKind::Custom(_) if !declared => {
                        return Err(NluError::init(format!(
                            "slot `{slot}` of intent `{intent}` uses undeclared entity `{identifier}`"
                        )));
                    }
                    EntityKind::Builtin(kind) if kind.is_gazetteer() && !declared => {
                        tracing::warn!(
                            intent,
                            slot = %slot,
                            entity = %identifier,
                            "gazetteer entity has no values in the bundle; slot can never be filled"
                        );
                    }
                    _ => {}
                }

                let cues = bundle
                    .slot_filler()
                    .cues(intent, slot)
                    .iter()
                    .map(|c| normalize(c))
                    .filter(|c| !c.is_empty())
                    .collect();
                specs.push(SlotSpec {
                    name: slot.clone(),
                    entity,
                    cues,
                });
            }
            specs.sort_by(|a, b| a.name.cmp(&b.name));
            intents.insert(intent.to_string(), specs);
        }

        Ok(Self {
            intents,
            gazetteer: Gazetteer::from_bundle(bundle)?,
            resolver,
            max_alternatives,
        })
    }

    /// Extract the slots of `intent` from `utterance`.
    ///
    /// At most `min(alternatives, max_alternatives)` alternatives are
    /// computed per slot.  Returned slots do not overlap and are ordered by
    /// `range.start`.
    pub fn get_slots(&self, utterance: &str, intent: &str, alternatives: usize) -> Result<Vec<Slot>> {
        let specs = self
            .intents
            .get(intent)
            .ok_or_else(|| NluError::UnknownIntent {
                intent: intent.to_string(),
            })?;
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        let alternatives = alternatives.min(self.max_alternatives);
        let tokens = tokenize(utterance);
        let offsets = CharOffsets::new(utterance);
        let mut candidates = Vec::new();

        // -- Gazetteer mentions ----------------------------------------------
        for hit in self.gazetteer.find(&tokens) {
            let slots: Vec<&SlotSpec> = specs
                .iter()
                .filter(|s| s.entity.is_gazetteer() && s.entity.identifier() == hit.entity)
                .collect();
            let Some((spec, confidence)) = choose_slot(&slots, &tokens, hit.tokens.start, 1.0)
            else {
                continue;
            };
            let bytes = tokens[hit.tokens.start].bytes.start..tokens[hit.tokens.end - 1].bytes.end;
            candidates.push(Candidate {
                spec,
                chars: offsets.char_at(bytes.start)..offsets.char_at(bytes.end),
                bytes,
                value: spec.entity.gazetteer_value(hit.resolved)?,
                alternatives: Vec::new(),
                confidence,
            });
        }

        // -- Resolver mentions -----------------------------------------------
        let mut kinds: Vec<BuiltinEntityKind> = specs
            .iter()
            .filter_map(|s| match s.entity {
                EntityKind::Builtin(kind) if !kind.is_gazetteer() => Some(kind),
                _ => None,
            })
            .collect();
        kinds.sort();
        kinds.dedup();

        if !kinds.is_empty() {
            let request = ResolveRequest {
                text: utterance,
                kinds: &kinds,
                max_alternatives: alternatives,
            };
            for found in self.resolver.resolve(&request) {
                if !kinds.contains(&found.entity) {
                    continue;
                }
                let bytes = found.range;
                if bytes.start > bytes.end
                    || bytes.end > utterance.len()
                    || !utterance.is_char_boundary(bytes.start)
                    || !utterance.is_char_boundary(bytes.end)
                {
                    return Err(NluError::Internal(format!(
                        "resolver reported invalid range {bytes:?} for {} in a {}-byte input",
                        found.entity,
                        utterance.len()
                    )));
                }
                if bytes.is_empty() {
                    continue;
                }

                let entity = EntityKind::Builtin(found.entity);
                let value = entity.decode_value(&found.value)?;
                let alternatives = found
                    .alternatives
                    .iter()
                    .take(alternatives)
                    .map(|raw| entity.decode_value(raw))
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                let slots: Vec<&SlotSpec> = specs.iter().filter(|s| s.entity == entity).collect();
                let first_token = tokens.partition_point(|t| t.bytes.end <= bytes.start);
                let base = if found.confidence.is_finite() {
                    found.confidence.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let Some((spec, confidence)) = choose_slot(&slots, &tokens, first_token, base)
                else {
                    continue;
                };
                candidates.push(Candidate {
                    spec,
                    chars: offsets.char_at(bytes.start)..offsets.char_at(bytes.end),
                    bytes,
                    value,
                    alternatives,
                    confidence,
                });
            }
        }

        let kept = resolve_overlaps(candidates);
        let slots = kept
            .into_iter()
            .map(|c| Slot {
                raw_value: utterance[c.bytes].to_string(),
                value: c.value,
                alternatives: c.alternatives,
                entity: c.spec.entity.identifier().to_string(),
                slot_name: c.spec.name.clone(),
                range: SlotRange::new(c.chars.start, c.chars.end),
                confidence_score: c.confidence,
            })
            .collect::<Vec<_>>();

        check_ranges(&slots, offsets.char_len())?;
        tracing::debug!(intent, slots = slots.len(), "slots extracted");
        Ok(slots)
    }

    /// Whether `intent` is known to the extractor.
    #[cfg(test)]
    pub(crate) fn has_intent(&self, intent: &str) -> bool {
        self.intents.contains_key(intent)
    }

    /// Slot names of `intent`, sorted.
    #[cfg(test)]
    pub(crate) fn slot_names(&self, intent: &str) -> Option<Vec<&str>> {
        self.intents
            .get(intent)
            .map(|specs| specs.iter().map(|s| s.name.as_str()).collect())
    }
}

/// Pick the slot a mention starting at token `first` fills.
///
/// The slot whose cue sits closest before the mention wins.  Without cues
/// the first slot by name is taken and `base` is split across the
/// candidates.
fn choose_slot<'s>(
    slots: &[&'s SlotSpec],
    tokens: &[Token],
    first: usize,
    base: f32,
) -> Option<(&'s SlotSpec, f32)> {
    match slots {
        [] => None,
        [only] => Some((*only, base)),
        _ => {
            let window = &tokens[first.saturating_sub(CUE_WINDOW)..first.min(tokens.len())];
            let cued = slots
                .iter()
                .filter_map(|spec| {
                    window
                        .iter()
                        .rev()
                        .position(|t| spec.cues.iter().any(|c| *c == t.normalized))
                        .map(|distance| (distance, *spec))
                })
                .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
            match cued {
                Some((_, spec)) => Some((spec, base)),
                None => Some((slots[0], base / slots.len() as f32)),
            }
        }
    }
}

fn resolve_overlaps(mut candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    candidates.sort_by(|a, b| {
        b.chars
            .len()
            .cmp(&a.chars.len())
            .then(b.confidence.total_cmp(&a.confidence))
            .then(a.chars.start.cmp(&b.chars.start))
            .then(a.spec.name.cmp(&b.spec.name))
    });

    let mut kept: Vec<Candidate<'_>> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let free = kept
            .iter()
            .all(|k| k.chars.end <= candidate.chars.start || candidate.chars.end <= k.chars.start);
        if free {
            kept.push(candidate);
        }
    }
    kept.sort_by_key(|c| (c.chars.start, Reverse(c.chars.end)));
    kept
}

fn check_ranges(slots: &[Slot], char_len: usize) -> Result<()> {
    for slot in slots {
        if !slot.range.is_within(char_len) {
            return Err(NluError::Internal(format!(
                "slot `{}` range {}..{} exceeds input length {char_len}",
                slot.slot_name, slot.range.start, slot.range.end
            )));
        }
    }
    for pair in slots.windows(2) {
        if pair[0].range.start > pair[1].range.start || pair[0].range.overlaps(&pair[1].range) {
            return Err(NluError::Internal(format!(
                "slots `{}` and `{}` overlap",
                pair[0].slot_name, pair[1].slot_name
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resolver::ResolvedEntity;
    use crate::test_support::{bundle_from_json, bundle_with_cues};

    const MAPPINGS: &str = r#"{
        "weather": {"location": "builtin/city", "date": "builtin/datetime"},
        "book_flight": {"origin": "builtin/city", "destination": "builtin/city"},
        "order": {"dish": "cuisine", "count": "builtin/number"},
        "greet": {}
    }"#;

    const ENTITIES: &str = r#"{
        "builtin/city": {"utterances": {
            "paris": "Paris",
            "new york": "New York",
            "york": "York",
            "zürich": "Zürich"
        }},
        "cuisine": {"utterances": {"pizza": "pizza", "sushi": "sushi"}}
    }"#;

    const CLASSIFIER: &str = r#"{"intents": {
        "weather": {"weights": {"weather": 1.0}},
        "book_flight": {"weights": {"fly": 1.0}},
        "order": {"weights": {"order": 1.0}},
        "greet": {"weights": {"hello": 1.0}}
    }}"#;

    const CUES: &str = r#"{"book_flight": {
        "origin": {"cues": ["from"]},
        "destination": {"cues": ["to"]}
    }}"#;

    /// Returns the same entities for every request.
    struct FixedResolver(Vec<ResolvedEntity>);

    impl BuiltinEntityResolver for FixedResolver {
        fn resolve(&self, _request: &ResolveRequest<'_>) -> Vec<ResolvedEntity> {
            self.0.clone()
        }
    }

    fn extractor_with(resolved: Vec<ResolvedEntity>, max_alternatives: usize) -> SlotExtractor {
        let bundle = bundle_with_cues(MAPPINGS, ENTITIES, CLASSIFIER, CUES);
        SlotExtractor::new(
            &bundle,
            Arc::new(FixedResolver(resolved)),
            max_alternatives,
        )
        .unwrap()
    }

    fn extractor() -> SlotExtractor {
        extractor_with(Vec::new(), 5)
    }

    fn number(range: Range<usize>, value: f64, alternatives: usize) -> ResolvedEntity {
        ResolvedEntity {
            entity: BuiltinEntityKind::Number,
            range,
            value: json!({"kind": "Number", "value": value}),
            alternatives: (0..alternatives)
                .map(|i| json!({"kind": "Number", "value": value + 1.0 + i as f64}))
                .collect(),
            confidence: 1.0,
        }
    }

    #[test]
    fn unknown_intent_is_an_error() {
        let err = extractor().get_slots("hello", "dance", 0).unwrap_err();
        assert!(matches!(err, NluError::UnknownIntent { ref intent } if intent == "dance"));
    }

    #[test]
    fn intent_without_slots_yields_nothing() {
        assert!(extractor().get_slots("hello paris", "greet", 0).unwrap().is_empty());
    }

    #[test]
    fn gazetteer_slot_uses_char_ranges() {
        let text = "météo à Zürich";
        let slots = extractor().get_slots(text, "weather", 0).unwrap();
        assert_eq!(slots.len(), 1);
        let slot = &slots[0];
        assert_eq!(slot.slot_name, "location");
        assert_eq!(slot.entity, "builtin/city");
        assert_eq!(slot.value, SlotValue::City("Zürich".into()));
        assert_eq!(slot.raw_value, "Zürich");
        assert_eq!(slot.range, SlotRange::new(8, 14));
        let chars: String = text.chars().skip(8).take(6).collect();
        assert_eq!(chars, slot.raw_value);
    }

    #[test]
    fn cues_pick_between_slots_of_one_entity() {
        let slots = extractor()
            .get_slots("fly from Paris to New York", "book_flight", 0)
            .unwrap();
        let pairs: Vec<_> = slots
            .iter()
            .map(|s| (s.slot_name.as_str(), s.raw_value.as_str(), s.confidence_score))
            .collect();
        assert_eq!(
            pairs,
            [("origin", "Paris", 1.0), ("destination", "New York", 1.0)]
        );
    }

    #[test]
    fn without_cues_first_slot_by_name_at_split_confidence() {
        let slots = extractor().get_slots("paris", "book_flight", 0).unwrap();
        assert_eq!(slots[0].slot_name, "destination");
        assert_eq!(slots[0].confidence_score, 0.5);
    }

    #[test]
    fn longest_mention_wins_overlap() {
        let slots = extractor().get_slots("weather in new york", "weather", 0).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].value, SlotValue::City("New York".into()));
        assert_eq!(slots[0].range, SlotRange::new(11, 19));
    }

    #[test]
    fn slots_are_ordered_and_disjoint() {
        let text = "order 2 pizza and 3 sushi";
        let extractor = extractor_with(vec![number(18..19, 3.0, 0), number(6..7, 2.0, 0)], 5);
        let slots = extractor.get_slots(text, "order", 0).unwrap();
        let names: Vec<_> = slots.iter().map(|s| s.slot_name.as_str()).collect();
        assert_eq!(names, ["count", "dish", "count", "dish"]);
        for pair in slots.windows(2) {
            assert!(pair[0].range.end <= pair[1].range.start);
        }
    }

    #[test]
    fn alternatives_are_bounded_by_request_and_config() {
        let text = "order 2 pizza";
        let extractor = extractor_with(vec![number(6..7, 2.0, 3)], 2);

        let none = extractor.get_slots(text, "order", 0).unwrap();
        let count = none.iter().find(|s| s.slot_name == "count").unwrap();
        assert!(count.alternatives.is_empty());

        let one = extractor.get_slots(text, "order", 1).unwrap();
        let count = one.iter().find(|s| s.slot_name == "count").unwrap();
        assert_eq!(count.alternatives, [SlotValue::Number(3.0)]);

        let capped = extractor.get_slots(text, "order", 10).unwrap();
        let count = capped.iter().find(|s| s.slot_name == "count").unwrap();
        assert_eq!(count.alternatives.len(), 2);
    }

    #[test]
    fn unknown_value_kind_is_fatal_for_the_call() {
        let bogus = ResolvedEntity {
            entity: BuiltinEntityKind::Number,
            range: 6..7,
            value: json!({"kind": "Mood", "value": "happy"}),
            alternatives: Vec::new(),
            confidence: 1.0,
        };
        let extractor = extractor_with(vec![bogus], 5);
        let err = extractor.get_slots("order 2 pizza", "order", 0).unwrap_err();
        assert!(matches!(err, NluError::UnknownSlotValueType { ref kind } if kind == "Mood"));

        // The Number mention is ignored for intents without a number slot.
        assert_eq!(extractor.get_slots("paris", "weather", 0).unwrap().len(), 1);
    }

    #[test]
    fn out_of_bounds_resolver_range_is_internal() {
        let extractor = extractor_with(vec![number(6..40, 2.0, 0)], 5);
        let err = extractor.get_slots("order 2", "order", 0).unwrap_err();
        assert!(matches!(err, NluError::Internal(_)));
    }

    #[test]
    fn unrequested_resolver_kinds_are_ignored() {
        let stray = ResolvedEntity {
            entity: BuiltinEntityKind::Temperature,
            range: 0..5,
            value: json!({"kind": "Temperature", "value": 20.0, "unit": "degree"}),
            alternatives: Vec::new(),
            confidence: 1.0,
        };
        let extractor = extractor_with(vec![stray], 5);
        assert!(extractor.get_slots("order", "order", 0).unwrap().is_empty());
    }

    #[test]
    fn undeclared_custom_entity_fails_construction() {
        let bundle = bundle_from_json(
            r#"{"order": {"dish": "dessert"}}"#,
            "{}",
            r#"{"intents": {"order": {"weights": {"order": 1.0}}}}"#,
        );
        let err = SlotExtractor::new(&bundle, Arc::new(FixedResolver(Vec::new())), 5)
            .err()
            .unwrap();
        assert!(matches!(err, NluError::InitFailure { .. }));
    }

    #[test]
    fn unknown_builtin_fails_construction() {
        let bundle = bundle_from_json(
            r#"{"order": {"when": "builtin/moonPhase"}}"#,
            "{}",
            r#"{"intents": {"order": {"weights": {"order": 1.0}}}}"#,
        );
        let result = SlotExtractor::new(&bundle, Arc::new(FixedResolver(Vec::new())), 5);
        assert!(matches!(result, Err(NluError::InitFailure { .. })));
    }

    #[test]
    fn slot_names_are_sorted() {
        let e = extractor();
        assert_eq!(e.slot_names("book_flight"), Some(vec!["destination", "origin"]));
        assert!(e.has_intent("greet"));
        assert_eq!(e.slot_names("dance"), None);
    }
}
