//! Canonical JSON projection of inference results.
//!
//! The encoding is structurally isomorphic to the typed results: the same
//! field names (camelCase) and the same semantics.  Decoding a document
//! produced here and encoding it again yields the same bytes.
//!
//! ```rust
//! # use nlu_ontology::{json, IntentResult};
//! let intents = vec![IntentResult::new("weather", 0.75), IntentResult::none(0.25)];
//! let encoded = json::encode_intents(&intents).unwrap();
//! assert_eq!(json::decode_intents(&encoded).unwrap(), intents);
//! ```

use serde_json::Value;

use crate::error::Result;
use crate::result::{IntentResult, ParseResult, Slot};
use crate::value::SlotValue;

pub fn encode_intents(intents: &[IntentResult]) -> Result<String> {
    Ok(serde_json::to_string(intents)?)
}

pub fn decode_intents(json: &str) -> Result<Vec<IntentResult>> {
    Ok(serde_json::from_str(json)?)
}

pub fn encode_slots(slots: &[Slot]) -> Result<String> {
    Ok(serde_json::to_string(slots)?)
}

/// Decode a slot array.
///
/// Slot values are checked through [`SlotValue::decode`] first so that an
/// unknown `kind` is reported as
/// [`OntologyError::UnknownSlotValueType`](crate::OntologyError::UnknownSlotValueType).
pub fn decode_slots(json: &str) -> Result<Vec<Slot>> {
    let raw: Vec<Value> = serde_json::from_str(json)?;
    raw.into_iter().map(decode_slot).collect()
}

pub fn encode_parse(result: &ParseResult) -> Result<String> {
    Ok(serde_json::to_string(result)?)
}

pub fn decode_parse(json: &str) -> Result<ParseResult> {
    let raw: Value = serde_json::from_str(json)?;
    if let Some(Value::Array(slots)) = raw.get("slots") {
        for slot in slots {
            check_slot_values(slot)?;
        }
    }
    Ok(serde_json::from_value(raw)?)
}

fn decode_slot(raw: Value) -> Result<Slot> {
    check_slot_values(&raw)?;
    Ok(serde_json::from_value(raw)?)
}

fn check_slot_values(raw: &Value) -> Result<()> {
    if let Some(value) = raw.get("value") {
        SlotValue::decode(value)?;
    }
    if let Some(Value::Array(alternatives)) = raw.get("alternatives") {
        for alternative in alternatives {
            SlotValue::decode(alternative)?;
        }
    }
    Ok(())
}
