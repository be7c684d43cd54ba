//! Inference results.
//!
//! Field names serialize in camelCase so the structs double as the canonical
//! JSON projection (see [`crate::json`]).

use serde::{Deserialize, Serialize};

use crate::value::SlotValue;

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// One entry of a ranked intent classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResult {
    /// The intent name, or `None` for the "no intent matched" entry.
    pub intent_name: Option<String>,
    /// Probability mass assigned to this entry, in `[0, 1]`.
    pub confidence_score: f32,
}

impl IntentResult {
    pub fn new(intent_name: impl Into<String>, confidence_score: f32) -> Self {
        Self {
            intent_name: Some(intent_name.into()),
            confidence_score,
        }
    }

    /// The "no intent matched" entry.
    pub fn none(confidence_score: f32) -> Self {
        Self {
            intent_name: None,
            confidence_score,
        }
    }

    pub fn is_none_intent(&self) -> bool {
        self.intent_name.is_none()
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Half-open range into the input, counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRange {
    pub start: usize,
    pub end: usize,
}

impl SlotRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether the two ranges share at least one position.
    pub fn overlaps(&self, other: &SlotRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `start <= end <= len`.
    pub fn is_within(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }
}

/// A filled slot.
///
/// Field order follows the JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// The verbatim substring of the input.
    pub raw_value: String,
    pub value: SlotValue,
    /// Other plausible readings of `raw_value`, most plausible first.
    #[serde(default)]
    pub alternatives: Vec<SlotValue>,
    /// Entity identifier the slot is typed by.
    pub entity: String,
    pub slot_name: String,
    pub range: SlotRange,
    pub confidence_score: f32,
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

/// Result of classifying an utterance and filling the top intent's slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub input: String,
    pub intent: IntentResult,
    pub slots: Vec<Slot>,
}
