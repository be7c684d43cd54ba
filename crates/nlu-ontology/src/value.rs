//! Typed slot values.
//!
//! [`SlotValue`] is a closed union: every value a slot can carry is one of its
//! variants, and decoding rejects anything else with
//! [`OntologyError::UnknownSlotValueType`].  On the wire a value is an object
//! tagged by a `kind` field:
//!
//! ```json
//! {"kind": "InstantTime", "value": "2026-10-17 00:00:00 +00:00", "grain": "Day", "precision": "Exact"}
//! {"kind": "City", "value": "Paris"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OntologyError, Result};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Temporal resolution of a time value.
///
/// Variants are declared coarsest first, so `Grain::Year < Grain::Second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grain {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

/// Whether a resolved value is exact or approximate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Precision {
    Approximate,
    #[default]
    Exact,
}

// ---------------------------------------------------------------------------
// Structured payloads
// ---------------------------------------------------------------------------

/// A point in time, e.g. "tomorrow" or "at 5 pm".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantTimeValue {
    /// ISO-like timestamp (`YYYY-MM-DD hh:mm:ss +hh:mm`).
    pub value: String,
    pub grain: Grain,
    pub precision: Precision,
}

/// A span of time.  Either bound may be open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeIntervalValue {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountOfMoneyValue {
    pub value: f32,
    pub precision: Precision,
    /// ISO 4217 currency code (e.g. `"USD"`, `"EUR"`).
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureValue {
    pub value: f32,
    /// `"celsius"`, `"fahrenheit"`, `"kelvin"` or `"degree"` when unspecified.
    pub unit: String,
}

/// A duration broken down by calendar unit.  Units are not normalised:
/// "90 minutes" stays `minutes: 90`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DurationValue {
    pub years: i64,
    pub quarters: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub precision: Precision,
}

// ---------------------------------------------------------------------------
// SlotValue
// ---------------------------------------------------------------------------

/// The resolved value of a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "TaggedValue", from = "TaggedValue")]
pub enum SlotValue {
    Custom(String),
    Number(f64),
    Ordinal(i64),
    Percentage(f64),
    InstantTime(InstantTimeValue),
    TimeInterval(TimeIntervalValue),
    AmountOfMoney(AmountOfMoneyValue),
    Temperature(TemperatureValue),
    Duration(DurationValue),
    MusicAlbum(String),
    MusicArtist(String),
    MusicTrack(String),
    City(String),
    Country(String),
    Region(String),
}

/// The discriminant of a [`SlotValue`], as written in the `kind` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotValueKind {
    Custom,
    Number,
    Ordinal,
    Percentage,
    InstantTime,
    TimeInterval,
    AmountOfMoney,
    Temperature,
    Duration,
    MusicAlbum,
    MusicArtist,
    MusicTrack,
    City,
    Country,
    Region,
}

impl SlotValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [SlotValueKind; 15] = [
        Self::Custom,
        Self::Number,
        Self::Ordinal,
        Self::Percentage,
        Self::InstantTime,
        Self::TimeInterval,
        Self::AmountOfMoney,
        Self::Temperature,
        Self::Duration,
        Self::MusicAlbum,
        Self::MusicArtist,
        Self::MusicTrack,
        Self::City,
        Self::Country,
        Self::Region,
    ];

    /// The `kind` tag used in JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "Custom",
            Self::Number => "Number",
            Self::Ordinal => "Ordinal",
            Self::Percentage => "Percentage",
            Self::InstantTime => "InstantTime",
            Self::TimeInterval => "TimeInterval",
            Self::AmountOfMoney => "AmountOfMoney",
            Self::Temperature => "Temperature",
            Self::Duration => "Duration",
            Self::MusicAlbum => "MusicAlbum",
            Self::MusicArtist => "MusicArtist",
            Self::MusicTrack => "MusicTrack",
            Self::City => "City",
            Self::Country => "Country",
            Self::Region => "Region",
        }
    }

    /// Look up a kind by its JSON tag.  Matching is exact.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for SlotValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SlotValue {
    /// Return the discriminant of this value.
    pub fn kind(&self) -> SlotValueKind {
        match self {
            Self::Custom(_) => SlotValueKind::Custom,
            Self::Number(_) => SlotValueKind::Number,
            Self::Ordinal(_) => SlotValueKind::Ordinal,
            Self::Percentage(_) => SlotValueKind::Percentage,
            Self::InstantTime(_) => SlotValueKind::InstantTime,
            Self::TimeInterval(_) => SlotValueKind::TimeInterval,
            Self::AmountOfMoney(_) => SlotValueKind::AmountOfMoney,
            Self::Temperature(_) => SlotValueKind::Temperature,
            Self::Duration(_) => SlotValueKind::Duration,
            Self::MusicAlbum(_) => SlotValueKind::MusicAlbum,
            Self::MusicArtist(_) => SlotValueKind::MusicArtist,
            Self::MusicTrack(_) => SlotValueKind::MusicTrack,
            Self::City(_) => SlotValueKind::City,
            Self::Country(_) => SlotValueKind::Country,
            Self::Region(_) => SlotValueKind::Region,
        }
    }

    /// Decode a tagged JSON value.
    ///
    /// The `kind` tag is checked against the closed variant set before the
    /// payload is looked at, so an unrecognised kind always surfaces as
    /// [`OntologyError::UnknownSlotValueType`] rather than a generic
    /// deserialization error.
    pub fn decode(raw: &serde_json::Value) -> Result<Self> {
        let tag = raw
            .get("kind")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| OntologyError::MalformedValue {
                kind: "<untagged>".into(),
                reason: "missing string `kind` field".into(),
            })?;

        let kind = SlotValueKind::from_tag(tag).ok_or_else(|| {
            OntologyError::UnknownSlotValueType {
                kind: tag.to_string(),
            }
        })?;

        serde_json::from_value(raw.clone()).map_err(|e| OntologyError::MalformedValue {
            kind: kind.to_string(),
            reason: e.to_string(),
        })
    }

    /// Encode into the tagged JSON form accepted by [`SlotValue::decode`].
    pub fn encode(&self) -> serde_json::Value {
        // Serializing this enum cannot fail: every payload is plain data
        // with string keys.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Wire representation
// ---------------------------------------------------------------------------

/// Internally tagged mirror of [`SlotValue`].  Scalar variants are wrapped in
/// a `value` field since serde cannot tag bare primitives.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind")]
enum TaggedValue {
    Custom { value: String },
    Number { value: f64 },
    Ordinal { value: i64 },
    Percentage { value: f64 },
    InstantTime(InstantTimeValue),
    TimeInterval(TimeIntervalValue),
    AmountOfMoney(AmountOfMoneyValue),
    Temperature(TemperatureValue),
    Duration(DurationValue),
    MusicAlbum { value: String },
    MusicArtist { value: String },
    MusicTrack { value: String },
    City { value: String },
    Country { value: String },
    Region { value: String },
}

impl From<SlotValue> for TaggedValue {
    fn from(value: SlotValue) -> Self {
        match value {
            SlotValue::Custom(value) => Self::Custom { value },
            SlotValue::Number(value) => Self::Number { value },
            SlotValue::Ordinal(value) => Self::Ordinal { value },
            SlotValue::Percentage(value) => Self::Percentage { value },
            SlotValue::InstantTime(v) => Self::InstantTime(v),
            SlotValue::TimeInterval(v) => Self::TimeInterval(v),
            SlotValue::AmountOfMoney(v) => Self::AmountOfMoney(v),
            SlotValue::Temperature(v) => Self::Temperature(v),
            SlotValue::Duration(v) => Self::Duration(v),
            SlotValue::MusicAlbum(value) => Self::MusicAlbum { value },
            SlotValue::MusicArtist(value) => Self::MusicArtist { value },
            SlotValue::MusicTrack(value) => Self::MusicTrack { value },
            SlotValue::City(value) => Self::City { value },
            SlotValue::Country(value) => Self::Country { value },
            SlotValue::Region(value) => Self::Region { value },
        }
    }
}

impl From<TaggedValue> for SlotValue {
    fn from(tagged: TaggedValue) -> Self {
        match tagged {
            TaggedValue::Custom { value } => Self::Custom(value),
            TaggedValue::Number { value } => Self::Number(value),
            TaggedValue::Ordinal { value } => Self::Ordinal(value),
            TaggedValue::Percentage { value } => Self::Percentage(value),
            TaggedValue::InstantTime(v) => Self::InstantTime(v),
            TaggedValue::TimeInterval(v) => Self::TimeInterval(v),
            TaggedValue::AmountOfMoney(v) => Self::AmountOfMoney(v),
            TaggedValue::Temperature(v) => Self::Temperature(v),
            TaggedValue::Duration(v) => Self::Duration(v),
            TaggedValue::MusicAlbum { value } => Self::MusicAlbum(value),
            TaggedValue::MusicArtist { value } => Self::MusicArtist(value),
            TaggedValue::MusicTrack { value } => Self::MusicTrack(value),
            TaggedValue::City { value } => Self::City(value),
            TaggedValue::Country { value } => Self::Country(value),
            TaggedValue::Region { value } => Self::Region(value),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
