//! Entity identifiers.
//!
//! A slot is typed by the entity it is mapped to in the bundle.  Identifiers
//! starting with [`BUILTIN_PREFIX`] name one of the [`BuiltinEntityKind`]s;
//! anything else is a custom entity declared by the bundle itself.
//!
//! Builtins come in two flavours: gazetteer builtins (cities, music, ...)
//! whose values are listed in the bundle, and grammar builtins (dates,
//! amounts, ...) produced by a resolver.

use std::fmt;

use crate::error::{OntologyError, Result};
use crate::value::{SlotValue, SlotValueKind};

/// Prefix shared by every builtin entity identifier.
pub const BUILTIN_PREFIX: &str = "builtin/";

/// The closed set of builtin entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinEntityKind {
    AmountOfMoney,
    Duration,
    Number,
    Ordinal,
    Temperature,
    Datetime,
    Date,
    Time,
    DatePeriod,
    TimePeriod,
    Percentage,
    MusicAlbum,
    MusicArtist,
    MusicTrack,
    City,
    Country,
    Region,
}

impl BuiltinEntityKind {
    pub const ALL: [BuiltinEntityKind; 17] = [
        Self::AmountOfMoney,
        Self::Duration,
        Self::Number,
        Self::Ordinal,
        Self::Temperature,
        Self::Datetime,
        Self::Date,
        Self::Time,
        Self::DatePeriod,
        Self::TimePeriod,
        Self::Percentage,
        Self::MusicAlbum,
        Self::MusicArtist,
        Self::MusicTrack,
        Self::City,
        Self::Country,
        Self::Region,
    ];

    /// Full identifier, e.g. `"builtin/datetime"`.
    pub fn identifier(self) -> &'static str {
        match self {
            Self::AmountOfMoney => "builtin/amountOfMoney",
            Self::Duration => "builtin/duration",
            Self::Number => "builtin/number",
            Self::Ordinal => "builtin/ordinal",
            Self::Temperature => "builtin/temperature",
            Self::Datetime => "builtin/datetime",
            Self::Date => "builtin/date",
            Self::Time => "builtin/time",
            Self::DatePeriod => "builtin/datePeriod",
            Self::TimePeriod => "builtin/timePeriod",
            Self::Percentage => "builtin/percentage",
            Self::MusicAlbum => "builtin/musicAlbum",
            Self::MusicArtist => "builtin/musicArtist",
            Self::MusicTrack => "builtin/musicTrack",
            Self::City => "builtin/city",
            Self::Country => "builtin/country",
            Self::Region => "builtin/region",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == identifier)
    }

    /// Whether values for this entity are listed in the bundle rather than
    /// produced by a grammar.
    pub fn is_gazetteer(self) -> bool {
        matches!(
            self,
            Self::MusicAlbum
                | Self::MusicArtist
                | Self::MusicTrack
                | Self::City
                | Self::Country
                | Self::Region
        )
    }

    /// The slot value kinds this entity can resolve to.
    pub fn value_kinds(self) -> &'static [SlotValueKind] {
        match self {
            Self::AmountOfMoney => &[SlotValueKind::AmountOfMoney],
            Self::Duration => &[SlotValueKind::Duration],
            Self::Number => &[SlotValueKind::Number],
            Self::Ordinal => &[SlotValueKind::Ordinal],
            Self::Temperature => &[SlotValueKind::Temperature],
            Self::Datetime => &[SlotValueKind::InstantTime, SlotValueKind::TimeInterval],
            Self::Date | Self::Time => &[SlotValueKind::InstantTime],
            Self::DatePeriod | Self::TimePeriod => &[SlotValueKind::TimeInterval],
            Self::Percentage => &[SlotValueKind::Percentage],
            Self::MusicAlbum => &[SlotValueKind::MusicAlbum],
            Self::MusicArtist => &[SlotValueKind::MusicArtist],
            Self::MusicTrack => &[SlotValueKind::MusicTrack],
            Self::City => &[SlotValueKind::City],
            Self::Country => &[SlotValueKind::Country],
            Self::Region => &[SlotValueKind::Region],
        }
    }
}

impl fmt::Display for BuiltinEntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A parsed entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A bundle-defined entity, e.g. `"cuisine"`.
    Custom(String),
    Builtin(BuiltinEntityKind),
}

impl EntityKind {
    /// Parse an identifier.
    ///
    /// Returns [`OntologyError::UnknownBuiltinEntity`] if the identifier uses
    /// the builtin prefix but is not one of the known builtins.
    pub fn parse(identifier: &str) -> Result<Self> {
        if identifier.starts_with(BUILTIN_PREFIX) {
            BuiltinEntityKind::from_identifier(identifier)
                .map(Self::Builtin)
                .ok_or_else(|| OntologyError::UnknownBuiltinEntity {
                    identifier: identifier.to_string(),
                })
        } else {
            Ok(Self::Custom(identifier.to_string()))
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::Custom(name) => name,
            Self::Builtin(kind) => kind.identifier(),
        }
    }

    /// Whether matches for this entity come from a bundle gazetteer.
    pub fn is_gazetteer(&self) -> bool {
        match self {
            Self::Custom(_) => true,
            Self::Builtin(kind) => kind.is_gazetteer(),
        }
    }

    /// The slot value kinds this entity can resolve to.
    pub fn value_kinds(&self) -> &'static [SlotValueKind] {
        match self {
            Self::Custom(_) => &[SlotValueKind::Custom],
            Self::Builtin(kind) => kind.value_kinds(),
        }
    }

    /// Build the slot value for a gazetteer hit resolved to `resolved`.
    pub fn gazetteer_value(&self, resolved: impl Into<String>) -> Result<SlotValue> {
        let resolved = resolved.into();
        match self {
            Self::Custom(_) => Ok(SlotValue::Custom(resolved)),
            Self::Builtin(kind) => match kind {
                BuiltinEntityKind::MusicAlbum => Ok(SlotValue::MusicAlbum(resolved)),
                BuiltinEntityKind::MusicArtist => Ok(SlotValue::MusicArtist(resolved)),
                BuiltinEntityKind::MusicTrack => Ok(SlotValue::MusicTrack(resolved)),
                BuiltinEntityKind::City => Ok(SlotValue::City(resolved)),
                BuiltinEntityKind::Country => Ok(SlotValue::Country(resolved)),
                BuiltinEntityKind::Region => Ok(SlotValue::Region(resolved)),
                BuiltinEntityKind::AmountOfMoney
                | BuiltinEntityKind::Duration
                | BuiltinEntityKind::Number
                | BuiltinEntityKind::Ordinal
                | BuiltinEntityKind::Temperature
                | BuiltinEntityKind::Datetime
                | BuiltinEntityKind::Date
                | BuiltinEntityKind::Time
                | BuiltinEntityKind::DatePeriod
                | BuiltinEntityKind::TimePeriod
                | BuiltinEntityKind::Percentage => Err(OntologyError::NotAGazetteerEntity {
                    identifier: kind.identifier().to_string(),
                }),
            },
        }
    }

    /// Decode a resolver-produced tagged value for this entity.
    ///
    /// Fails with [`OntologyError::UnknownSlotValueType`] for unknown tags and
    /// [`OntologyError::ValueKindMismatch`] when the tag is known but not one
    /// this entity produces.
    pub fn decode_value(&self, raw: &serde_json::Value) -> Result<SlotValue> {
        let value = SlotValue::decode(raw)?;
        if !self.value_kinds().contains(&value.kind()) {
            return Err(OntologyError::ValueKindMismatch {
                entity: self.identifier().to_string(),
                kind: value.kind().to_string(),
            });
        }
        Ok(value)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_custom_and_builtin() {
        assert_eq!(
            EntityKind::parse("cuisine").unwrap(),
            EntityKind::Custom("cuisine".into())
        );
        assert_eq!(
            EntityKind::parse("builtin/city").unwrap(),
            EntityKind::Builtin(BuiltinEntityKind::City)
        );
    }

    #[test]
    fn unknown_builtin_is_rejected() {
        let err = EntityKind::parse("builtin/weather").unwrap_err();
        assert!(matches!(err, OntologyError::UnknownBuiltinEntity { .. }));
    }

    #[test]
    fn identifiers_round_trip() {
        for kind in BuiltinEntityKind::ALL {
            assert!(kind.identifier().starts_with(BUILTIN_PREFIX));
            assert_eq!(BuiltinEntityKind::from_identifier(kind.identifier()), Some(kind));
        }
    }

    #[test]
    fn gazetteer_value_dispatches_on_kind() {
        let city = EntityKind::Builtin(BuiltinEntityKind::City);
        assert_eq!(
            city.gazetteer_value("Paris").unwrap(),
            SlotValue::City("Paris".into())
        );

        let custom = EntityKind::Custom("cuisine".into());
        assert_eq!(
            custom.gazetteer_value("italian").unwrap(),
            SlotValue::Custom("italian".into())
        );
    }

    #[test]
    fn grammar_builtin_has_no_gazetteer_value() {
        let number = EntityKind::Builtin(BuiltinEntityKind::Number);
        assert!(!number.is_gazetteer());
        assert!(matches!(
            number.gazetteer_value("3"),
            Err(OntologyError::NotAGazetteerEntity { .. })
        ));
    }

    #[test]
    fn decode_value_checks_entity_kind() {
        let datetime = EntityKind::Builtin(BuiltinEntityKind::Datetime);
        let interval = json!({"kind": "TimeInterval", "from": null, "to": null});
        assert!(datetime.decode_value(&interval).is_ok());

        let number = json!({"kind": "Number", "value": 3.0});
        assert!(matches!(
            datetime.decode_value(&number),
            Err(OntologyError::ValueKindMismatch { .. })
        ));

        let unknown = json!({"kind": "Mood", "value": "happy"});
        assert!(matches!(
            datetime.decode_value(&unknown),
            Err(OntologyError::UnknownSlotValueType { .. })
        ));
    }
}
