//! The default, rule-based builtin resolver.
//!
//! [`RuleResolver`] recognises a small English grammar with [`regex`]
//! patterns: relative dates and clock times, intervals between them,
//! durations, amounts of money, temperatures, percentages, ordinals and
//! cardinal numbers.  Overlapping mentions are all reported; the slot
//! extractor keeps the longest.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use nlu_ontology::BuiltinEntityKind as K;
use nlu_ontology::{
    AmountOfMoneyValue, DurationValue, InstantTimeValue, Precision, SlotValue, TemperatureValue,
    TimeIntervalValue,
};
use regex::{Captures, Regex};

use super::time::{self, Form};
use super::{BuiltinEntityResolver, ResolveRequest, ResolvedEntity};

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Spelled-out cardinals understood everywhere a number is.
const NUMBER_WORDS: [(&str, i64); 29] = [
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
    ("hundred", 100),
];

const ORDINAL_WORDS: [(&str, i64); 12] = [
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("eleventh", 11),
    ("twelfth", 12),
];

const APPROXIMATE: &str = r"(?:\b(about|around|approximately|roughly)\s+)?";

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("resolver pattern is valid")
}

fn alternation(words: &[(&str, i64)]) -> String {
    words.iter().map(|(w, _)| *w).collect::<Vec<_>>().join("|")
}

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"(?i)\b(?:(\d+(?:\.\d+)?)|({}))\b",
        alternation(&NUMBER_WORDS)
    ))
});
static ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"(?i)\b(?:(\d+)(?:st|nd|rd|th)|({}))\b",
        alternation(&ORDINAL_WORDS)
    ))
});
static PERCENTAGE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)(-)?\b(\d+(?:\.\d+)?)\s*(?:%|percent\b|per\s+cent\b)")
});
static TEMPERATURE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)(-)?\b(\d+(?:\.\d+)?)\s*(?:°(?:\s*([cfk])\b)?|degrees?(?:\s+(celsius|fahrenheit|kelvin|c|f|k))?\b|(celsius|fahrenheit|kelvin)\b)",
    )
});
static MONEY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"(?i){APPROXIMATE}(?:([$€£])\s?(\d+(?:\.\d+)?)\b|\b(\d+(?:\.\d+)?)\s*(dollars?|bucks|euros?|pounds?|usd|eur|gbp)\b|\b(\d+(?:\.\d+)?)\s?([$€£]))"
    ))
});
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"(?i){APPROXIMATE}\b(\d+|an?|{})\s+(seconds?|minutes?|hours?|days?|weeks?|months?|quarters?|years?)\b",
        alternation(&NUMBER_WORDS)
    ))
});

// ---------------------------------------------------------------------------
// Entity kinds per reading
// ---------------------------------------------------------------------------

const DAY_KINDS: &[K] = &[K::Datetime, K::Date];
const CLOCK_KINDS: &[K] = &[K::Datetime, K::Time];
const DAY_SPAN_KINDS: &[K] = &[K::DatePeriod];
const CLOCK_SPAN_KINDS: &[K] = &[K::TimePeriod];
const DAY_INTERVAL_KINDS: &[K] = &[K::Datetime, K::DatePeriod];
const CLOCK_INTERVAL_KINDS: &[K] = &[K::Datetime, K::TimePeriod];
const TIME_KINDS: &[K] = &[K::Datetime, K::Date, K::Time, K::DatePeriod, K::TimePeriod];

/// A reading of part of the text, usable as any of `kinds`.
struct Mention {
    kinds: &'static [K],
    range: Range<usize>,
    value: SlotValue,
    alternatives: Vec<SlotValue>,
    confidence: f32,
}

impl Mention {
    fn exact(kinds: &'static [K], range: Range<usize>, value: SlotValue) -> Self {
        Self {
            kinds,
            range,
            value,
            alternatives: Vec::new(),
            confidence: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// RuleResolver
// ---------------------------------------------------------------------------

/// Regex grammar for English builtin entities.
#[derive(Debug, Clone, Default)]
pub struct RuleResolver {
    reference: Option<DateTime<FixedOffset>>,
}

impl RuleResolver {
    /// A resolver reading relative expressions against the local clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver reading relative expressions against `reference`.
    pub fn with_reference_time(reference: DateTime<FixedOffset>) -> Self {
        Self {
            reference: Some(reference),
        }
    }

    fn reference(&self) -> DateTime<FixedOffset> {
        self.reference
            .unwrap_or_else(|| Local::now().fixed_offset())
    }
}

impl BuiltinEntityResolver for RuleResolver {
    fn resolve(&self, request: &ResolveRequest<'_>) -> Vec<ResolvedEntity> {
        let wants = |kinds: &[K]| kinds.iter().any(|k| request.kinds.contains(k));
        let text = request.text;
        let mut mentions = Vec::new();

        if wants(TIME_KINDS) {
            times(text, self.reference(), &mut mentions);
        }
        if wants(&[K::Duration]) {
            durations(text, &mut mentions);
        }
        if wants(&[K::AmountOfMoney]) {
            money(text, &mut mentions);
        }
        if wants(&[K::Temperature]) {
            temperatures(text, &mut mentions);
        }
        if wants(&[K::Percentage]) {
            percentages(text, &mut mentions);
        }
        if wants(&[K::Ordinal]) {
            ordinals(text, &mut mentions);
        }
        if wants(&[K::Number]) {
            numbers(text, &mut mentions);
        }

        let mut resolved = Vec::new();
        for mention in mentions {
            for &entity in mention.kinds {
                if !request.kinds.contains(&entity) {
                    continue;
                }
                resolved.push(ResolvedEntity {
                    entity,
                    range: mention.range.clone(),
                    value: mention.value.encode(),
                    alternatives: mention
                        .alternatives
                        .iter()
                        .take(request.max_alternatives)
                        .map(SlotValue::encode)
                        .collect(),
                    confidence: mention.confidence,
                });
            }
        }
        resolved.sort_by(|a, b| {
            a.range
                .start
                .cmp(&b.range.start)
                .then(a.range.end.cmp(&b.range.end))
                .then(a.entity.cmp(&b.entity))
        });

        tracing::trace!(found = resolved.len(), "builtin entities resolved");
        resolved
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// `YYYY-MM-DD hh:mm:ss +hh:mm`.
fn stamp(at: NaiveDateTime, offset: FixedOffset) -> String {
    format!("{} {offset}", at.format("%Y-%m-%d %H:%M:%S"))
}

fn times(text: &str, reference: DateTime<FixedOffset>, out: &mut Vec<Mention>) {
    let offset = *reference.offset();
    let found = time::find_times(text, reference.naive_local());

    for m in &found {
        let instant = |at: NaiveDateTime| {
            SlotValue::InstantTime(InstantTimeValue {
                value: stamp(at, offset),
                grain: m.grain,
                precision: m.precision,
            })
        };
        let kinds = match m.form {
            Form::Day | Form::Span { whole_days: true, .. } => DAY_KINDS,
            Form::Clock { .. } | Form::DayClock | Form::Span { whole_days: false, .. } => {
                CLOCK_KINDS
            }
        };
        out.push(Mention {
            kinds,
            range: m.range.clone(),
            value: instant(m.start),
            alternatives: m.alternative.map(&instant).into_iter().collect(),
            confidence: m.confidence,
        });

        if let Form::Span { end, whole_days } = m.form {
            out.push(Mention::exact(
                if whole_days { DAY_SPAN_KINDS } else { CLOCK_SPAN_KINDS },
                m.range.clone(),
                SlotValue::TimeInterval(TimeIntervalValue {
                    from: Some(stamp(m.start, offset)),
                    to: Some(stamp(end, offset)),
                }),
            ));
        }
    }

    for i in time::find_intervals(text, &found) {
        out.push(Mention::exact(
            if i.whole_days { DAY_INTERVAL_KINDS } else { CLOCK_INTERVAL_KINDS },
            i.range,
            SlotValue::TimeInterval(TimeIntervalValue {
                from: i.from.map(|t| stamp(t, offset)),
                to: i.to.map(|t| stamp(t, offset)),
            }),
        ));
    }
}

fn precision(caps: &Captures<'_>, group: usize) -> Precision {
    if caps.get(group).is_some() {
        Precision::Approximate
    } else {
        Precision::Exact
    }
}

fn whole(caps: &Captures<'_>) -> Range<usize> {
    caps.get(0).map_or(0..0, |m| m.range())
}

fn word_value(words: &[(&str, i64)], word: &str) -> Option<i64> {
    words
        .iter()
        .find(|(w, _)| w.eq_ignore_ascii_case(word))
        .map(|(_, v)| *v)
}

fn durations(text: &str, out: &mut Vec<Mention>) {
    for caps in DURATION.captures_iter(text) {
        let count = &caps[2];
        let amount = if count.eq_ignore_ascii_case("a") || count.eq_ignore_ascii_case("an") {
            Some(1)
        } else {
            count
                .parse::<i64>()
                .ok()
                .or_else(|| word_value(&NUMBER_WORDS, count))
        };
        let Some(amount) = amount else {
            continue;
        };

        let mut value = DurationValue {
            precision: precision(&caps, 1),
            ..DurationValue::default()
        };
        let unit = caps[3].to_lowercase();
        let field = match unit.trim_end_matches('s') {
            "second" => &mut value.seconds,
            "minute" => &mut value.minutes,
            "hour" => &mut value.hours,
            "day" => &mut value.days,
            "week" => &mut value.weeks,
            "month" => &mut value.months,
            "quarter" => &mut value.quarters,
            _ => &mut value.years,
        };
        *field = amount;

        out.push(Mention::exact(
            &[K::Duration],
            whole(&caps),
            SlotValue::Duration(value),
        ));
    }
}

/// ISO 4217 code for a currency symbol or word.
fn currency(unit: &str) -> &'static str {
    let unit = unit.to_lowercase();
    if unit == "$" || unit == "usd" || unit == "bucks" || unit.starts_with("dollar") {
        "USD"
    } else if unit == "€" || unit == "eur" || unit.starts_with("euro") {
        "EUR"
    } else {
        "GBP"
    }
}

fn money(text: &str, out: &mut Vec<Mention>) {
    for caps in MONEY.captures_iter(text) {
        // Symbol before, word after, symbol after.
        let (amount, unit) = if let (Some(unit), Some(amount)) = (caps.get(2), caps.get(3)) {
            (amount, unit)
        } else if let (Some(amount), Some(unit)) = (caps.get(4), caps.get(5)) {
            (amount, unit)
        } else if let (Some(amount), Some(unit)) = (caps.get(6), caps.get(7)) {
            (amount, unit)
        } else {
            continue;
        };
        let Some(value) = amount.as_str().parse::<f32>().ok().filter(|v| v.is_finite()) else {
            continue;
        };
        out.push(Mention::exact(
            &[K::AmountOfMoney],
            whole(&caps),
            SlotValue::AmountOfMoney(AmountOfMoneyValue {
                value,
                precision: precision(&caps, 1),
                unit: currency(unit.as_str()).to_string(),
            }),
        ));
    }
}

fn signed<T: std::str::FromStr + std::ops::Neg<Output = T>>(
    caps: &Captures<'_>,
    sign: usize,
    digits: usize,
) -> Option<T> {
    let value = caps[digits].parse::<T>().ok()?;
    Some(if caps.get(sign).is_some() { -value } else { value })
}

fn temperatures(text: &str, out: &mut Vec<Mention>) {
    for caps in TEMPERATURE.captures_iter(text) {
        let Some(value) = signed::<f32>(&caps, 1, 2).filter(|v| v.is_finite()) else {
            continue;
        };
        let unit = caps
            .get(3)
            .or_else(|| caps.get(4))
            .or_else(|| caps.get(5))
            .and_then(|m| m.as_str().chars().next())
            .map(|c| match c.to_ascii_lowercase() {
                'c' => "celsius",
                'f' => "fahrenheit",
                _ => "kelvin",
            })
            .unwrap_or("degree");
        out.push(Mention::exact(
            &[K::Temperature],
            whole(&caps),
            SlotValue::Temperature(TemperatureValue {
                value,
                unit: unit.to_string(),
            }),
        ));
    }
}

fn percentages(text: &str, out: &mut Vec<Mention>) {
    for caps in PERCENTAGE.captures_iter(text) {
        if let Some(value) = signed::<f64>(&caps, 1, 2).filter(|v| v.is_finite()) {
            out.push(Mention::exact(
                &[K::Percentage],
                whole(&caps),
                SlotValue::Percentage(value),
            ));
        }
    }
}

fn ordinals(text: &str, out: &mut Vec<Mention>) {
    for caps in ORDINAL.captures_iter(text) {
        let value = match (caps.get(1), caps.get(2)) {
            (Some(digits), _) => digits.as_str().parse::<i64>().ok(),
            (None, Some(word)) => word_value(&ORDINAL_WORDS, word.as_str()),
            (None, None) => None,
        };
        if let Some(value) = value {
            out.push(Mention::exact(
                &[K::Ordinal],
                whole(&caps),
                SlotValue::Ordinal(value),
            ));
        }
    }
}

fn numbers(text: &str, out: &mut Vec<Mention>) {
    for caps in NUMBER.captures_iter(text) {
        let value = match (caps.get(1), caps.get(2)) {
            (Some(digits), _) => digits.as_str().parse::<f64>().ok(),
            (None, Some(word)) => word_value(&NUMBER_WORDS, word.as_str()).map(|v| v as f64),
            (None, None) => None,
        };
        if let Some(value) = value.filter(|v| v.is_finite()) {
            out.push(Mention::exact(
                &[K::Number],
                whole(&caps),
                SlotValue::Number(value),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
