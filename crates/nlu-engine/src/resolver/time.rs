//! Relative date and time expressions.
//!
//! Mentions are resolved against a reference instant, as naive local times
//! in the reference's UTC offset.  Intervals are built afterwards from pairs
//! of mentions joined by "to", "until", "and" or a dash.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use nlu_ontology::{Grain, Precision};
use regex::Regex;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("time pattern is valid")
}

static RELATIVE_DAY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)\b(the\s+day\s+after\s+tomorrow|today|tomorrow|yesterday)\b")
});
static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)\b(?:(next|this)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
});
static PERIOD: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\b(this|next|last)\s+(week|month|year)\b"));
static TONIGHT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\btonight\b"));
static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)\b(at\s+)?(?:(noon|midnight)|(\d{1,2})(?::(\d{2}))?(?:\s*([ap])m)?)\b")
});

static CLOSED_LEAD: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\b(?:from|between)\s+$"));
static JOINER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^\s*(?:(to|until|till|through)|(and)|-)\s*$"));
static UNTIL_LEAD: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\b(?:until|till|before)\s+$"));
static AFTER_LEAD: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\b(?:after|since)\s+$"));

/// Evening as meant by "tonight".
const EVENING_HOUR: u32 = 18;

/// Confidence of a clock time whose half of the day had to be guessed.
const AMBIGUOUS_CLOCK_CONFIDENCE: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Form {
    /// A calendar day ("tomorrow", "friday").
    Day,
    /// A clock time as written, plus the other half-day reading when the
    /// hour does not say.
    Clock {
        written: NaiveTime,
        other: Option<NaiveTime>,
    },
    /// A day and a clock time together ("tomorrow at 5 pm").
    DayClock,
    /// A named span ("next week", "tonight") ending before `end`.
    Span { end: NaiveDateTime, whole_days: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct TimeMention {
    pub range: Range<usize>,
    pub start: NaiveDateTime,
    pub alternative: Option<NaiveDateTime>,
    pub grain: Grain,
    pub precision: Precision,
    pub confidence: f32,
    pub form: Form,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct IntervalMention {
    pub range: Range<usize>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    /// Both bounds are day grained or coarser.
    pub whole_days: bool,
}

impl TimeMention {
    fn day(range: Range<usize>, date: NaiveDate) -> Option<Self> {
        Some(Self {
            range,
            start: midnight(date)?,
            alternative: None,
            grain: Grain::Day,
            precision: Precision::Exact,
            confidence: 1.0,
            form: Form::Day,
        })
    }

    /// First instant after the mention.
    fn exclusive_end(&self) -> Option<NaiveDateTime> {
        match self.form {
            Form::Span { end, .. } => Some(end),
            _ if self.grain <= Grain::Day => self.start.checked_add_signed(TimeDelta::days(1)),
            _ => Some(self.start),
        }
    }
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

// ---------------------------------------------------------------------------
// Instants
// ---------------------------------------------------------------------------

/// Every date and time mention in `text`, ordered by position.
pub(super) fn find_times(text: &str, now: NaiveDateTime) -> Vec<TimeMention> {
    let today = now.date();
    let mut found = Vec::new();

    for caps in RELATIVE_DAY.captures_iter(text) {
        let offset = match caps[1].to_lowercase().as_str() {
            "today" => 0,
            "tomorrow" => 1,
            "yesterday" => -1,
            _ => 2,
        };
        let range = caps.get(0).map_or(0..0, |m| m.range());
        if let Some(m) = today
            .checked_add_signed(TimeDelta::days(offset))
            .and_then(|date| TimeMention::day(range, date))
        {
            found.push(m);
        }
    }

    for caps in WEEKDAY.captures_iter(text) {
        let Ok(target) = caps[2].parse::<Weekday>() else {
            continue;
        };
        let this = caps
            .get(1)
            .is_some_and(|m| m.as_str().eq_ignore_ascii_case("this"));
        let mut ahead = (target.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
        if ahead == 0 && !this {
            ahead = 7;
        }
        let range = caps.get(0).map_or(0..0, |m| m.range());
        if let Some(m) = today
            .checked_add_days(Days::new(ahead.into()))
            .and_then(|date| TimeMention::day(range, date))
        {
            found.push(m);
        }
    }

    for caps in PERIOD.captures_iter(text) {
        let shift = match caps[1].to_lowercase().as_str() {
            "next" => 1,
            "last" => -1,
            _ => 0,
        };
        let Some((start, end, grain)) = period(&caps[2].to_lowercase(), shift, today) else {
            continue;
        };
        let (Some(start), Some(end)) = (midnight(start), midnight(end)) else {
            continue;
        };
        found.push(TimeMention {
            range: caps.get(0).map_or(0..0, |m| m.range()),
            start,
            alternative: None,
            grain,
            precision: Precision::Exact,
            confidence: 1.0,
            form: Form::Span {
                end,
                whole_days: true,
            },
        });
    }

    for m in TONIGHT.find_iter(text) {
        let start = today.and_hms_opt(EVENING_HOUR, 0, 0);
        let end = today.checked_add_days(Days::new(1)).and_then(midnight);
        if let (Some(start), Some(end)) = (start, end) {
            found.push(TimeMention {
                range: m.range(),
                start,
                alternative: None,
                grain: Grain::Hour,
                precision: Precision::Approximate,
                confidence: 1.0,
                form: Form::Span {
                    end,
                    whole_days: false,
                },
            });
        }
    }

    clocks(text, now, &mut found);
    combine_day_and_clock(text, &mut found);

    found.sort_by_key(|m| (m.range.start, m.range.end));
    found
}

/// Start and end dates of a calendar period `shift` periods away from the
/// one containing `today`.
fn period(unit: &str, shift: i32, today: NaiveDate) -> Option<(NaiveDate, NaiveDate, Grain)> {
    match unit {
        "week" => {
            let monday = today.checked_sub_days(Days::new(today.weekday().num_days_from_monday().into()))?;
            let start = monday.checked_add_signed(TimeDelta::weeks(shift.into()))?;
            Some((start, start.checked_add_days(Days::new(7))?, Grain::Week))
        }
        "month" => {
            let first = today.with_day(1)?;
            let months = Months::new(shift.unsigned_abs());
            let start = if shift >= 0 {
                first.checked_add_months(months)?
            } else {
                first.checked_sub_months(months)?
            };
            Some((start, start.checked_add_months(Months::new(1))?, Grain::Month))
        }
        _ => {
            let year = today.year() + shift;
            Some((
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
                Grain::Year,
            ))
        }
    }
}

/// Clock times.  A bare number only counts when introduced by "at" or
/// written with minutes or am/pm.
fn clocks(text: &str, now: NaiveDateTime, found: &mut Vec<TimeMention>) {
    for caps in CLOCK.captures_iter(text) {
        let range = caps.get(0).map_or(0..0, |m| m.range());

        let (written, other, grain) = if let Some(word) = caps.get(2) {
            let hour = if word.as_str().eq_ignore_ascii_case("noon") { 12 } else { 0 };
            let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) else {
                continue;
            };
            (time, None, Grain::Hour)
        } else {
            let minutes = caps.get(4);
            let meridiem = caps.get(5);
            if caps.get(1).is_none() && minutes.is_none() && meridiem.is_none() {
                continue;
            }
            let Ok(hour) = caps[3].parse::<u32>() else {
                continue;
            };
            let minute = match minutes.map(|m| m.as_str().parse::<u32>()) {
                Some(Ok(minute)) => minute,
                Some(Err(_)) => continue,
                None => 0,
            };

            let (hour, other_hour) = match meridiem {
                Some(m) => {
                    if !(1..=12).contains(&hour) {
                        continue;
                    }
                    let pm = m.as_str().eq_ignore_ascii_case("p");
                    (hour % 12 + if pm { 12 } else { 0 }, None)
                }
                None if (1..=11).contains(&hour) => (hour, Some(hour + 12)),
                None => (hour, None),
            };

            let Some(written) = NaiveTime::from_hms_opt(hour, minute, 0) else {
                continue;
            };
            let other = other_hour.and_then(|h| NaiveTime::from_hms_opt(h, minute, 0));
            let grain = if minutes.is_some() { Grain::Minute } else { Grain::Hour };
            (written, other, grain)
        };

        // A bare clock time means its next occurrence; with two readings the
        // sooner one comes first.
        let Some(mut start) = next_occurrence(now, written) else {
            continue;
        };
        let mut alternative = other.and_then(|t| next_occurrence(now, t));
        if let Some(alt) = alternative.as_mut().filter(|alt| **alt < start) {
            std::mem::swap(&mut start, alt);
        }

        found.push(TimeMention {
            range,
            start,
            alternative,
            grain,
            precision: Precision::Exact,
            confidence: if other.is_some() { AMBIGUOUS_CLOCK_CONFIDENCE } else { 1.0 },
            form: Form::Clock { written, other },
        });
    }
}

fn next_occurrence(now: NaiveDateTime, time: NaiveTime) -> Option<NaiveDateTime> {
    let today = now.date().and_time(time);
    if today >= now {
        Some(today)
    } else {
        today.checked_add_days(Days::new(1))
    }
}

/// "tomorrow at 5 pm" and "5 pm tomorrow".
fn combine_day_and_clock(text: &str, found: &mut Vec<TimeMention>) {
    let mut combined = Vec::new();
    for day in found.iter().filter(|m| m.form == Form::Day) {
        for clock in found.iter() {
            let Form::Clock { written, other } = clock.form else {
                continue;
            };
            let (first, second) = if day.range.end <= clock.range.start {
                (&day.range, &clock.range)
            } else if clock.range.end <= day.range.start {
                (&clock.range, &day.range)
            } else {
                continue;
            };
            if !text[first.end..second.start].trim().is_empty() {
                continue;
            }

            let date = day.start.date();
            combined.push(TimeMention {
                range: first.start..second.end,
                start: date.and_time(written),
                alternative: other.map(|t| date.and_time(t)),
                grain: clock.grain,
                precision: Precision::Exact,
                confidence: clock.confidence,
                form: Form::DayClock,
            });
        }
    }
    found.extend(combined);
}

// ---------------------------------------------------------------------------
// Intervals
// ---------------------------------------------------------------------------

/// Closed intervals between two mentions and open intervals introduced by
/// "until" or "after".
pub(super) fn find_intervals(text: &str, times: &[TimeMention]) -> Vec<IntervalMention> {
    let mut intervals = Vec::new();

    for a in times {
        let before = &text[..a.range.start];

        for b in times.iter().filter(|b| b.range.start >= a.range.end) {
            let Some(joiner) = JOINER.captures(&text[a.range.end..b.range.start]) else {
                continue;
            };
            let lead = CLOSED_LEAD.find(before);
            // "X and Y" only reads as an interval after "between".
            if lead.is_none() && joiner.get(2).is_some() {
                continue;
            }
            // Ends at or before its start: not an interval.
            let Some(to) = b.exclusive_end().filter(|to| *to > a.start) else {
                continue;
            };
            intervals.push(IntervalMention {
                range: lead.map_or(a.range.start, |m| m.start())..b.range.end,
                from: Some(a.start),
                to: Some(to),
                whole_days: a.grain <= Grain::Day && b.grain <= Grain::Day,
            });
        }

        if let Some(lead) = UNTIL_LEAD.find(before) {
            intervals.push(IntervalMention {
                range: lead.start()..a.range.end,
                from: None,
                to: Some(a.start),
                whole_days: a.grain <= Grain::Day,
            });
        }
        if let Some(lead) = AFTER_LEAD.find(before) {
            intervals.push(IntervalMention {
                range: lead.start()..a.range.end,
                from: a.exclusive_end(),
                to: None,
                whole_days: a.grain <= Grain::Day,
            });
        }
    }

    intervals.sort_by_key(|i| (i.range.start, i.range.end));
    intervals
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
