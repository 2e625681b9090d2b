//! Writing-process measures derived from the token stream and raw records.

use std::fmt;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::config::EngineConfig;
use crate::key::{CursorRange, KeyAction, KeyClass, KeyRecord};
use crate::pause::{Pause, PauseLocation, find_pauses};
use crate::reconcile::{Linearization, linearize};
use crate::record::EventLog;
use crate::segment::{TextProfile, median};
use crate::token::{Token, TokenKind};

/// Status reported when a log carries no text snapshots.
pub const NO_TEXT_STATUS: &str = "no text records: measures unavailable";

/// Measures that need linguistic resources this engine does not have.
const UNDETERMINED: [&str; 10] = [
    "lexical_diversity",
    "lexical_density",
    "t_units",
    "clauses",
    "words_per_t_unit",
    "clauses_per_t_unit",
    "words_per_clause",
    "spelling_error_proportion",
    "bigger_revisions",
    "global_revisions",
];

/// A single measure value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureValue {
    Number(f64),
    /// Not computable for this log (serialized as `null`).
    Absent,
    /// A value that depends on the pause criterion.
    Thresholded {
        threshold_sec: f64,
        value: Option<f64>,
    },
    /// Placeholder for measures outside the engine's reach.
    Undetermined,
}

impl MeasureValue {
    /// The numeric payload, if there is one.
    pub const fn number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Thresholded { value, .. } => *value,
            Self::Absent | Self::Undetermined => None,
        }
    }
}

impl Serialize for MeasureValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Number(v) => serializer.serialize_f64(*v),
            Self::Absent => serializer.serialize_none(),
            Self::Thresholded {
                threshold_sec,
                value,
            } => {
                let mut state = serializer.serialize_struct("Thresholded", 2)?;
                state.serialize_field("threshold_sec", threshold_sec)?;
                state.serialize_field("value", value)?;
                state.end()
            }
            Self::Undetermined => serializer.serialize_str("undetermined"),
        }
    }
}

impl fmt::Display for MeasureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write_number(f, *v),
            Self::Absent => write!(f, "n/a"),
            Self::Thresholded {
                threshold_sec,
                value,
            } => {
                match value {
                    Some(v) => write_number(f, *v)?,
                    None => write!(f, "n/a")?,
                }
                write!(f, " (pause >= {threshold_sec}s)")
            }
            Self::Undetermined => write!(f, "undetermined"),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        write!(f, "{v:.0}")
    } else {
        write!(f, "{v:.3}")
    }
}

/// Ordered `name -> value` measures, plus a status for degraded runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measures {
    pub status: Option<String>,
    entries: Vec<(String, MeasureValue)>,
}

impl Measures {
    fn push(&mut self, name: impl Into<String>, value: MeasureValue) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<MeasureValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MeasureValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Measures {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = self.entries.len() + usize::from(self.status.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(status) = &self.status {
            map.serialize_entry("status", status)?;
        }
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Character and revision totals over a token stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStats {
    pub inserted_chars: usize,
    pub deleted_chars: usize,
    /// Number of delete tokens.
    pub revision_count: usize,
    /// Concatenation of every inserted text, in order.
    pub produced_text: String,
}

impl TokenStats {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut stats = Self::default();
        for token in tokens {
            match &token.kind {
                TokenKind::Text { value, .. } => {
                    stats.inserted_chars += value.chars().count();
                    stats.produced_text.push_str(value);
                }
                TokenKind::Delete { count, .. } if *count > 0 => {
                    stats.deleted_chars += count;
                    stats.revision_count += 1;
                }
                _ => {}
            }
        }
        stats
    }
}

/// Mean characters per P-burst: text between pauses of at least
/// `criteria_seconds`. Markers and shorter pauses do not break a burst.
#[allow(clippy::cast_precision_loss)]
pub fn p_burst_chars(tokens: &[Token], criteria_seconds: f64) -> Option<f64> {
    let mut bursts: Vec<usize> = Vec::new();
    let mut current = 0;
    let mut started = false;
    for token in tokens {
        match &token.kind {
            TokenKind::Marker { .. } => {}
            TokenKind::Pause { seconds } if *seconds >= criteria_seconds => {
                if started {
                    bursts.push(current);
                }
                current = 0;
                started = false;
            }
            TokenKind::Text { value, .. } => {
                current += value.chars().count();
                started = true;
            }
            _ => started = true,
        }
    }
    if started {
        bursts.push(current);
    }
    mean_of(&bursts)
}

/// Mean characters typed between delete tokens.
pub fn r_burst_chars(tokens: &[Token]) -> Option<f64> {
    let mut bursts: Vec<usize> = Vec::new();
    let mut current = 0;
    for token in tokens {
        match &token.kind {
            TokenKind::Delete { .. } => {
                bursts.push(current);
                current = 0;
            }
            TokenKind::Text { value, .. } => current += value.chars().count(),
            _ => {}
        }
    }
    if current > 0 {
        bursts.push(current);
    }
    mean_of(&bursts)
}

/// Mean span (seconds) between consecutive boundaries inside
/// `[start, end]`, including the spans from `start` and to `end`.
fn mean_span_seconds(
    boundaries: impl IntoIterator<Item = (i64, i64)>,
    start: i64,
    end: i64,
) -> Option<f64> {
    if end <= start {
        return None;
    }
    let mut spans = Vec::new();
    let mut current = start;
    for (open, close) in boundaries {
        if open >= current {
            spans.push(seconds_between(current, open));
        }
        current = close;
    }
    if end >= current {
        spans.push(seconds_between(current, end));
    }
    mean_f64(&spans)
}

#[allow(clippy::cast_precision_loss)]
fn seconds_between(from: i64, to: i64) -> f64 {
    to.saturating_sub(from) as f64 / 1000.0
}

#[allow(clippy::cast_precision_loss)]
fn mean_of(values: &[usize]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<usize>() as f64 / values.len() as f64)
}

#[allow(clippy::cast_precision_loss)]
fn mean_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn keydowns(log: &EventLog) -> impl Iterator<Item = (i64, KeyRecord)> + '_ {
    log.key.iter().filter_map(|(&ts, payload)| {
        KeyRecord::parse(payload)
            .filter(|r| r.action == KeyAction::KeyDown)
            .map(|r| (ts, r))
    })
}

/// Median gap (seconds) between consecutive keydowns that are both single
/// alphanumeric characters.
pub fn transition_time_median(log: &EventLog) -> Option<f64> {
    let mut gaps = Vec::new();
    let mut previous: Option<(i64, bool)> = None;
    for (ts, record) in keydowns(log) {
        let in_word = KeyClass::classify(record.label.trim()).is_alphanumeric();
        if let Some((prev_ts, prev_in_word)) = previous {
            if prev_in_word && in_word {
                gaps.push(seconds_between(prev_ts, ts));
            }
        }
        previous = Some((ts, in_word));
    }
    median(&gaps)
}

/// Pause counts per location bucket, in [`PauseLocation::ALL`] order.
pub fn pause_locations(log: &EventLog, pauses: &[Pause]) -> [usize; 6] {
    let mut counts = [0; 6];
    for pause in pauses {
        let text = log
            .text
            .range(..=pause.start)
            .next_back()
            .map_or("", |(_, t)| t.as_str());
        let cursor = log
            .cursor
            .range(..=pause.start)
            .next_back()
            .and_then(|(_, c)| CursorRange::parse(c))
            .map(|c| c.start);
        let location = PauseLocation::classify(text, cursor);
        if let Some(slot) = PauseLocation::ALL.iter().position(|l| *l == location) {
            counts[slot] += 1;
        }
    }
    counts
}

/// Everything the measure table is built from.
#[derive(Debug, Default)]
struct Inputs {
    writing_ms: i64,
    produced: TextProfile,
    final_text: TextProfile,
    stats: TokenStats,
    pause_seconds: f64,
    locations: [usize; 6],
    p_burst_chars: Option<f64>,
    p_burst_seconds: Option<f64>,
    r_burst_chars: Option<f64>,
    r_burst_seconds: Option<f64>,
    transition: Option<f64>,
}

/// Computes all measures for a log and its token stream.
///
/// If `linearization` was built with a pause threshold above the pause
/// criterion, P-bursts are counted on a stream rebuilt at the criterion.
pub fn compute_measures(
    log: &EventLog,
    linearization: &Linearization,
    config: &EngineConfig,
) -> Measures {
    let criteria = config.pause_criteria();
    let (Some(&first), Some(&last)) = (log.text.keys().next(), log.text.keys().next_back()) else {
        tracing::debug!("no text records, measures unavailable");
        let mut measures = build(&Inputs::default(), criteria);
        for (_, value) in &mut measures.entries {
            *value = MeasureValue::Absent;
        }
        measures.status = Some(NO_TEXT_STATUS.to_string());
        return measures;
    };

    let pauses = find_pauses(&log.all_timestamps(), criteria);
    let p_burst_chars = if linearization.pause_threshold_seconds > criteria {
        let rebuilt = linearize(log, &config.with_pause_threshold(criteria));
        p_burst_chars(&rebuilt.tokens, criteria)
    } else {
        p_burst_chars(&linearization.tokens, criteria)
    };
    let deletes = keydowns(log)
        .filter(|(_, r)| matches!(r.class(), KeyClass::EditControl(_)))
        .map(|(ts, _)| (ts, ts));

    let stats = TokenStats::from_tokens(&linearization.tokens);
    let inputs = Inputs {
        writing_ms: last.saturating_sub(first),
        produced: TextProfile::of(&stats.produced_text),
        final_text: TextProfile::of(log.final_text()),
        pause_seconds: pauses.iter().map(|p| p.seconds).sum(),
        locations: pause_locations(log, &pauses),
        p_burst_chars,
        p_burst_seconds: mean_span_seconds(pauses.iter().map(|p| (p.start, p.end)), first, last),
        r_burst_chars: r_burst_chars(&linearization.tokens),
        r_burst_seconds: mean_span_seconds(deletes, first, last),
        transition: transition_time_median(log),
        stats,
    };
    let measures = build(&inputs, criteria);
    tracing::debug!(
        measure_count = measures.len(),
        pause_count = pauses.len(),
        criteria,
        "measures computed"
    );
    measures
}

#[allow(clippy::cast_precision_loss)]
fn build(inputs: &Inputs, criteria: f64) -> Measures {
    let mut m = Measures::default();
    let num = |v: usize| MeasureValue::Number(v as f64);
    let opt = |v: Option<f64>| v.map_or(MeasureValue::Absent, MeasureValue::Number);
    let thresholded = |value: Option<f64>| MeasureValue::Thresholded {
        threshold_sec: criteria,
        value,
    };
    let ratio = |a: usize, b: usize| {
        if b == 0 {
            MeasureValue::Number(0.0)
        } else {
            MeasureValue::Number(a as f64 / b as f64)
        }
    };

    let seconds = inputs.writing_ms as f64 / 1000.0;
    let minutes = seconds / 60.0;
    let per_minute = |v: usize| {
        if minutes > 0.0 {
            MeasureValue::Number(v as f64 / minutes)
        } else {
            MeasureValue::Number(0.0)
        }
    };

    m.push("writing_time_ms", MeasureValue::Number(inputs.writing_ms as f64));
    m.push("writing_time_seconds", MeasureValue::Number(seconds));
    m.push("writing_time_minutes", MeasureValue::Number(minutes));

    for (prefix, profile) in [("produced", &inputs.produced), ("final", &inputs.final_text)] {
        m.push(format!("{prefix}_chars"), num(profile.chars));
        m.push(format!("{prefix}_words"), num(profile.words));
        m.push(format!("{prefix}_word_length_mean"), MeasureValue::Number(profile.word_length.mean));
        m.push(format!("{prefix}_word_length_sd"), MeasureValue::Number(profile.word_length.sd));
        m.push(format!("{prefix}_sentences"), num(profile.sentences));
        m.push(format!("{prefix}_sentence_chars_mean"), MeasureValue::Number(profile.sentence_chars.mean));
        m.push(format!("{prefix}_sentence_chars_sd"), MeasureValue::Number(profile.sentence_chars.sd));
        m.push(format!("{prefix}_sentence_words_mean"), MeasureValue::Number(profile.sentence_words.mean));
        m.push(format!("{prefix}_sentence_words_sd"), MeasureValue::Number(profile.sentence_words.sd));
        m.push(format!("{prefix}_paragraphs"), num(profile.paragraphs));
        m.push(format!("{prefix}_paragraph_chars_mean"), MeasureValue::Number(profile.paragraph_chars.mean));
        m.push(format!("{prefix}_paragraph_chars_sd"), MeasureValue::Number(profile.paragraph_chars.sd));
        m.push(format!("{prefix}_paragraph_words_mean"), MeasureValue::Number(profile.paragraph_words.mean));
        m.push(format!("{prefix}_paragraph_words_sd"), MeasureValue::Number(profile.paragraph_words.sd));
    }

    let stats = &inputs.stats;
    m.push("inserted_characters", num(stats.inserted_chars));
    m.push("deleted_characters", num(stats.deleted_chars));
    m.push("produced_characters", num(stats.inserted_chars));
    m.push("revision_count", num(stats.revision_count));
    m.push("deleted_to_inserted_ratio", ratio(stats.deleted_chars, stats.inserted_chars));
    m.push("final_to_produced_ratio", ratio(inputs.final_text.chars, stats.inserted_chars));

    m.push("flow_online_chars_per_min", per_minute(stats.inserted_chars));
    m.push("flow_online_words_per_min", per_minute(inputs.produced.words));
    m.push("flow_offline_chars_per_min", per_minute(inputs.final_text.chars));
    m.push("flow_offline_words_per_min", per_minute(inputs.final_text.words));

    let pause_fraction = if seconds > 0.0 {
        inputs.pause_seconds / seconds
    } else {
        0.0
    };
    m.push("pause_percentage", thresholded(Some(pause_fraction)));
    for (location, count) in PauseLocation::ALL.iter().zip(inputs.locations) {
        let name = match location {
            PauseLocation::BeforeWord => "pauses_before_words",
            PauseLocation::WithinWord => "pauses_within_words",
            PauseLocation::AfterWord => "pauses_after_words",
            PauseLocation::BetweenWords => "pauses_between_words",
            PauseLocation::BetweenSentences => "pauses_between_sentences",
            PauseLocation::Unknown => "pauses_unknown_location",
        };
        m.push(name, thresholded(Some(count as f64)));
    }

    m.push("p_burst_chars_mean", thresholded(inputs.p_burst_chars));
    m.push("p_burst_seconds_mean", thresholded(inputs.p_burst_seconds));
    m.push("r_burst_chars_mean", opt(inputs.r_burst_chars));
    m.push("r_burst_seconds_mean", opt(inputs.r_burst_seconds));
    m.push("transition_time_median", opt(inputs.transition));

    for name in UNDETERMINED {
        m.push(name, MeasureValue::Undetermined);
    }
    m
}
