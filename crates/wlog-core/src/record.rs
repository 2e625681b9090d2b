//! The raw capture log: five timestamp-keyed record maps.
//!
//! Timestamps are integer milliseconds and unique within a map. Records are
//! deserialized leniently: a non-numeric key or a non-scalar payload drops
//! that one record and leaves the rest of the log intact.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// The four record families a capture surface writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Text,
    Cursor,
    Key,
    Scroll,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Cursor => "cursor",
            Self::Key => "key",
            Self::Scroll => "scroll",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" | "text_records" => Ok(Self::Text),
            "cursor" | "cursor_records" => Ok(Self::Cursor),
            "key" | "key_records" => Ok(Self::Key),
            "scroll" | "scroll_records" => Ok(Self::Scroll),
            _ => Err(UnknownRecordKind(s.to_string())),
        }
    }
}

/// Error type for unknown record family names.
#[derive(Debug, Clone)]
pub struct UnknownRecordKind(String);

impl fmt::Display for UnknownRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown record kind: {}", self.0)
    }
}

impl std::error::Error for UnknownRecordKind {}

/// Session boundaries written by the capture surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default, deserialize_with = "lenient_time")]
    pub starttime: Option<i64>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub endtime: Option<i64>,
}

/// A complete capture log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    #[serde(
        default,
        rename = "header_records",
        alias = "header",
        deserialize_with = "lenient_header"
    )]
    pub header: Header,

    #[serde(
        default,
        rename = "text_records",
        alias = "text",
        deserialize_with = "lenient_records"
    )]
    pub text: BTreeMap<i64, String>,

    #[serde(
        default,
        rename = "cursor_records",
        alias = "cursor",
        deserialize_with = "lenient_records"
    )]
    pub cursor: BTreeMap<i64, String>,

    #[serde(
        default,
        rename = "key_records",
        alias = "key",
        deserialize_with = "lenient_records"
    )]
    pub key: BTreeMap<i64, String>,

    #[serde(
        default,
        rename = "scroll_records",
        alias = "scroll",
        deserialize_with = "lenient_records"
    )]
    pub scroll: BTreeMap<i64, String>,
}

impl EventLog {
    /// Parses a log from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, LogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a log from a reader.
    pub fn from_reader(reader: impl Read) -> Result<Self, LogError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serializes the log as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, LogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the record map for one family.
    #[must_use]
    pub const fn records(&self, kind: RecordKind) -> &BTreeMap<i64, String> {
        match kind {
            RecordKind::Text => &self.text,
            RecordKind::Cursor => &self.cursor,
            RecordKind::Key => &self.key,
            RecordKind::Scroll => &self.scroll,
        }
    }

    const fn records_mut(&mut self, kind: RecordKind) -> &mut BTreeMap<i64, String> {
        match kind {
            RecordKind::Text => &mut self.text,
            RecordKind::Cursor => &mut self.cursor,
            RecordKind::Key => &mut self.key,
            RecordKind::Scroll => &mut self.scroll,
        }
    }

    /// Stores a record, bumping the timestamp forward until it is free.
    ///
    /// Returns the timestamp actually used.
    pub fn record(&mut self, kind: RecordKind, ts: i64, payload: impl Into<String>) -> i64 {
        let records = self.records_mut(kind);
        let mut slot = ts;
        while records.contains_key(&slot) {
            match slot.checked_add(1) {
                Some(next) => slot = next,
                None => break,
            }
        }
        records.insert(slot, payload.into());
        slot
    }

    /// Text of the last snapshot, or empty when there are none.
    #[must_use]
    pub fn final_text(&self) -> &str {
        self.text.values().next_back().map_or("", String::as_str)
    }

    /// Session start: header start time, else the first text snapshot.
    #[must_use]
    pub fn session_start(&self) -> Option<i64> {
        self.header
            .starttime
            .or_else(|| self.text.keys().next().copied())
    }

    /// Session end: header end time, else the last text snapshot.
    #[must_use]
    pub fn session_end(&self) -> Option<i64> {
        self.header
            .endtime
            .or_else(|| self.text.keys().next_back().copied())
    }

    /// Sorted, de-duplicated timestamps across all four record families.
    #[must_use]
    pub fn all_timestamps(&self) -> Vec<i64> {
        let mut times: Vec<i64> = [&self.text, &self.cursor, &self.key, &self.scroll]
            .into_iter()
            .flat_map(|records| records.keys().copied())
            .collect();
        times.sort_unstable();
        times.dedup();
        times
    }

    /// Total number of records across all families.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.text.len() + self.cursor.len() + self.key.len() + self.scroll.len()
    }
}

/// Parses a timestamp from a map key or a header value.
///
/// Accepts integers and integral floats; anything else is rejected.
pub(crate) fn parse_timestamp(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(ts) = trimmed.parse::<i64>() {
        return Some(ts);
    }
    let value = trimmed.parse::<f64>().ok()?;
    timestamp_from_f64(value)
}

#[allow(clippy::cast_possible_truncation)]
fn timestamp_from_f64(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(value as i64)
    } else {
        None
    }
}

fn time_from_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(timestamp_from_f64)),
        serde_json::Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

fn lenient_time<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(time_from_value))
}

fn lenient_header<'de, D>(deserializer: D) -> Result<Header, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::Object(fields)) = value else {
        return Ok(Header::default());
    };
    Ok(Header {
        starttime: fields.get("starttime").and_then(time_from_value),
        endtime: fields.get("endtime").and_then(time_from_value),
    })
}

fn lenient_records<'de, D>(deserializer: D) -> Result<BTreeMap<i64, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    let mut records = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let Some(ts) = parse_timestamp(&key) else {
            tracing::debug!(key = %key, "skipping record with non-numeric timestamp");
            continue;
        };
        let payload = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                tracing::debug!(ts, payload = %other, "skipping record with non-scalar payload");
                continue;
            }
        };
        records.insert(ts, payload);
    }
    Ok(records)
}
