//! Linear rendering built from key records alone.
//!
//! Unlike [`crate::reconcile`], this view never looks at text snapshots: what
//! you see is what the keyboard reported.

use std::fmt;

use serde::Serialize;

use crate::key::{KeyAction, KeyRecord, NavCode};
use crate::record::EventLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    Delete,
    Nav,
    Marker,
}

impl TagCategory {
    fn of(tag: &str) -> Self {
        match tag {
            "DELETE" => Self::Delete,
            "SEL" | "LEFT" | "RIGHT" | "UP" | "DOWN" => Self::Nav,
            _ => Self::Marker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeystrokeToken {
    Pause { seconds: f64 },
    Text { value: String },
    Tag {
        label: String,
        count: u32,
        category: TagCategory,
    },
}

impl fmt::Display for KeystrokeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pause { seconds } => write!(f, "<{seconds:.2}>"),
            Self::Text { value } => write!(f, "{}", value.replace(' ', "<SPACE>")),
            Self::Tag { label, count, .. } if *count > 1 => write!(f, "<{label}{count}>"),
            Self::Tag { label, .. } => write!(f, "<{label}>"),
        }
    }
}

fn push(tokens: &mut Vec<KeystrokeToken>, token: KeystrokeToken) {
    if let (
        Some(KeystrokeToken::Tag { label, count, .. }),
        KeystrokeToken::Tag {
            label: next_label, ..
        },
    ) = (tokens.last_mut(), &token)
    {
        if *label == *next_label {
            *count += 1;
            return;
        }
    }
    tokens.push(token);
}

fn tag(label: String) -> KeystrokeToken {
    let category = TagCategory::of(&label);
    KeystrokeToken::Tag {
        label,
        count: 1,
        category,
    }
}

/// Linearizes the key records of `log`.
///
/// A pause is emitted when the gap from the previous key record to a keydown
/// is strictly greater than `threshold_seconds`.
pub fn keystroke_linear(log: &EventLog, threshold_seconds: f64) -> Vec<KeystrokeToken> {
    let threshold = if threshold_seconds.is_finite() {
        threshold_seconds.max(0.0)
    } else {
        0.0
    };
    let mut tokens = Vec::new();
    let mut last_ts: Option<i64> = None;
    let mut shift = false;

    for (&ts, payload) in &log.key {
        let Some(record) = KeyRecord::parse(payload) else {
            tracing::debug!(ts, payload = %payload, "skipping unparseable key record");
            continue;
        };
        let keydown = record.action == KeyAction::KeyDown;

        if let (true, Some(last)) = (keydown, last_ts) {
            #[allow(clippy::cast_precision_loss)]
            let seconds = ts.saturating_sub(last) as f64 / 1000.0;
            if seconds > threshold {
                push(&mut tokens, KeystrokeToken::Pause { seconds });
            }
        }
        last_ts = Some(ts);

        if record.action == KeyAction::KeyUp && record.label.contains("Shift") {
            shift = false;
            continue;
        }
        if !keydown {
            continue;
        }
        if record.label == "Shift" {
            shift = true;
            continue;
        }
        if record.label.chars().count() == 1 {
            push(&mut tokens, KeystrokeToken::Text { value: record.label });
            continue;
        }

        let label = match NavCode::from_label(&record.label) {
            Some(NavCode::Cr) => record.label.to_uppercase(),
            Some(_) if shift => "SEL".to_string(),
            Some(code) => code.as_str().to_string(),
            None => match record.label.to_uppercase().as_str() {
                "BACKSPACE" | "DELETE" => "DELETE".to_string(),
                other => other.to_string(),
            },
        };
        push(&mut tokens, tag(label));
    }
    tokens
}

pub fn render(tokens: &[KeystrokeToken]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}
