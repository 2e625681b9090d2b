//! Turns the raw record maps into indexed snapshots and one ordered stream of
//! activity events.

use serde::Serialize;

use crate::index::{Entry, SnapshotIndex};
use crate::key::{CursorRange, KeyAction, KeyClass, KeyRecord, NavCode};
use crate::record::EventLog;

/// A classified key record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub ts: i64,
    pub action: KeyAction,
    pub label: String,
    pub class: KeyClass,
}

/// What happened at one instant, as far as the reconciler cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    /// Arrow or Enter keydown.
    #[serde(rename = "navkey")]
    NavKey { code: NavCode, label: String },
    /// Cursor record with a non-empty range.
    Selection { start: usize, end: usize },
    /// Cursor record with a collapsed range.
    Nav { position: usize },
    /// Any other non-modifier keydown; its effect is resolved against
    /// snapshots.
    Key {
        label: String,
        #[serde(skip)]
        class: KeyClass,
    },
}

impl ActivityKind {
    /// Tie-break order for events sharing a timestamp.
    const fn priority(&self) -> u8 {
        match self {
            Self::NavKey { .. } => 0,
            Self::Selection { .. } => 1,
            Self::Nav { .. } => 2,
            Self::Key { .. } => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub ts: i64,
    #[serde(flatten)]
    pub kind: ActivityKind,
}

/// Normalizer output shared by the reconciliation passes.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub texts: SnapshotIndex<String>,
    pub cursors: SnapshotIndex<CursorRange>,
    /// All parsed key events except modifiers, sorted by time.
    pub keys: Vec<KeyEvent>,
    /// Merged activity stream, sorted by time then priority.
    pub activities: Vec<Activity>,
    /// Records dropped because their payload did not parse.
    pub skipped: usize,
    nav_downs: SnapshotIndex<()>,
    nav_fuzz_ms: i64,
}

impl Normalized {
    /// Whether a navigation keydown lies within the fuzz window of `ts`.
    pub fn nav_down_near(&self, ts: i64) -> bool {
        self.nav_downs.any_within(ts, self.nav_fuzz_ms)
    }
}

/// Normalizes a log.
pub fn normalize(log: &EventLog, nav_fuzz_ms: i64) -> Normalized {
    let nav_fuzz_ms = nav_fuzz_ms.max(0);
    let texts = SnapshotIndex::new(
        log.text
            .iter()
            .map(|(&ts, value)| Entry {
                ts,
                value: value.clone(),
            })
            .collect(),
    );
    let (cursors, cursor_skipped) = SnapshotIndex::parse(&log.cursor, CursorRange::parse);

    let mut key_skipped = 0;
    let mut keys = Vec::new();
    for (&ts, payload) in &log.key {
        let Some(record) = KeyRecord::parse(payload) else {
            tracing::debug!(ts, payload = %payload, "skipping malformed key record");
            key_skipped += 1;
            continue;
        };
        let class = record.class();
        if class == KeyClass::Modifier {
            continue;
        }
        keys.push(KeyEvent {
            ts,
            action: record.action,
            label: record.label,
            class,
        });
    }

    let nav_downs = SnapshotIndex::new(
        keys.iter()
            .filter(|k| k.action.is_press() && matches!(k.class, KeyClass::Navigation(_)))
            .map(|k| Entry { ts: k.ts, value: () })
            .collect(),
    );

    let mut normalized = Normalized {
        texts,
        cursors,
        keys,
        activities: Vec::new(),
        skipped: cursor_skipped + key_skipped,
        nav_downs,
        nav_fuzz_ms,
    };
    normalized.activities = merge_activities(&normalized);

    tracing::debug!(
        text_count = normalized.texts.len(),
        cursor_count = normalized.cursors.len(),
        key_count = normalized.keys.len(),
        activity_count = normalized.activities.len(),
        skipped = normalized.skipped,
        "normalized log"
    );
    normalized
}

fn merge_activities(normalized: &Normalized) -> Vec<Activity> {
    let mut activities: Vec<Activity> = normalized
        .keys
        .iter()
        .filter(|k| k.action.is_press())
        .map(|k| Activity {
            ts: k.ts,
            kind: match k.class {
                KeyClass::Navigation(code) => ActivityKind::NavKey {
                    code,
                    label: k.label.clone(),
                },
                _ => ActivityKind::Key {
                    label: k.label.clone(),
                    class: k.class,
                },
            },
        })
        .collect();

    activities.extend(cursor_activities(normalized));
    // Stable sort keeps key order within equal (ts, priority)
    activities.sort_by_key(|a| (a.ts, a.kind.priority()));
    activities
}

/// Cursor records the keys and snapshots do not already explain.
fn cursor_activities(normalized: &Normalized) -> Vec<Activity> {
    let mut activities = Vec::new();
    let mut previous: Option<CursorRange> = None;
    for entry in normalized.cursors.entries() {
        // Echo of an input event
        if normalized.texts.at_or_before(entry.ts).is_some_and(|t| t.ts == entry.ts) {
            continue;
        }
        if previous == Some(entry.value) {
            continue;
        }
        previous = Some(entry.value);
        if normalized.nav_down_near(entry.ts) {
            continue;
        }
        let range = entry.value;
        let kind = if range.is_selection() {
            ActivityKind::Selection {
                start: range.start,
                end: range.end,
            }
        } else {
            ActivityKind::Nav {
                position: range.start,
            }
        };
        activities.push(Activity { ts: entry.ts, kind });
    }
    activities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;

    fn log_with(records: &[(RecordKind, i64, &str)]) -> EventLog {
        let mut log = EventLog::default();
        for &(kind, ts, payload) in records {
            log.record(kind, ts, payload);
        }
        log
    }

    fn kinds(normalized: &Normalized) -> Vec<(i64, &'static str)> {
        normalized
            .activities
            .iter()
            .map(|a| {
                let name = match a.kind {
                    ActivityKind::NavKey { .. } => "navkey",
                    ActivityKind::Selection { .. } => "selection",
                    ActivityKind::Nav { .. } => "nav",
                    ActivityKind::Key { .. } => "key",
                };
                (a.ts, name)
            })
            .collect()
    }

    #[test]
    fn test_drops_modifiers_and_releases() {
        let log = log_with(&[
            (RecordKind::Key, 10, "keydown: Shift"),
            (RecordKind::Key, 20, "keydown: A"),
            (RecordKind::Key, 30, "keyup: A"),
            (RecordKind::Key, 40, "keyup: Shift"),
        ]);
        let normalized = normalize(&log, 30);
        assert_eq!(normalized.keys.len(), 2);
        assert_eq!(kinds(&normalized), vec![(20, "key")]);
    }

    #[test]
    fn test_repeat_events_drive_activity() {
        let log = log_with(&[(RecordKind::Key, 10, "repeat: Backspace")]);
        let normalized = normalize(&log, 30);
        assert_eq!(kinds(&normalized), vec![(10, "key")]);
    }

    #[test]
    fn test_counts_malformed_records() {
        let log = log_with(&[
            (RecordKind::Key, 10, "garbage"),
            (RecordKind::Cursor, 20, "x:y"),
            (RecordKind::Cursor, 30, "1:1"),
        ]);
        let normalized = normalize(&log, 30);
        assert_eq!(normalized.skipped, 2);
        assert_eq!(normalized.cursors.len(), 1);
    }

    #[test]
    fn test_cursor_echo_of_text_record_is_dropped() {
        let log = log_with(&[
            (RecordKind::Text, 100, "a"),
            (RecordKind::Cursor, 100, "1:1"),
            (RecordKind::Cursor, 200, "0:0"),
        ]);
        let normalized = normalize(&log, 30);
        assert_eq!(kinds(&normalized), vec![(200, "nav")]);
    }

    #[test]
    fn test_consecutive_identical_cursors_collapse() {
        let log = log_with(&[
            (RecordKind::Cursor, 100, "2:2"),
            (RecordKind::Cursor, 200, "2:2"),
            (RecordKind::Cursor, 300, "0:2"),
        ]);
        let normalized = normalize(&log, 30);
        assert_eq!(kinds(&normalized), vec![(100, "nav"), (300, "selection")]);
    }

    #[test]
    fn test_cursor_near_navigation_key_is_explained_by_it() {
        let log = log_with(&[
            (RecordKind::Key, 1000, "keydown: ArrowLeft"),
            (RecordKind::Cursor, 1020, "4:4"),
            (RecordKind::Cursor, 1100, "3:3"),
        ]);
        let normalized = normalize(&log, 30);
        assert!(normalized.nav_down_near(1020));
        assert!(!normalized.nav_down_near(1100));
        assert_eq!(kinds(&normalized), vec![(1000, "navkey"), (1100, "nav")]);
    }

    #[test]
    fn test_ties_order_by_priority() {
        let log = log_with(&[
            (RecordKind::Key, 500, "keydown: x"),
            (RecordKind::Cursor, 500, "1:3"),
        ]);
        let normalized = normalize(&log, 0);
        assert_eq!(kinds(&normalized), vec![(500, "selection"), (500, "key")]);
    }

    #[test]
    fn test_navigation_keys_map_to_codes() {
        let log = log_with(&[(RecordKind::Key, 5, "keydown: Enter")]);
        let normalized = normalize(&log, 30);
        assert_eq!(
            normalized.activities[0].kind,
            ActivityKind::NavKey {
                code: NavCode::Cr,
                label: "Enter".to_string()
            }
        );
    }
}
