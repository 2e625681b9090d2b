//! Revision groups: runs of same-kind edits at a continuing location.

use serde::Serialize;

use crate::diff::{EditClass, EditRegion};
use crate::record::EventLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKind {
    Insert,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevisionGroup {
    pub start_ts: i64,
    pub end_ts: i64,
    pub kind: RevisionKind,
}

struct Open {
    start_ts: i64,
    end_ts: i64,
    class: EditClass,
}

/// Groups consecutive snapshot edits.
///
/// A new group starts when the edit class changes, when an insertion or
/// replacement does not begin where the previous edit ended, or when a
/// deletion does not end where the previous edit started. The last group is
/// stretched to the session end. Only insertion and deletion groups are
/// returned, each with `end_ts > start_ts`.
pub fn revision_groups(log: &EventLog) -> Vec<RevisionGroup> {
    let snapshots: Vec<(i64, &str)> = log
        .text
        .iter()
        .filter(|&(&ts, _)| ts > 0)
        .map(|(&ts, text)| (ts, text.as_str()))
        .collect();
    if snapshots.len() < 2 {
        return Vec::new();
    }

    let mut closed = Vec::new();
    let mut current: Option<Open> = None;
    let mut prev_class: Option<EditClass> = None;
    let (mut prev_start, mut prev_end): (Option<usize>, Option<usize>) = (None, None);

    for pair in snapshots.windows(2) {
        let ((_, before), (ts, after)) = (pair[0], pair[1]);
        let region = EditRegion::between(before, after);
        let class = region.class();
        let (start, end) = location(&region, class);

        let new_location = match class {
            EditClass::Insert | EditClass::Replace => start != prev_end,
            EditClass::Delete => end != prev_start,
            EditClass::Unchanged => false,
        };
        let new_group = prev_class != Some(class) || new_location;

        if let Some(open) = current.as_mut() {
            open.end_ts = ts;
        }
        if current.is_none() || new_group {
            closed.extend(current.replace(Open {
                start_ts: ts,
                end_ts: ts,
                class,
            }));
        }

        prev_class = Some(class);
        prev_start = start;
        prev_end = end;
    }

    if let Some(mut last) = current {
        if let Some(session_end) = log.session_end() {
            last.end_ts = last.end_ts.max(session_end);
        }
        closed.push(last);
    }

    let groups: Vec<RevisionGroup> = closed
        .into_iter()
        .filter_map(|open| {
            let kind = match open.class {
                EditClass::Insert => RevisionKind::Insert,
                EditClass::Delete => RevisionKind::Delete,
                EditClass::Replace | EditClass::Unchanged => return None,
            };
            Some(RevisionGroup {
                start_ts: open.start_ts,
                end_ts: if open.end_ts <= open.start_ts {
                    open.start_ts.saturating_add(1)
                } else {
                    open.end_ts
                },
                kind,
            })
        })
        .collect();
    tracing::debug!(group_count = groups.len(), "computed revision groups");
    groups
}

/// Character span touched by an edit; `None` for unchanged text.
fn location(region: &EditRegion, class: EditClass) -> (Option<usize>, Option<usize>) {
    let start = region.position;
    let span = match class {
        EditClass::Insert | EditClass::Replace => region.inserted_len(),
        EditClass::Delete => region.deleted_len(),
        EditClass::Unchanged => return (None, None),
    };
    (Some(start), Some(start + span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;

    fn log_of(texts: &[(i64, &str)]) -> EventLog {
        let mut log = EventLog::default();
        for (ts, text) in texts {
            log.record(RecordKind::Text, *ts, *text);
        }
        log
    }

    fn spans(groups: &[RevisionGroup]) -> Vec<(i64, i64, RevisionKind)> {
        groups.iter().map(|g| (g.start_ts, g.end_ts, g.kind)).collect()
    }

    #[test]
    fn test_continuous_typing_is_one_group() {
        let log = log_of(&[(1, ""), (10, "a"), (20, "ab"), (30, "abc")]);
        assert_eq!(
            spans(&revision_groups(&log)),
            vec![(10, 30, RevisionKind::Insert)]
        );
    }

    #[test]
    fn test_backspacing_run_is_one_delete_group() {
        let log = log_of(&[
            (1, "abc"),
            (10, "abcd"),
            (20, "abc"),
            (30, "ab"),
            (40, "abX"),
        ]);
        assert_eq!(
            spans(&revision_groups(&log)),
            vec![
                (10, 20, RevisionKind::Insert),
                (20, 40, RevisionKind::Delete),
                (40, 41, RevisionKind::Insert),
            ]
        );
    }

    #[test]
    fn test_jumping_elsewhere_starts_a_new_group() {
        let log = log_of(&[(1, "ab"), (10, "abc"), (20, "Xabc")]);
        assert_eq!(
            spans(&revision_groups(&log)),
            vec![
                (10, 20, RevisionKind::Insert),
                (20, 21, RevisionKind::Insert),
            ]
        );
    }

    #[test]
    fn test_last_group_reaches_session_end() {
        let mut log = log_of(&[(1, ""), (10, "a")]);
        log.header.endtime = Some(500);
        assert_eq!(
            spans(&revision_groups(&log)),
            vec![(10, 500, RevisionKind::Insert)]
        );
    }

    #[test]
    fn test_replacements_and_zero_timestamps_are_dropped() {
        let log = log_of(&[(0, "x"), (1, "ab"), (10, "aX")]);
        assert!(revision_groups(&log).is_empty());
        assert!(revision_groups(&log_of(&[(5, "a")])).is_empty());
    }
}
