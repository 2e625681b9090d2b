//! Plain-text diagnostic export of a log and its reconciliation.

use std::collections::btree_map;
use std::io::Write;
use std::iter::Peekable;

use serde::Serialize;

use crate::diff::{DiffOp, EditRegion};
use crate::error::LogError;
use crate::index::SnapshotIndex;
use crate::key::CursorRange;
use crate::reconcile::Linearization;
use crate::record::EventLog;
use crate::token::{Reconstruction, Token};

pub const EXPORTER_VERSION: &str = "wlog-diffs-v1";
const FORMAT_LINE: &str = r#"format: prevCursor firstEq currCursor (op,"text") | CURSOR pos"#;

/// Identification lines written at the top of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportHeader {
    pub note_id: String,
    pub title: String,
    /// RFC 3339 timestamp, supplied by the caller.
    pub exported_at: String,
}

/// One row of the step-through view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub index: usize,
    pub token: String,
    pub actual: String,
    pub reconstructed: String,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} | actual:{} | reconstructed:{}",
            self.index, self.token, self.actual, self.reconstructed
        )
    }
}

/// Applies tokens one by one, recording the reconstruction after each.
pub fn steps(tokens: &[Token]) -> Vec<Step> {
    let mut state = Reconstruction::default();
    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            state.apply(token);
            Step {
                index,
                token: token.to_string(),
                actual: token.actual_text.clone(),
                reconstructed: state.text.clone(),
            }
        })
        .collect()
}

/// Snapshot-to-snapshot diff lines interleaved with `CURSOR` lines.
///
/// Each diff line reads `prevCursor firstEq currCursor (op,"text")...`, where
/// `prevCursor` is where the previous edit left the caret and `currCursor` is
/// the cursor start recorded at or before the snapshot.
pub fn diff_trace(log: &EventLog) -> Vec<String> {
    DiffLines::new(log).collect()
}

/// Lazily yields [`diff_trace`] lines in timestamp order, diffs before
/// cursor lines on equal timestamps.
struct DiffLines<'a> {
    cursors: SnapshotIndex<CursorRange>,
    texts: Peekable<btree_map::Iter<'a, i64, String>>,
    cursor_records: Peekable<btree_map::Iter<'a, i64, String>>,
    previous: &'a str,
    prev_cursor: i64,
}

impl<'a> DiffLines<'a> {
    fn new(log: &'a EventLog) -> Self {
        let (cursors, _) = SnapshotIndex::parse(&log.cursor, CursorRange::parse);
        Self {
            cursors,
            texts: log.text.iter().peekable(),
            cursor_records: log.cursor.iter().peekable(),
            previous: "",
            prev_cursor: 0,
        }
    }

    fn diff_line(&mut self, ts: i64, text: &'a str) -> String {
        let region = EditRegion::between(self.previous, text);
        let ops = region.ops();
        let first_eq = match ops.first() {
            Some(DiffOp::Equal(s)) => s.chars().count(),
            _ => 0,
        };
        let curr_cursor = self.cursors.at_or_before(ts).map_or(0, |e| e.value.start);
        let parts: Vec<String> = ops.iter().map(ToString::to_string).collect();
        let line = format!(
            "{} {first_eq} {curr_cursor} {}",
            self.prev_cursor,
            parts.join(" ")
        );

        self.prev_cursor = caret_after(&ops);
        self.previous = text;
        line
    }
}

impl Iterator for DiffLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let text_first = match (self.texts.peek(), self.cursor_records.peek()) {
            (None, None) => return None,
            (Some((text_ts, _)), Some((cursor_ts, _))) => text_ts <= cursor_ts,
            (Some(_), None) => true,
            (None, Some(_)) => false,
        };
        if text_first {
            let (&ts, text) = self.texts.next()?;
            Some(self.diff_line(ts, text))
        } else {
            let (_, payload) = self.cursor_records.next()?;
            let start = CursorRange::parse(payload).map_or(0, |range| range.start);
            Some(format!("CURSOR {start}"))
        }
    }
}

/// Caret offset implied by a diff: equal runs except a trailing one, plus
/// insertions, minus deletions.
fn caret_after(ops: &[DiffOp<'_>]) -> i64 {
    let last = ops.len().saturating_sub(1);
    ops.iter()
        .enumerate()
        .map(|(i, op)| {
            let len = i64::try_from(op.text().chars().count()).unwrap_or(i64::MAX);
            match op {
                DiffOp::Equal(_) if i == last => 0,
                DiffOp::Equal(_) | DiffOp::Insert(_) => len,
                DiffOp::Delete(_) => -len,
            }
        })
        .sum()
}

/// Writes the full export to `out`, one line at a time.
///
/// Sections: header, `[diffs]`, `[linear_debug]` and `[linear_steps]` (both
/// omitted when empty), then `[logs]` with the pretty-printed log.
pub fn write_export<W: Write>(
    out: &mut W,
    header: &ExportHeader,
    log: &EventLog,
    linearization: &Linearization,
) -> Result<(), LogError> {
    let note_id = if header.note_id.is_empty() {
        "imported"
    } else {
        header.note_id.as_str()
    };
    writeln!(out, "noteId: {note_id}")?;
    writeln!(out, "title: {}", header.title)?;
    writeln!(out, "exportedAt: {}", header.exported_at)?;
    writeln!(out, "{FORMAT_LINE}")?;
    writeln!(out, "exporter: {EXPORTER_VERSION}")?;

    writeln!(out, "[diffs]")?;
    for (i, line) in DiffLines::new(log).enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write!(out, "{line}")?;
    }

    let tokens = &linearization.tokens;
    if !(linearization.debug.is_empty() && tokens.is_empty()) {
        writeln!(out, "\n\n[linear_debug]")?;
        for line in &linearization.debug {
            writeln!(out, "{line}")?;
        }
        for token in tokens {
            writeln!(out, "{}", token.debug_line())?;
        }
    }

    if !tokens.is_empty() {
        writeln!(out, "\n\n[linear_steps]")?;
        let mut state = Reconstruction::default();
        for (index, token) in tokens.iter().enumerate() {
            state.apply(token);
            writeln!(
                out,
                "{index} {token} | actual:{} | reconstructed:{}",
                token.actual_text, state.text
            )?;
        }
    }

    writeln!(out, "\n\n[logs]")?;
    serde_json::to_writer_pretty(&mut *out, log)?;
    writeln!(out)?;
    out.flush()?;
    tracing::debug!(
        note_id,
        token_count = linearization.tokens.len(),
        "wrote diagnostic export"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::reconcile::linearize;
    use crate::record::RecordKind;

    fn sample() -> EventLog {
        let mut log = EventLog::default();
        log.record(RecordKind::Text, 100, "a");
        log.record(RecordKind::Text, 200, "ab");
        log.record(RecordKind::Text, 300, "b");
        log.record(RecordKind::Cursor, 100, "1:1");
        log.record(RecordKind::Cursor, 250, "1:1");
        log
    }

    #[test]
    fn test_diff_trace_interleaves_cursor_lines() {
        insta::assert_snapshot!(diff_trace(&sample()).join("\n"), @r#"
        0 0 1 (1,"a")
        CURSOR 1
        1 1 1 (0,"a") (1,"b")
        CURSOR 1
        2 0 1 (-1,"a") (0,"b")
        "#);
    }

    #[test]
    fn test_caret_skips_trailing_equal() {
        assert_eq!(
            caret_after(&[DiffOp::Equal("ab"), DiffOp::Delete("c"), DiffOp::Equal("d")]),
            1
        );
        assert_eq!(caret_after(&[DiffOp::Equal("abc")]), 0);
        assert_eq!(caret_after(&[]), 0);
    }

    #[test]
    fn test_steps_follow_reconstruction() {
        let log = sample();
        let lin = linearize(&log, &EngineConfig::default());
        let rows = steps(&lin.tokens);
        assert_eq!(rows.len(), lin.tokens.len());
        assert_eq!(
            rows.first().map(ToString::to_string).as_deref(),
            Some("0 <START> | actual: | reconstructed:")
        );
        assert_eq!(rows.last().map(|s| s.reconstructed.as_str()), Some("b"));
    }

    #[test]
    fn test_export_has_all_sections() {
        let log = sample();
        let lin = linearize(&log, &EngineConfig::default());
        let header = ExportHeader {
            note_id: String::new(),
            title: "Essay".to_string(),
            exported_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let mut out = Vec::new();
        write_export(&mut out, &header, &log, &lin).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(
            "noteId: imported\ntitle: Essay\nexportedAt: 2024-01-01T00:00:00Z\nformat: prevCursor firstEq currCursor (op,\"text\") | CURSOR pos\nexporter: wlog-diffs-v1\n[diffs]\n0 0 1 (1,\"a\")\nCURSOR 1\n"
        ));
        assert!(text.contains("\n\n[linear_debug]\n"));
        assert!(text.contains("\n\n[linear_steps]\n0 <START> | actual: | reconstructed:\n"));
        assert!(text.contains("\n\n[logs]\n{\n"));
        assert!(text.ends_with("}\n"));
    }

    /// Keeps every byte and the size of the largest single write.
    #[derive(Default)]
    struct RecordingWriter {
        bytes: Vec<u8>,
        largest_write: usize,
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.largest_write = self.largest_write.max(buf.len());
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_export_writes_line_by_line() {
        let mut log = EventLog::default();
        for i in 1..=300 {
            log.record(RecordKind::Text, i * 100, "a".repeat(usize::try_from(i).unwrap()));
        }
        let lin = linearize(&log, &EngineConfig::default());
        let mut out = RecordingWriter::default();
        write_export(&mut out, &ExportHeader::default(), &log, &lin).unwrap();

        let text = String::from_utf8(out.bytes).unwrap();
        let trace = diff_trace(&log).join("\n");
        assert!(trace.len() > 20_000);
        assert!(text.contains(&format!("[diffs]\n{trace}\n\n[linear_debug]\n")));
        assert!(out.largest_write < 1_000, "largest write {}", out.largest_write);

        let rows: Vec<String> = steps(&lin.tokens).iter().map(ToString::to_string).collect();
        assert!(text.contains(&format!("[linear_steps]\n{}\n\n\n[logs]", rows.join("\n"))));
    }

    #[test]
    fn test_empty_log_omits_linear_sections() {
        let log = EventLog::default();
        let lin = Linearization {
            tokens: Vec::new(),
            debug: Vec::new(),
            mismatches: 0,
            pause_threshold_seconds: 0.0,
        };
        let mut out = Vec::new();
        write_export(&mut out, &ExportHeader::default(), &log, &lin).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("[linear_debug]"));
        assert!(!text.contains("[linear_steps]"));
        assert!(text.contains("[diffs]\n\n\n[logs]\n"));
    }
}
