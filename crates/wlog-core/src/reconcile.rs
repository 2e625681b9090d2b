//! Reconciliation of activity events against text snapshots.
//!
//! The reconciler walks the merged activity stream in order, keeping a
//! reconstruction of the document. Before each event it corrects the
//! reconstruction toward the latest snapshot ("catch-up"); each key is then
//! resolved by diffing the snapshots around it. Snapshots remain the ground
//! truth: any disagreement after an event is recorded as a mismatch and the
//! next catch-up re-aligns.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::diff::{Edit, EditRegion};
use crate::index::SnapshotIndex;
use crate::key::{CursorRange, EditKey, KeyClass, NavCode};
use crate::normalize::{Activity, ActivityKind, normalize};
use crate::record::EventLog;
use crate::token::{Marker, Reconstruction, Token, TokenKind, TokenStream};

/// Output of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Linearization {
    pub tokens: Vec<Token>,
    pub debug: Vec<String>,
    pub mismatches: usize,
    pub pause_threshold_seconds: f64,
}

impl Linearization {
    /// One-line summary: `keys: N | cursor: N | tokens: N | mismatches: N | pause>=X.XXs`.
    pub fn status_line(&self, log: &EventLog) -> String {
        format!(
            "keys: {} | cursor: {} | tokens: {} | mismatches: {} | pause>={:.2}s",
            log.key.len(),
            log.cursor.len(),
            self.tokens.len(),
            self.mismatches,
            self.pause_threshold_seconds
        )
    }

    /// Tokens rendered as one string.
    pub fn rendered(&self) -> String {
        crate::token::render(&self.tokens)
    }
}

/// Builds the canonical token stream for a log.
pub fn linearize(log: &EventLog, config: &EngineConfig) -> Linearization {
    let threshold = config.pause_threshold();
    let normalized = normalize(log, config.nav_fuzz());

    let (Some(first), Some(last)) = (normalized.texts.first(), normalized.texts.last()) else {
        tracing::debug!("log has no text records, nothing to reconcile");
        return Linearization {
            tokens: Vec::new(),
            debug: vec!["no text records".to_string()],
            mismatches: 0,
            pause_threshold_seconds: threshold,
        };
    };
    let start = log.header.starttime.unwrap_or(first.ts);
    let end = log.header.endtime.unwrap_or(last.ts);

    let mut run = Reconciler::new(&normalized.texts, &normalized.cursors, threshold, start);
    run.emit(Token::bare(TokenKind::Marker {
        marker: Marker::Start,
    }));
    for activity in &normalized.activities {
        run.step(activity);
    }
    run.finish(end);

    let linearization = Linearization {
        tokens: run.tokens.into_tokens(),
        debug: run.debug,
        mismatches: run.mismatches,
        pause_threshold_seconds: threshold,
    };
    tracing::debug!(
        event_count = normalized.activities.len(),
        token_count = linearization.tokens.len(),
        mismatches = linearization.mismatches,
        "reconciliation complete"
    );
    if linearization.mismatches > 0 {
        tracing::warn!(
            mismatches = linearization.mismatches,
            "reconstruction diverged from snapshots"
        );
    }
    linearization
}

struct Reconciler<'a> {
    texts: &'a SnapshotIndex<String>,
    cursors: &'a SnapshotIndex<CursorRange>,
    threshold: f64,
    tokens: TokenStream,
    debug: Vec<String>,
    mismatches: usize,
    state: Reconstruction,
    last_time: i64,
}

impl<'a> Reconciler<'a> {
    fn new(
        texts: &'a SnapshotIndex<String>,
        cursors: &'a SnapshotIndex<CursorRange>,
        threshold: f64,
        start: i64,
    ) -> Self {
        Self {
            texts,
            cursors,
            threshold,
            tokens: TokenStream::default(),
            debug: Vec::new(),
            mismatches: 0,
            state: Reconstruction::default(),
            last_time: start,
        }
    }

    fn emit(&mut self, token: Token) {
        self.state.apply(&token);
        self.tokens.push(token);
    }

    /// Snapshot the document should show once the event at `ts` has landed.
    fn text_after(&self, ts: i64) -> &'a str {
        let texts = self.texts;
        texts
            .at_or_after(ts)
            .or_else(|| texts.at_or_before(ts))
            .map_or("", |e| e.value.as_str())
    }

    fn step(&mut self, activity: &Activity) {
        let ts = activity.ts;
        let texts = self.texts;
        self.pause_until(ts);
        self.align_to(texts.text_strictly_before(ts), "catch-up");

        // Events that cannot edit are checked against the current snapshot
        let edits_text = matches!(
            activity.kind,
            ActivityKind::Key { .. }
                | ActivityKind::NavKey {
                    code: NavCode::Cr,
                    ..
                }
        );
        let after = if edits_text {
            self.text_after(ts)
        } else {
            texts.text_at_or_before(ts)
        };
        match &activity.kind {
            ActivityKind::Selection { start, end } => {
                let kind = TokenKind::Selection {
                    start: *start,
                    end: *end,
                };
                self.emit(Token::new(kind, "cursor selection").with_actual(after));
            }
            ActivityKind::Nav { position } => {
                if *position != self.state.cursor {
                    let kind = TokenKind::Nav {
                        position: *position,
                    };
                    self.emit(Token::new(kind, "cursor nav").with_actual(after));
                }
            }
            ActivityKind::NavKey { code, label } => {
                let kind = TokenKind::NavKey {
                    code: *code,
                    repeat: 1,
                };
                self.emit(Token::new(kind, format!("keydown {label}")).with_actual(after));
            }
            ActivityKind::Key { label, class } => self.resolve_key(ts, label, *class),
        }

        self.verify(ts, after);
        self.last_time = ts;
    }

    /// Emits a pause token for the gap since the last event, if long enough.
    fn pause_until(&mut self, ts: i64) {
        let gap = ts.saturating_sub(self.last_time);
        if gap <= 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let seconds = gap as f64 / 1000.0;
        if seconds >= self.threshold {
            let texts = self.texts;
            let actual = texts.text_at_or_before(self.last_time);
            self.emit(
                Token::new(TokenKind::Pause { seconds }, format!("gap {gap}ms")).with_actual(actual),
            );
        }
    }

    /// Corrects the reconstruction toward `target` with one nav plus one
    /// insert or delete. Differences of any other shape are left alone.
    fn align_to(&mut self, target: &str, label: &str) {
        if self.state.text == target {
            return;
        }
        let Some(edit) = EditRegion::between(&self.state.text, target).single_edit() else {
            return;
        };
        let position = edit.position();
        if self.state.cursor != position {
            self.emit(
                Token::new(TokenKind::Nav { position }, format!("{label} nav")).with_actual(target),
            );
        }
        let token = match edit {
            Edit::Insert { text, .. } => Token::new(
                TokenKind::Text {
                    value: text,
                    position,
                },
                format!("{label} insert"),
            ),
            Edit::Delete { count, .. } => Token::new(
                TokenKind::Delete { count, position },
                format!("{label} delete"),
            ),
        };
        self.emit(token.with_actual(target));
    }

    fn resolve_key(&mut self, ts: i64, label: &str, class: KeyClass) {
        let texts = self.texts;
        let edit = texts.at_or_after(ts).and_then(|next| {
            let prev = texts.text_strictly_before(ts);
            if prev == next.value {
                None
            } else {
                EditRegion::between(prev, &next.value).single_edit()
            }
        });
        let actual = self.text_after(ts);

        let Some(edit) = edit else {
            // Land the placeholder where the writer's cursor was
            if let Some(cursor) = self.cursors.strictly_before(ts) {
                let position = cursor.value.start;
                if position != self.state.cursor {
                    let nav = Token::new(TokenKind::Nav { position }, "cursor move")
                        .with_actual(texts.text_at_or_before(ts));
                    self.emit(nav);
                }
            }
            self.emit(
                Token::new(TokenKind::Unknown, format!("keydown {label} no simple diff"))
                    .with_actual(actual),
            );
            return;
        };

        let position = edit.position();
        let cursor = self.state.cursor;
        let cursor_implies_delete = match class {
            KeyClass::EditControl(EditKey::Backspace) => cursor == position + 1,
            KeyClass::EditControl(EditKey::Delete) => cursor == position,
            _ => false,
        };
        let is_delete = matches!(edit, Edit::Delete { .. });
        if cursor != position && !(is_delete && cursor_implies_delete) {
            self.emit(
                Token::new(TokenKind::Nav { position }, format!("diff align for {label}"))
                    .with_actual(actual),
            );
        }
        let token = match edit {
            Edit::Insert { text, .. } => Token::new(
                TokenKind::Text {
                    value: text,
                    position,
                },
                format!("diff insert for {label}"),
            ),
            Edit::Delete { count, .. } => Token::new(
                TokenKind::Delete { count, position },
                format!("diff delete for {label}"),
            ),
        };
        self.emit(token.with_actual(actual));
    }

    fn verify(&mut self, ts: i64, expected: &str) {
        if self.state.text != expected {
            self.record_mismatch(ts, expected);
        }
    }

    fn record_mismatch(&mut self, ts: i64, expected: &str) {
        self.mismatches += 1;
        self.debug.push(format!(
            "CHECK {ts} mismatch expected_len={} actual_len={}",
            expected.chars().count(),
            self.state.len()
        ));
    }

    /// Reconciles snapshots at or after the last event, then closes the
    /// stream with the trailing pause and `END`.
    fn finish(&mut self, end: i64) {
        let last_event = self.last_time;
        let texts = self.texts;
        for entry in texts.since(last_event) {
            self.pause_until(entry.ts);
            self.align_to(&entry.value, "trailing catch-up");
            if entry.ts > last_event && self.state.text != entry.value {
                self.record_mismatch(entry.ts, &entry.value);
            }
            self.last_time = self.last_time.max(entry.ts);
        }
        self.pause_until(end);

        let final_text = texts.last().map_or("", |e| e.value.as_str());
        self.emit(
            Token::bare(TokenKind::Marker {
                marker: Marker::End,
            })
            .with_actual(final_text),
        );
    }
}
