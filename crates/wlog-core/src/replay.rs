//! Point-in-time views of the writing surface.

use serde::Serialize;

use crate::index::SnapshotIndex;
use crate::key::{CursorRange, ScrollOffset};
use crate::record::EventLog;

/// What the surface showed at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayFrame {
    pub ts: i64,
    pub text: String,
    /// Selection end of the latest cursor record, if any.
    pub cursor: Option<usize>,
    pub scroll_top: Option<i64>,
}

pub struct ReplayIndex {
    texts: SnapshotIndex<String>,
    cursors: SnapshotIndex<CursorRange>,
    scrolls: SnapshotIndex<ScrollOffset>,
    bounds: Option<(i64, i64)>,
}

impl ReplayIndex {
    pub fn new(log: &EventLog) -> Self {
        let (texts, _) = SnapshotIndex::parse(&log.text, |s| Some(s.to_string()));
        let (cursors, skipped_cursors) = SnapshotIndex::parse(&log.cursor, CursorRange::parse);
        let (scrolls, skipped_scrolls) = SnapshotIndex::parse(&log.scroll, ScrollOffset::parse);
        if skipped_cursors + skipped_scrolls > 0 {
            tracing::debug!(skipped_cursors, skipped_scrolls, "replay index skipped records");
        }

        let times = log.all_timestamps();
        let start = log.header.starttime.or_else(|| times.first().copied());
        let end = log.header.endtime.or_else(|| times.last().copied());
        Self {
            texts,
            cursors,
            scrolls,
            bounds: start.zip(end),
        }
    }

    /// First and last replayable instant.
    pub const fn bounds(&self) -> Option<(i64, i64)> {
        self.bounds
    }

    pub fn frame_at(&self, ts: i64) -> ReplayFrame {
        ReplayFrame {
            ts,
            text: self.texts.text_at_or_before(ts).to_string(),
            cursor: self.cursors.at_or_before(ts).map(|e| e.value.end),
            scroll_top: self.scrolls.at_or_before(ts).map(|e| e.value.top),
        }
    }
}
