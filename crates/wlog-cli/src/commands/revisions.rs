//! `wlog revisions`: insertion and deletion revision groups.

use std::path::Path;

use anyhow::Result;
use wlog_core::{RevisionGroup, RevisionKind, revision_groups};

use super::util::load_log;

/// One `start-end (duration) kind` row per group.
pub fn format_groups(groups: &[RevisionGroup]) -> String {
    if groups.is_empty() {
        return "No revision groups.".to_string();
    }
    groups
        .iter()
        .map(|g| {
            let kind = match g.kind {
                RevisionKind::Insert => "insert",
                RevisionKind::Delete => "delete",
            };
            format!(
                "{}-{} ({}ms) {kind}",
                g.start_ts,
                g.end_ts,
                g.end_ts.saturating_sub(g.start_ts)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run(path: &Path, json: bool) -> Result<()> {
    let log = load_log(path)?;
    let groups = revision_groups(&log);
    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        println!("{}", format_groups(&groups));
    }
    Ok(())
}
