//! `wlog replay`: the surface at one instant.

use std::path::Path;

use anyhow::Result;
use wlog_core::ReplayIndex;

use super::util::load_log;

pub fn run(path: &Path, at: i64) -> Result<()> {
    let log = load_log(path)?;
    let index = ReplayIndex::new(&log);
    if let Some((start, end)) = index.bounds() {
        if at < start || at > end {
            tracing::warn!(at, start, end, "timestamp outside the recorded session");
        }
    }
    println!("{}", serde_json::to_string_pretty(&index.frame_at(at))?);
    Ok(())
}
