//! `wlog counts`: process and final-text counts.

use std::path::Path;

use anyhow::Result;
use wlog_core::{EngineConfig, ProcessCounts, linearize};

use super::util::load_log;

pub fn run(path: &Path, config: &EngineConfig) -> Result<()> {
    let log = load_log(path)?;
    let linearization = linearize(&log, config);
    let counts = ProcessCounts::compute(&log, &linearization.tokens);
    println!("{counts}");
    Ok(())
}
