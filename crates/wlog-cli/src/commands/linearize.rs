//! `wlog linearize`: the reconciled token stream.

use std::path::Path;

use anyhow::Result;
use wlog_core::{EngineConfig, EventLog, Linearization, linearize};

use super::util::load_log;

/// Rendered tokens followed by the status line.
pub fn format_linearization(log: &EventLog, linearization: &Linearization) -> String {
    format!(
        "{}\n{}",
        linearization.rendered(),
        linearization.status_line(log)
    )
}

pub fn run(path: &Path, config: &EngineConfig, json: bool) -> Result<()> {
    let log = load_log(path)?;
    let linearization = linearize(&log, config);
    if json {
        println!("{}", serde_json::to_string_pretty(&linearization)?);
    } else {
        println!("{}", format_linearization(&log, &linearization));
    }
    Ok(())
}
