//! `wlog keys`: linearization from key records alone.

use std::path::Path;

use anyhow::Result;
use wlog_core::keystroke::{keystroke_linear, render};

use super::util::load_log;

pub fn run(path: &Path, threshold_seconds: f64) -> Result<()> {
    let log = load_log(path)?;
    let tokens = keystroke_linear(&log, threshold_seconds);
    tracing::debug!(token_count = tokens.len(), "keystroke linearization");
    println!("{}", render(&tokens));
    Ok(())
}
