//! `wlog export`: the plain-text diagnostic export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use wlog_core::{EngineConfig, ExportHeader, linearize, write_export};

use super::util::load_log;

pub struct ExportOptions<'a> {
    pub id: Option<&'a str>,
    pub title: &'a str,
    pub output: Option<&'a Path>,
}

pub fn run(path: &Path, config: &EngineConfig, options: &ExportOptions<'_>) -> Result<()> {
    let log = load_log(path)?;
    let linearization = linearize(&log, config);
    let header = ExportHeader {
        note_id: options.id.unwrap_or_default().to_string(),
        title: options.title.to_string(),
        exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    let mut out: Box<dyn Write> = match options.output {
        Some(output) => Box::new(BufWriter::new(File::create(output).with_context(|| {
            format!("failed to create export file {}", output.display())
        })?)),
        None => Box::new(std::io::stdout().lock()),
    };
    write_export(&mut out, &header, &log, &linearization).context("failed to write export")?;

    if let Some(output) = options.output {
        tracing::info!(path = %output.display(), "export written");
    }
    Ok(())
}
