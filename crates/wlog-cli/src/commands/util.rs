//! Shared utilities for CLI commands.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use wlog_core::EventLog;

/// Loads a log document from a file, or from stdin when `path` is `-`.
pub fn load_log(path: &Path) -> Result<EventLog> {
    let log = if path == Path::new("-") {
        EventLog::from_reader(std::io::stdin().lock()).context("failed to parse log from stdin")?
    } else {
        let file = File::open(path)
            .with_context(|| format!("failed to open log {}", path.display()))?;
        EventLog::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse log {}", path.display()))?
    };
    tracing::debug!(
        path = %path.display(),
        records = log.record_count(),
        "loaded log"
    );
    Ok(log)
}

/// Display name for a log path.
pub fn display_name(path: &Path) -> String {
    if path == Path::new("-") {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_log_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"text_records": {{"5": "hi"}}}}"#).unwrap();
        let log = load_log(file.path()).unwrap();
        assert_eq!(log.final_text(), "hi");
    }

    #[test]
    fn test_load_log_reports_path_on_error() {
        let err = load_log(Path::new("/nonexistent/log.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/log.json"));
    }

    #[test]
    fn test_display_name_for_stdin() {
        assert_eq!(display_name(Path::new("-")), "<stdin>");
        assert_eq!(display_name(Path::new("a.json")), "a.json");
    }
}
