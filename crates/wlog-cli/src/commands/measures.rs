//! `wlog measures`: writing-process measures, one or more logs in parallel.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use wlog_core::{EngineConfig, Measures, compute_measures, linearize};

use super::util::{display_name, load_log};

/// Measures computed for one log file.
#[derive(Debug, Clone, Serialize)]
pub struct LogMeasures {
    pub log: String,
    pub measures: Measures,
}

/// Loads and measures every log; independent runs share nothing.
pub fn measure_all(paths: &[PathBuf], config: &EngineConfig) -> Result<Vec<LogMeasures>> {
    paths
        .par_iter()
        .map(|path| {
            let log = load_log(path)?;
            let linearization = linearize(&log, config);
            Ok(LogMeasures {
                log: display_name(path),
                measures: compute_measures(&log, &linearization, config),
            })
        })
        .collect()
}

/// One `name: value` line per measure, preceded by the status if any.
pub fn format_measures(measures: &Measures) -> String {
    let mut output = String::new();
    if let Some(status) = &measures.status {
        let _ = writeln!(output, "status: {status}");
    }
    for (name, value) in measures.iter() {
        let _ = writeln!(output, "{name}: {value}");
    }
    output.trim_end().to_string()
}

pub fn format_all(results: &[LogMeasures]) -> String {
    if let [single] = results {
        return format_measures(&single.measures);
    }
    results
        .iter()
        .map(|r| format!("== {} ==\n{}", r.log, format_measures(&r.measures)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn run(paths: &[PathBuf], config: &EngineConfig, json: bool) -> Result<()> {
    let results = measure_all(paths, config)?;
    tracing::debug!(log_count = results.len(), "computed measures");
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("{}", format_all(&results));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use wlog_core::metrics::NO_TEXT_STATUS;
    use wlog_core::{EventLog, MeasureValue, RecordKind};

    use super::*;

    fn write_log(log: &EventLog) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", log.to_json_pretty().unwrap()).unwrap();
        file
    }

    #[test]
    fn test_measure_all_keeps_input_order() {
        let mut typed = EventLog::default();
        typed.record(RecordKind::Text, 0, "");
        typed.record(RecordKind::Text, 60_000, "Hello world");
        let empty = EventLog::default();
        let (a, b) = (write_log(&typed), write_log(&empty));

        let results = measure_all(
            &[a.path().to_path_buf(), b.path().to_path_buf()],
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].measures.get("writing_time_minutes"),
            Some(MeasureValue::Number(1.0))
        );
        assert_eq!(results[1].measures.status.as_deref(), Some(NO_TEXT_STATUS));
    }

    #[test]
    fn test_format_measures_lists_status_first() {
        let results = measure_all(
            &[write_log(&EventLog::default()).path().to_path_buf()],
            &EngineConfig::default(),
        )
        .unwrap();
        let output = format_all(&results);
        assert!(output.starts_with(&format!("status: {NO_TEXT_STATUS}\nwriting_time_ms: n/a")));
    }
}
