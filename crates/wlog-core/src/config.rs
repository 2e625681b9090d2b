//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs recognized by the reconciliation and metrics engines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum gap (seconds) before the token stream records a pause.
    /// Default: 0 (every gap is a pause).
    #[serde(alias = "pauseThresholdSeconds")]
    pub pause_threshold_seconds: f64,

    /// Gap (seconds) the metrics engine treats as a pause for bucketing and
    /// bursts. Independent from `pause_threshold_seconds`.
    /// Default: 0.3.
    #[serde(alias = "pauseCriteriaSeconds")]
    pub pause_criteria_seconds: f64,

    /// Window (ms) within which a cursor record is explained by a navigation
    /// keydown. Default: 30.
    #[serde(alias = "navFuzzMs")]
    pub nav_fuzz_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pause_threshold_seconds: 0.0,
            pause_criteria_seconds: 0.3,
            nav_fuzz_ms: 30,
        }
    }
}

impl EngineConfig {
    /// Returns a copy with a different token-stream pause threshold.
    #[must_use]
    pub const fn with_pause_threshold(mut self, seconds: f64) -> Self {
        self.pause_threshold_seconds = seconds;
        self
    }

    /// Returns a copy with a different metrics pause criterion.
    #[must_use]
    pub const fn with_pause_criteria(mut self, seconds: f64) -> Self {
        self.pause_criteria_seconds = seconds;
        self
    }

    /// Pause threshold, clamped to a non-negative finite value.
    pub fn pause_threshold(&self) -> f64 {
        non_negative(self.pause_threshold_seconds)
    }

    /// Pause criterion, clamped to a non-negative finite value.
    pub fn pause_criteria(&self) -> f64 {
        non_negative(self.pause_criteria_seconds)
    }

    /// Navigation fuzz window, never negative.
    pub fn nav_fuzz(&self) -> i64 {
        self.nav_fuzz_ms.max(0)
    }
}

fn non_negative(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.pause_threshold_seconds, 0.0);
        assert!((config.pause_criteria_seconds - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.nav_fuzz_ms, 30);
    }

    #[test]
    fn test_accepts_camel_case_keys() {
        let json = r#"{"pauseThresholdSeconds": 2.0, "navFuzzMs": 50}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pause_threshold_seconds, 2.0);
        assert_eq!(config.nav_fuzz_ms, 50);
        // Missing keys fall back to defaults
        assert!((config.pause_criteria_seconds - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_thresholds_clamp_to_zero() {
        let config = EngineConfig::default()
            .with_pause_threshold(-1.0)
            .with_pause_criteria(f64::NAN);
        assert_eq!(config.pause_threshold(), 0.0);
        assert_eq!(config.pause_criteria(), 0.0);
    }
}
