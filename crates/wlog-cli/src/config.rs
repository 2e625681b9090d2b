//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wlog_core::EngineConfig;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minimum gap, in seconds, rendered as a pause token.
    pub pause_threshold_seconds: f64,

    /// Minimum gap, in seconds, counted as a pause by the measures.
    pub pause_criteria_seconds: f64,

    /// Window, in milliseconds, in which a cursor record is attributed to an
    /// arrow key.
    pub nav_fuzz_ms: i64,

    /// Title written into exports when none is given on the command line.
    pub export_title: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("pause_threshold_seconds", &self.pause_threshold_seconds)
            .field("pause_criteria_seconds", &self.pause_criteria_seconds)
            .field("nav_fuzz_ms", &self.nav_fuzz_ms)
            .field("export_title", &self.export_title)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            pause_threshold_seconds: engine.pause_threshold_seconds,
            pause_criteria_seconds: engine.pause_criteria_seconds,
            nav_fuzz_ms: engine.nav_fuzz_ms,
            export_title: String::new(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WLOG_*)
        figment = figment.merge(Env::prefixed("WLOG_"));

        figment.extract()
    }

    /// Engine settings, with per-command overrides applied.
    pub fn engine(&self, pause_threshold: Option<f64>, pause_criteria: Option<f64>) -> EngineConfig {
        EngineConfig {
            pause_threshold_seconds: pause_threshold.unwrap_or(self.pause_threshold_seconds),
            pause_criteria_seconds: pause_criteria.unwrap_or(self.pause_criteria_seconds),
            nav_fuzz_ms: self.nav_fuzz_ms,
        }
    }
}

/// Returns the platform-specific config directory for wlog.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wlog"))
}
