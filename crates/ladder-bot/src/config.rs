//! Application configuration.
//!
//! Precedence: built-in defaults, then the TOML file, then `TRADES_LOG_PATH`.
//! The `[ladder]` section stays as written in the file; the gate engine
//! layers `LDR_*` overrides on top of it so a reload can revert them.

use crate::error::{AppError, AppResult};
use ladder_journal::DayTimezone;
use ladder_risk::LadderParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var naming the config file.
pub const ENV_CONFIG: &str = "LADDER_CONFIG";
/// Env var naming the fill journal.
pub const ENV_JOURNAL_PATH: &str = "TRADES_LOG_PATH";

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

fn default_journal_path() -> PathBuf {
    PathBuf::from("trades_log.csv")
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info,ladder=debug".to_string(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fill journal read by the daily circuit breaker.
    pub journal_path: PathBuf,
    /// Day boundary timezone: `UTC`, `local`, or an offset like `+02:00`.
    pub timezone: String,
    /// JSON file with per-asset provider snapshots.
    pub snapshot_path: Option<PathBuf>,
    pub telemetry: TelemetryConfig,
    pub ladder: LadderParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            journal_path: default_journal_path(),
            timezone: default_timezone(),
            snapshot_path: None,
            telemetry: TelemetryConfig::default(),
            ladder: LadderParams::default(),
        }
    }
}

impl AppConfig {
    /// Load from `LADDER_CONFIG` (or the default path), then apply `TRADES_LOG_PATH`.
    ///
    /// A missing file yields defaults.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var(ENV_CONFIG).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&config_path)
    }

    /// Load from `path` if it exists, then apply `TRADES_LOG_PATH`.
    pub fn load_from(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from a specific file, without env overrides.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Overlay the journal path from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay the journal path from an arbitrary key lookup.
    ///
    /// `LDR_*` knobs are not applied here; see `Application::with_overrides`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_JOURNAL_PATH).filter(|p| !p.trim().is_empty()) {
            self.journal_path = PathBuf::from(path.trim());
        }
    }

    /// Parsed day timezone (UTC when unrecognised).
    pub fn day_timezone(&self) -> DayTimezone {
        DayTimezone::parse_or_utc(&self.timezone)
    }
}
