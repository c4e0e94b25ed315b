use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound for any window, in minutes (ten years)
const MAX_WINDOW_MINUTES: i64 = 10 * 366 * 24 * 60;

/// Errors that can occur while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for an analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input source configuration
    pub input: InputConfig,
    /// Detection rules configuration
    pub detection: DetectionConfig,
    /// Output configuration
    pub output: OutputConfig,
}

/// Input source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Path to the audit log (JSON lines or key=value lines)
    pub file_path: PathBuf,
}

/// Detection rules configuration.
///
/// Fields left out of a config file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Sliding window for counting failed logins
    pub failed_login_window_minutes: i64,
    /// Failures per user within the window that raise a finding
    pub failed_per_user: usize,
    /// Failures per IP within the window that raise a finding
    pub failed_per_ip: usize,
    /// Maximum gap between two sightings in different countries
    pub impossible_travel_window_minutes: i64,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text", "console", "json", or "jsonl"
    pub format: String,
    /// Output file path (stdout if unset)
    pub file_path: Option<PathBuf>,
    /// Maximum number of findings to write
    pub max_findings: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            file_path: PathBuf::from("okta-logs.txt"),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            failed_login_window_minutes: 60,
            failed_per_user: 8,
            failed_per_ip: 20,
            impossible_travel_window_minutes: 90,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: "console".to_string(),
            file_path: None,
            max_findings: 50,
        }
    }
}

impl DetectionConfig {
    pub fn failed_login_window(&self) -> Duration {
        Duration::minutes(self.failed_login_window_minutes.clamp(0, MAX_WINDOW_MINUTES))
    }

    pub fn impossible_travel_window(&self) -> Duration {
        Duration::minutes(self.impossible_travel_window_minutes.clamp(0, MAX_WINDOW_MINUTES))
    }

    /// Reject thresholds and windows the rules cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failed_per_user == 0 || self.failed_per_ip == 0 {
            return Err(ConfigError::Invalid(
                "failure thresholds must be at least 1".to_string(),
            ));
        }
        for (name, minutes) in [
            ("failed_login_window_minutes", self.failed_login_window_minutes),
            ("impossible_travel_window_minutes", self.impossible_travel_window_minutes),
        ] {
            if minutes <= 0 || minutes > MAX_WINDOW_MINUTES {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_WINDOW_MINUTES, minutes
                )));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate()
    }
}
