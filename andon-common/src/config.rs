//! Bootstrap configuration and config-file resolution
//!
//! Configuration is a single TOML file. Every section is optional; anything
//! left out falls back to the compiled defaults, which match the reference
//! deployment (5 s telemetry refresh, 60 s staleness window, 15 min master
//! refresh, 5 s status monitor).
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `ANDON_CONFIG` environment variable
//! 3. User config file (`~/.config/andon/config.toml`)
//! 4. System config file (`/etc/andon/config.toml`)
//! 5. Compiled defaults (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ANDON_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub http: HttpConfig,
    pub source: SourceConfig,
    pub telemetry: TelemetryConfig,
    pub master: MasterConfig,
    pub monitor: MonitorConfig,
    pub labels: StatusLabels,
    pub material_alarms: Vec<MaterialAlarmConfig>,
    pub logging: LoggingConfig,
}

/// HTTP read API
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5780".to_string(),
        }
    }
}

/// Remote status source addressing
///
/// `linked_server`, `database` and `schema` form the optional three-part
/// qualifier placed in front of every table name.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub database_url: String,
    pub linked_server: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://andon.db?mode=ro".to_string(),
            linked_server: None,
            database: None,
            schema: None,
        }
    }
}

/// Device telemetry file loading
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Directory that relative file patterns are resolved against
    pub content_root: PathBuf,
    /// File patterns; the file-name part may contain `*` and `?`
    pub file_patterns: Vec<String>,
    pub refresh_interval_secs: u64,
    /// Age after which the last successful load no longer counts as connected
    pub staleness_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("."),
            file_patterns: vec!["src/test_trans.json".to_string()],
            refresh_interval_secs: 5,
            staleness_secs: 60,
        }
    }
}

impl TelemetryConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn staleness_window(&self) -> Duration {
        Duration::from_secs(self.staleness_secs)
    }
}

/// Master (code → name) table refresh
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    pub refresh_interval_secs: u64,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 15 * 60,
        }
    }
}

impl MasterConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Status monitor loop
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Generic display labels used when no resolved name is available
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusLabels {
    pub error: String,
    pub stopped: String,
    pub material_alarm: String,
    pub arranging: String,
    pub waiting: String,
    pub running: String,
    pub ready: String,
    pub placeholder: String,
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            error: "error".to_string(),
            stopped: "stopped".to_string(),
            material_alarm: "material alarm".to_string(),
            arranging: "setup in progress".to_string(),
            waiting: "waiting".to_string(),
            running: "running".to_string(),
            ready: "ready".to_string(),
            placeholder: "--".to_string(),
        }
    }
}

/// One machine → telemetry device mapping for the material alarm
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MaterialAlarmConfig {
    pub machine_id: u8,
    /// Device identifier, class code + address (e.g. "X1BA")
    pub device: String,
    pub label: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the refresh loops and aggregator cannot run with
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("telemetry.refresh_interval_secs", self.telemetry.refresh_interval_secs),
            ("telemetry.staleness_secs", self.telemetry.staleness_secs),
            ("master.refresh_interval_secs", self.master.refresh_interval_secs),
            ("monitor.interval_secs", self.monitor.interval_secs),
        ];
        for (key, value) in intervals {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", key)));
            }
        }

        if self.telemetry.file_patterns.is_empty() {
            return Err(Error::Config(
                "telemetry.file_patterns must list at least one file".to_string(),
            ));
        }

        if self.source.database_url.trim().is_empty() {
            return Err(Error::Config("source.database_url is empty".to_string()));
        }

        for (key, segment) in [
            ("source.linked_server", &self.source.linked_server),
            ("source.database", &self.source.database),
            ("source.schema", &self.source.schema),
        ] {
            if let Some(segment) = segment {
                if segment.contains(']') || segment.contains('[') {
                    return Err(Error::Config(format!(
                        "{} must not contain brackets: {}",
                        key, segment
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for alarm in &self.material_alarms {
            if alarm.device.trim().is_empty() {
                return Err(Error::Config(format!(
                    "material alarm for machine {} has an empty device",
                    alarm.machine_id
                )));
            }
            if !seen.insert(alarm.machine_id) {
                return Err(Error::Config(format!(
                    "machine {} has more than one material alarm",
                    alarm.machine_id
                )));
            }
        }

        Ok(())
    }
}

/// Find the config file to load, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config file
    if let Some(path) = dirs::config_dir().map(|d| d.join("andon").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }

    // Priority 4: System config file
    let system_config = PathBuf::from("/etc/andon/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from this file
    File(PathBuf),
    /// This file was named but does not exist; compiled defaults used
    Missing(PathBuf),
    /// No file named or found; compiled defaults used
    Defaults,
}

impl ConfigOrigin {
    /// Report the origin; call once logging is installed
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigOrigin::Missing(path) => warn!(
                "Config file not found: {} (using compiled defaults)",
                path.display()
            ),
            ConfigOrigin::Defaults => info!("No config file found, using compiled defaults"),
        }
    }
}

/// Load configuration from `path`
///
/// A missing file is not fatal: compiled defaults are used and the returned
/// origin says so. A file that exists but does not parse or validate is an
/// error. Nothing is logged here, so this can run before logging is set up.
pub fn load_config(path: Option<&Path>) -> Result<(TomlConfig, ConfigOrigin)> {
    let Some(path) = path else {
        return Ok((TomlConfig::default(), ConfigOrigin::Defaults));
    };

    if !path.exists() {
        return Ok((TomlConfig::default(), ConfigOrigin::Missing(path.to_path_buf())));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = TomlConfig::from_toml_str(&content)?;
    Ok((config, ConfigOrigin::File(path.to_path_buf())))
}
