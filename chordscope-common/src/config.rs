//! Configuration file model, location and loading
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns tier 3: where the TOML file lives and what it may contain.
//! A missing or unreadable file is never fatal; callers get defaults and a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CHORDSCOPE_CONFIG";

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "chordscope";

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (e.g. "info", "debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// `[analysis]` section: timing of one analysis session
///
/// All fields optional; the service supplies compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hard ceiling on one remote analysis (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Progress estimator tick interval (milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_millis: Option<u64>,
    /// Delay between success and navigation to the results view (milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_millis: Option<u64>,
    /// Title used for URL analyses when the backend reports none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_url_title: Option<String>,
}

/// Contents of a Chordscope TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the remote analysis backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    /// Listen address of the front end service ("host:port")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Event bus channel capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_capacity: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Locate the TOML config file for `module_name`
///
/// Priority: explicit path → `CHORDSCOPE_CONFIG` → `<config_dir>/chordscope/<module_name>.toml`.
/// Returns `None` only when no platform config directory exists and nothing
/// was given explicitly. The returned path is not checked for existence.
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path(module_name)
}

/// Platform default config path for `module_name`
///
/// - Linux: `~/.config/chordscope/<module>.toml`
/// - macOS: `~/Library/Application Support/chordscope/<module>.toml`
/// - Windows: `%APPDATA%\chordscope\<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(format!("{}.toml", module_name)))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Outcome of looking for the config file
///
/// Inspecting does not log, so the file can be read before logging is set up
/// (it may carry the log level) and reported afterwards with [`ConfigLoad::log`].
#[derive(Debug)]
pub enum ConfigLoad {
    /// No config directory on this platform
    NoLocation,
    NotFound(PathBuf),
    Loaded(PathBuf, TomlConfig),
    /// Unreadable or unparsable; defaults apply
    Invalid(PathBuf, Error),
}

impl ConfigLoad {
    pub fn inspect(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return ConfigLoad::NoLocation;
        };
        if !path.exists() {
            return ConfigLoad::NotFound(path.to_path_buf());
        }
        match load_toml_config(path) {
            Ok(config) => ConfigLoad::Loaded(path.to_path_buf(), config),
            Err(e) => ConfigLoad::Invalid(path.to_path_buf(), e),
        }
    }

    /// File contents, or defaults when there is no usable file
    pub fn config(&self) -> TomlConfig {
        match self {
            ConfigLoad::Loaded(_, config) => config.clone(),
            _ => TomlConfig::default(),
        }
    }

    /// Missing file → info. Unreadable or invalid file → warning.
    pub fn log(&self) {
        match self {
            ConfigLoad::NoLocation => {
                info!("No config directory available; using compiled defaults")
            }
            ConfigLoad::NotFound(path) => {
                info!("Config file {} not found; using compiled defaults", path.display())
            }
            ConfigLoad::Loaded(path, _) => info!("Loaded configuration from {}", path.display()),
            ConfigLoad::Invalid(_, e) => warn!("{}; using compiled defaults", e),
        }
    }
}

/// Load the config file if present, otherwise defaults
pub fn load_or_default(path: Option<&Path>) -> TomlConfig {
    let load = ConfigLoad::inspect(path);
    load.log();
    load.config()
}

/// Write a TOML config file, creating parent directories
///
/// Writes to a sibling temp file first and renames it into place so a reader
/// never observes a half-written file.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
