//! Configuration resolution for chordscope-fe
//!
//! **Priority (per setting):** command line → environment → TOML → default
//!
//! Command line and environment are both handled by clap (`env = ...`) in
//! `main.rs` and arrive here as [`Overrides`]; this module layers them over
//! the TOML file and validates the result.

use chordscope_common::config::{AnalysisConfig, LoggingConfig, TomlConfig};
use chordscope_common::time::millis_to_duration;
use chordscope_common::{Error, Result};
use reqwest::Url;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

use crate::services::{AnalysisSettings, DEFAULT_URL_TITLE};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_BIND: &str = "127.0.0.1:5730";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_TICK_MILLIS: u64 = 1000;
pub const DEFAULT_SETTLE_MILLIS: u64 = 500;
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub backend_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub tick_millis: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FrontendConfig {
    pub bind: SocketAddr,
    pub backend_url: String,
    pub analysis: AnalysisSettings,
    pub log_level: String,
    pub event_capacity: usize,
}

impl FrontendConfig {
    /// Layer overrides over the TOML file and compiled defaults
    pub fn resolve(overrides: &Overrides, toml: &TomlConfig) -> Result<Self> {
        let bind_str = pick("bind", &overrides.bind, &toml.bind, DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", bind_str, e)))?;

        let backend_url = pick(
            "backend_url",
            &overrides.backend_url,
            &toml.backend_url,
            DEFAULT_BACKEND_URL.to_string(),
        );
        validate_backend_url(&backend_url)?;

        let timeout_secs = pick(
            "analysis.timeout_secs",
            &overrides.timeout_secs,
            &toml.analysis.timeout_secs,
            DEFAULT_TIMEOUT_SECS,
        );
        let tick_millis = pick(
            "analysis.tick_millis",
            &overrides.tick_millis,
            &toml.analysis.tick_millis,
            DEFAULT_TICK_MILLIS,
        );
        let settle_millis = toml.analysis.settle_millis.unwrap_or(DEFAULT_SETTLE_MILLIS);
        validate_timing(timeout_secs, tick_millis)?;

        let default_url_title = toml
            .analysis
            .default_url_title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URL_TITLE.to_string());

        let log_level = log_level(overrides, toml);

        let event_capacity = toml.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY);
        if event_capacity == 0 {
            return Err(Error::Config("event_capacity must be greater than 0".to_string()));
        }

        Ok(Self {
            bind,
            backend_url,
            analysis: AnalysisSettings {
                timeout: Duration::from_secs(timeout_secs),
                tick: millis_to_duration(tick_millis),
                settle: millis_to_duration(settle_millis),
                default_url_title,
            },
            log_level,
            event_capacity,
        })
    }

    /// TOML representation, used to write a starter config file
    pub fn to_toml(&self) -> TomlConfig {
        TomlConfig {
            backend_url: Some(self.backend_url.clone()),
            bind: Some(self.bind.to_string()),
            event_capacity: Some(self.event_capacity),
            logging: LoggingConfig {
                level: self.log_level.clone(),
            },
            analysis: AnalysisConfig {
                timeout_secs: Some(self.analysis.timeout.as_secs()),
                tick_millis: Some(self.analysis.tick.as_millis() as u64),
                settle_millis: Some(self.analysis.settle.as_millis() as u64),
                default_url_title: Some(self.analysis.default_url_title.clone()),
            },
        }
    }
}

/// Default log filter: override, then the TOML `[logging]` level
///
/// Needed before logging exists, so it does not log.
pub fn log_level(overrides: &Overrides, toml: &TomlConfig) -> String {
    overrides
        .log_level
        .clone()
        .unwrap_or_else(|| toml.logging.level.clone())
}

/// Override → TOML → default, logging which source won
fn pick<T: Clone + std::fmt::Debug>(
    name: &str,
    cli_or_env: &Option<T>,
    toml: &Option<T>,
    default: T,
) -> T {
    if let Some(value) = cli_or_env {
        info!("{} = {:?} (command line / environment)", name, value);
        return value.clone();
    }
    if let Some(value) = toml {
        info!("{} = {:?} (TOML config)", name, value);
        return value.clone();
    }
    default
}

fn validate_backend_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::Config(format!("Invalid backend_url '{}': {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Invalid backend_url '{}': scheme must be http or https",
            url
        )));
    }
    Ok(())
}

fn validate_timing(timeout_secs: u64, tick_millis: u64) -> Result<()> {
    if timeout_secs == 0 {
        return Err(Error::Config("analysis.timeout_secs must be greater than 0".to_string()));
    }
    if tick_millis == 0 {
        return Err(Error::Config("analysis.tick_millis must be greater than 0".to_string()));
    }
    if tick_millis > timeout_secs.saturating_mul(1000) {
        return Err(Error::Config(format!(
            "analysis.tick_millis ({}) must not exceed the timeout ({} s)",
            tick_millis, timeout_secs
        )));
    }
    Ok(())
}
