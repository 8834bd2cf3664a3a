//! Front end configuration resolved from real TOML files

use chordscope_common::config::{load_or_default, load_toml_config, write_toml_config};
use chordscope_fe::config::{FrontendConfig, Overrides};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

const SAMPLE: &str = r#"
backend_url = "http://analysis.local:9000"
bind = "0.0.0.0:8080"

[logging]
level = "debug"

[analysis]
timeout_secs = 120
tick_millis = 500
default_url_title = "Video"
"#;

#[test]
fn test_toml_file_supplies_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chordscope-fe.toml");
    fs::write(&path, SAMPLE).unwrap();

    let toml = load_toml_config(&path).unwrap();
    let config = FrontendConfig::resolve(&Overrides::default(), &toml).unwrap();

    assert_eq!(config.backend_url, "http://analysis.local:9000");
    assert_eq!(config.bind.to_string(), "0.0.0.0:8080");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.analysis.timeout, Duration::from_secs(120));
    assert_eq!(config.analysis.tick, Duration::from_millis(500));
    assert_eq!(config.analysis.settle, Duration::from_millis(500));
    assert_eq!(config.analysis.default_url_title, "Video");
}

#[test]
fn test_command_line_beats_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chordscope-fe.toml");
    fs::write(&path, SAMPLE).unwrap();

    let overrides = Overrides {
        timeout_secs: Some(30),
        backend_url: Some("https://analysis.example.com".to_string()),
        ..Overrides::default()
    };
    let config = FrontendConfig::resolve(&overrides, &load_or_default(Some(&path))).unwrap();

    assert_eq!(config.analysis.timeout, Duration::from_secs(30));
    assert_eq!(config.backend_url, "https://analysis.example.com");
    // Untouched settings still come from the file
    assert_eq!(config.analysis.tick, Duration::from_millis(500));
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "backend_url = [not toml").unwrap();

    let config = FrontendConfig::resolve(&Overrides::default(), &load_or_default(Some(&path))).unwrap();

    assert_eq!(config.analysis.timeout, Duration::from_secs(300));
    assert_eq!(config.bind.to_string(), "127.0.0.1:5730");
}

#[test]
fn test_written_config_reloads_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("chordscope-fe.toml");

    let overrides = Overrides {
        tick_millis: Some(250),
        ..Overrides::default()
    };
    let original = FrontendConfig::resolve(&overrides, &Default::default()).unwrap();
    write_toml_config(&original.to_toml(), &path).unwrap();

    let reloaded =
        FrontendConfig::resolve(&Overrides::default(), &load_toml_config(&path).unwrap()).unwrap();
    assert_eq!(reloaded.analysis, original.analysis);
    assert_eq!(reloaded.bind, original.bind);
    assert_eq!(reloaded.backend_url, original.backend_url);
}

#[test]
fn test_tick_longer_than_timeout_rejected() {
    let overrides = Overrides {
        timeout_secs: Some(1),
        tick_millis: Some(5000),
        ..Overrides::default()
    };
    assert!(FrontendConfig::resolve(&overrides, &Default::default()).is_err());
}
