//! Unit tests for config module

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use kline::report::ReportSchema;
use kline::Config;

#[test]
fn default_config_has_expected_values() {
    let config = Config::default();
    assert!(config.endpoint.url.starts_with("http://"));
    assert_eq!(config.endpoint.timeout_secs, 300);
    assert!(!config.endpoint.sse);
    assert_eq!(config.parser.schema(), ReportSchema::default());
    assert_eq!(config.display.reason_width, 36);
    assert!(config.validate().is_ok());
}

#[test]
fn config_serialization_roundtrip() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn partial_file_fills_in_defaults() {
    let toml_str = r#"
[endpoint]
url = "https://kline.example.com/api/stream"
sse = true
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.endpoint.sse);
    assert_eq!(config.endpoint.timeout_secs, 300);
    assert_eq!(config.parser.tags_section, "bazi");
    assert_eq!(config.display.reason_width, 36);
}

#[test]
fn load_from_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::load_from(&temp_dir.path().join("nope.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn save_and_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("kline").join("config.toml");

    let mut config = Config::default();
    config.parser.records_section = "points".to_string();
    config.display.reason_width = 48;
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[parser]\ntags_section = \"same\"\nrecords_section = \"same\"\n")
        .unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid config"));
}

#[test]
fn validate_rejects_bad_endpoint() {
    let mut config = Config::default();
    config.endpoint.url = "ftp://example.com".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.endpoint.timeout_secs = 0;
    assert!(config.validate().is_err());
}
