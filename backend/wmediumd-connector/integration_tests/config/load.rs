use wmediumd_connector::config::{CONFIG_FILE_NAME, ConnectorConfig, default_config_dir};
use wmediumd_connector::error::config::ConfigError;
use wmediumd_connector::{InterfaceRef, MacAddress, MediumMode};

use std::time::Duration;

/// **VALUE**: Verifies a saved config loads back identically.
///
/// **WHY THIS MATTERS**: Harness setups are saved once and reused across runs; any field that
/// does not survive the trip silently falls back to its default.
///
/// **BUG THIS CATCHES**: Would catch a field missing from serialization, durations written in
/// a format the parser does not read back, or MACs serialized as byte arrays.
#[test]
fn given_saved_config_when_loaded_then_equal_to_original() {
    // GIVEN: A non-default config
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = ConnectorConfig::default();
    config.mode = MediumMode::ErrorProb;
    config.operation_timeout = Duration::from_millis(1500);
    config.server.keep_server_running = false;
    config.medium.interfaces = vec![InterfaceRef::new(
        "sta1",
        "wlan0",
        "02:00:00:00:00:00".parse::<MacAddress>().expect("valid mac"),
    )];

    // WHEN: Saving and loading
    let path = config.save(dir.path()).expect("save");
    let loaded = ConnectorConfig::load(&path).expect("load");

    // THEN: Identical, written to the well known file name, no temp file left
    assert_eq!(loaded, config);
    assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
    assert!(!dir.path().join(format!("{CONFIG_FILE_NAME}.tmp")).exists());
}

/// **VALUE**: Verifies a missing config file yields defaults instead of an error.
#[test]
fn given_empty_dir_when_load_or_default_called_then_returns_defaults() {
    // GIVEN
    let dir = tempfile::tempdir().expect("temp dir");

    // WHEN
    let config = ConnectorConfig::load_or_default(dir.path()).expect("defaults");

    // THEN
    assert_eq!(config, ConnectorConfig::default());
}

/// **VALUE**: Verifies JSON configs are accepted by extension.
#[test]
fn given_json_file_when_loaded_then_parsed_as_json() {
    // GIVEN: A JSON config
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("connector.json");
    std::fs::write(
        &path,
        r#"{ "socket_path": "/tmp/other.sock", "mode": "spec_prob", "server": { "log_level": 7 } }"#,
    )
    .expect("write");

    // WHEN
    let config = ConnectorConfig::load(&path).expect("valid json");

    // THEN
    assert_eq!(config.mode, MediumMode::SpecProb);
    assert_eq!(config.server.log_level, 7);
    assert_eq!(config.socket_path.to_str(), Some("/tmp/other.sock"));
}

/// **VALUE**: Verifies a corrupt or invalid file is an error, never silently replaced.
///
/// **WHY THIS MATTERS**: Falling back to defaults on a typo would start wmediumd with an
/// empty medium and every harness assertion would fail for a confusing reason.
///
/// **BUG THIS CATCHES**: Would catch `load_or_default` swallowing parse or validation errors.
#[test]
fn given_corrupt_or_invalid_file_when_load_or_default_called_then_returns_error() {
    // GIVEN: Unparsable TOML
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "mode = [not toml").expect("write");

    // WHEN / THEN: Parse error
    assert!(matches!(
        ConnectorConfig::load_or_default(dir.path()),
        Err(ConfigError::ParseError { .. })
    ));

    // GIVEN: Valid TOML with an out of range log level
    std::fs::write(&path, "[server]\nlog_level = 9\n").expect("write");

    // WHEN / THEN: Validation error
    assert!(matches!(
        ConnectorConfig::load_or_default(dir.path()),
        Err(ConfigError::ValidationError { .. })
    ));

    // GIVEN: A malformed MAC
    std::fs::write(
        &path,
        "[[medium.interfaces]]\nstation = \"sta1\"\ninterface = \"wlan0\"\nmac = \"02:00\"\n",
    )
    .expect("write");

    // WHEN / THEN: Parse error from the MAC type
    assert!(matches!(
        ConnectorConfig::load_or_default(dir.path()),
        Err(ConfigError::ParseError { .. })
    ));
}

/// **VALUE**: Verifies a missing file passed to `load` is a read error.
#[test]
fn given_missing_file_when_load_called_then_returns_read_error() {
    // GIVEN
    let dir = tempfile::tempdir().expect("temp dir");

    // WHEN
    let result = ConnectorConfig::load(&dir.path().join("absent.toml"));

    // THEN
    assert!(matches!(result, Err(ConfigError::ReadError { .. })));
}

/// **VALUE**: Verifies the default config directory is namespaced.
#[test]
fn given_platform_config_dir_when_default_config_dir_called_then_ends_with_crate_dir() {
    // GIVEN / WHEN
    let Some(dir) = default_config_dir() else {
        // No home directory in this environment
        return;
    };

    // THEN
    assert!(dir.ends_with("wmediumd-connector"));
}
