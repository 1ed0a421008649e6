// Unit tests for config validation
// File loading and saving are covered in integration_tests/config/

use crate::DEFAULT_SOCKET_PATH;
use crate::config::{ConfiguredErrorProbLink, ConfiguredSnrLink, ConnectorConfig};
use crate::error::config::ConfigError;

use models::{InterfaceRef, MacAddress, MediumMode};

use std::path::Path;
use std::time::Duration;

fn interface(station: &str, n: u8) -> InterfaceRef {
    InterfaceRef::new(station, "wlan0", MacAddress::new([0x02, 0, 0, 0, n, 0]))
}

fn assert_invalid(config: &ConnectorConfig, needle: &str) {
    match config.validate() {
        Err(ConfigError::ValidationError { reason, .. }) => assert!(
            reason.contains(needle),
            "Expected reason containing {needle:?}, got {reason:?}"
        ),
        other => panic!("Expected validation error containing {needle:?}, got {other:?}"),
    }
}

/// **VALUE**: Verifies the defaults match what wmediumd and its harnesses expect.
///
/// **WHY THIS MATTERS**: Most callers construct the config with `Default` and only set the
/// interfaces. A changed default socket path connects to nothing.
///
/// **BUG THIS CATCHES**: Would catch drift in any documented default.
#[test]
fn given_default_config_when_inspected_then_defaults_are_documented_values() {
    // GIVEN / WHEN
    let config = ConnectorConfig::default();

    // THEN
    assert!(config.validate().is_ok());
    assert_eq!(config.socket_path, Path::new(DEFAULT_SOCKET_PATH));
    assert_eq!(DEFAULT_SOCKET_PATH, "/var/run/wmediumd.sock");
    assert_eq!(config.mode, MediumMode::Snr);
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
    assert_eq!(config.operation_timeout, Duration::from_secs(5));
    assert!(config.server.auto_start);
    assert_eq!(config.server.executable, "wmediumd");
    assert_eq!(config.server.log_level, 5);
    assert!(config.server.keep_server_running);
    assert!(config.server.load_hwsim_module);
    assert_eq!(config.server.startup_timeout, Duration::from_secs(10));
    assert_eq!(config.server.stop_grace, Duration::from_millis(500));
    assert!(config.medium.auto_add_links);
    assert_eq!(config.medium.default_auto_snr, -10);
    assert_eq!(config.medium.default_auto_errprob, 1.0);
}

/// **VALUE**: Verifies attach configs never start a server.
#[test]
fn given_socket_path_when_attach_called_then_auto_start_disabled() {
    // GIVEN / WHEN
    let config = ConnectorConfig::attach("/tmp/test-wmediumd.sock");

    // THEN
    assert!(!config.server.auto_start);
    assert_eq!(config.socket_path, Path::new("/tmp/test-wmediumd.sock"));
    assert!(config.validate().is_ok());
}

/// **VALUE**: Verifies out of range scalar settings are rejected.
///
/// **WHY THIS MATTERS**: A zero timeout fails every operation immediately and a log level
/// above 7 makes wmediumd exit at startup; both look like a broken server.
///
/// **BUG THIS CATCHES**: Would catch missing bound checks on timeouts or the log level.
#[test]
fn given_out_of_range_settings_when_validated_then_returns_validation_error() {
    // GIVEN: Zero operation timeout
    let mut config = ConnectorConfig::default();
    config.operation_timeout = Duration::ZERO;
    assert_invalid(&config, "operation_timeout");

    // GIVEN: Log level 8
    let mut config = ConnectorConfig::default();
    config.server.log_level = 8;
    assert_invalid(&config, "log_level");

    // GIVEN: Empty executable
    let mut config = ConnectorConfig::default();
    config.server.executable = "  ".to_string();
    assert_invalid(&config, "executable");

    // GIVEN: Unsupported version
    let mut config = ConnectorConfig::default();
    config.version = 2;
    assert_invalid(&config, "version");
}

/// **VALUE**: Verifies the medium section is consistent before any file is written.
///
/// **WHY THIS MATTERS**: Medium problems otherwise only surface after a spawn attempt, as a
/// server that never opens its socket.
///
/// **BUG THIS CATCHES**: Would catch duplicate interfaces, dangling link identifiers or an
/// out of range error probability slipping through validation.
#[test]
fn given_inconsistent_medium_when_validated_then_returns_validation_error() {
    // GIVEN: Duplicate identifiers
    let mut config = ConnectorConfig::default();
    config.medium.interfaces = vec![interface("sta1", 0), interface("sta1", 1)];
    assert_invalid(&config, "Duplicate interface");

    // GIVEN: Duplicate MACs
    let mut config = ConnectorConfig::default();
    config.medium.interfaces = vec![interface("sta1", 0), interface("sta2", 0)];
    assert_invalid(&config, "MAC");

    // GIVEN: Link to an unknown interface
    let mut config = ConnectorConfig::default();
    config.medium.interfaces = vec![interface("sta1", 0)];
    config.medium.snr_links = vec![ConfiguredSnrLink {
        from: "sta1.wlan0".to_string(),
        to: "sta9.wlan0".to_string(),
        snr: 12,
    }];
    assert_invalid(&config, "sta9.wlan0");

    // GIVEN: Error probability above 1
    let mut config = ConnectorConfig::default();
    config.medium.interfaces = vec![interface("sta1", 0), interface("sta2", 1)];
    config.medium.errprob_links = vec![ConfiguredErrorProbLink {
        from: "sta1.wlan0".to_string(),
        to: "sta2.wlan0".to_string(),
        errprob: 1.5,
    }];
    assert_invalid(&config, "errprob");
}

/// **VALUE**: Verifies durations parse from human readable strings and missing keys default.
///
/// **WHY THIS MATTERS**: Config files are written by hand; `"250ms"` must mean 250
/// milliseconds and an omitted section must not reject the whole file.
///
/// **BUG THIS CATCHES**: Would catch a duration field deserialized as a number, or a missing
/// `#[serde(default)]` on a section.
#[test]
fn given_partial_toml_when_parsed_then_durations_parsed_and_rest_defaulted() {
    // GIVEN: A partial TOML document
    let text = r#"
        mode = "error_prob"
        connect_timeout = "2s"

        [server]
        stop_grace = "250ms"
        keep_server_running = false
    "#;

    // WHEN: Parsing
    let config: ConnectorConfig = toml::from_str(text).expect("valid toml");

    // THEN: Given values applied, the rest defaulted
    assert_eq!(config.mode, MediumMode::ErrorProb);
    assert_eq!(config.connect_timeout, Duration::from_secs(2));
    assert_eq!(config.server.stop_grace, Duration::from_millis(250));
    assert!(!config.server.keep_server_running);
    assert_eq!(config.operation_timeout, Duration::from_secs(5));
    assert_eq!(config.server.executable, "wmediumd");
    assert!(config.validate().is_ok());
}
