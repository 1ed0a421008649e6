// Unit tests for the wmediumd command line builder
// Spawning itself is covered in integration_tests/discovery/spawn.rs

use crate::WMEDIUMD_BINARY;
use crate::config::ConnectorConfig;
use crate::discovery::spawn::build_spawn_command;
use crate::error::spawn::SpawnError;

use models::MediumMode;

use std::path::{Path, PathBuf};

use tokio::process::Command as TokioCommand;

fn args_of(cmd: &TokioCommand) -> Vec<String> {
    cmd.as_std()
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// **VALUE**: Verifies the default command line for an SNR medium.
///
/// **WHY THIS MATTERS**: Without `-s` wmediumd never opens its control socket and every
/// connect after a spawn times out.
///
/// **BUG THIS CATCHES**: Would catch a dropped `-s` flag, the wrong binary name or the log
/// level not being passed.
#[test]
fn given_default_config_when_build_spawn_command_called_then_starts_server_with_medium_file() {
    // GIVEN: Default config and a medium file
    let config = ConnectorConfig::default();
    let medium = Path::new("/tmp/mn_wmd_config_test.cfg");

    // WHEN: Building the command
    let cmd = build_spawn_command(&config, Some(medium)).expect("snr with medium file");

    // THEN: wmediumd -l 5 -s -c <file>
    assert_eq!(cmd.as_std().get_program(), WMEDIUMD_BINARY);
    assert_eq!(
        args_of(&cmd),
        vec!["-l", "5", "-s", "-c", "/tmp/mn_wmd_config_test.cfg"]
    );
}

/// **VALUE**: Verifies extra arguments go before `-s` and the PER table follows the medium.
///
/// **BUG THIS CATCHES**: Would catch extra arguments appended after `-c`, which wmediumd
/// parses as stray positional arguments.
#[test]
fn given_snr_config_with_per_table_when_build_spawn_command_called_then_appends_table() {
    // GIVEN: Extra args, custom log level and a PER table
    let mut config = ConnectorConfig::default();
    config.server.log_level = 3;
    config.server.extra_args = vec!["-b".to_string()];
    config.server.per_table = Some(PathBuf::from("/usr/share/wmediumd/per.dat"));

    // WHEN: Building the command
    let cmd = build_spawn_command(&config, Some(Path::new("/tmp/m.cfg"))).expect("valid");

    // THEN: Order is -l, extra, -s, -c, -x
    assert_eq!(
        args_of(&cmd),
        vec![
            "-l",
            "3",
            "-b",
            "-s",
            "-c",
            "/tmp/m.cfg",
            "-x",
            "/usr/share/wmediumd/per.dat"
        ]
    );
}

/// **VALUE**: Verifies the PER table is only used by the SNR model.
#[test]
fn given_errprob_config_with_per_table_when_build_spawn_command_called_then_omits_table() {
    // GIVEN: ErrorProb mode with a PER table configured
    let mut config = ConnectorConfig::default();
    config.mode = MediumMode::ErrorProb;
    config.server.per_table = Some(PathBuf::from("/usr/share/wmediumd/per.dat"));

    // WHEN
    let cmd = build_spawn_command(&config, Some(Path::new("/tmp/m.cfg"))).expect("valid");

    // THEN
    assert!(!args_of(&cmd).contains(&"-x".to_string()));
}

/// **VALUE**: Verifies SpecProb mode starts the server in dynamic mode without a file.
///
/// **WHY THIS MATTERS**: In SpecProb mode the whole medium is pushed over the socket; a
/// `-c` file would make the server start in a static model that rejects those updates.
///
/// **BUG THIS CATCHES**: Would catch `-c` leaking into the dynamic mode command line.
#[test]
fn given_specprob_config_when_build_spawn_command_called_then_uses_dynamic_flag() {
    // GIVEN: SpecProb mode, no medium file
    let mut config = ConnectorConfig::default();
    config.mode = MediumMode::SpecProb;

    // WHEN
    let cmd = build_spawn_command(&config, None).expect("spec prob needs no file");

    // THEN
    assert_eq!(args_of(&cmd), vec!["-l", "5", "-s", "-d"]);
}

/// **VALUE**: Verifies a static model without a medium file is refused up front.
#[test]
fn given_snr_config_without_medium_file_when_build_spawn_command_called_then_returns_validation_error()
 {
    // GIVEN
    let config = ConnectorConfig::default();

    // WHEN
    let result = build_spawn_command(&config, None);

    // THEN
    assert!(matches!(result, Err(SpawnError::Validation { .. })));
}
