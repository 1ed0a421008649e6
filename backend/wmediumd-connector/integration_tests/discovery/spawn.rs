use wmediumd_connector::ConnectorConfig;
use wmediumd_connector::MediumMode;
use wmediumd_connector::discovery::spawn::spawn_and_wait;
use wmediumd_connector::error::spawn::SpawnError;

use std::time::Duration;

// ============================================================================
// Public API tests for spawning wmediumd
// A real wmediumd is not required: failures are driven with stand-in executables
// ============================================================================

/// **VALUE**: Verifies a missing executable fails fast with a spawn error.
///
/// **WHY THIS MATTERS**: On hosts without wmediumd installed the harness must get an error
/// naming the executable, not wait out the whole startup timeout.
///
/// **BUG THIS CATCHES**: Would catch spawn failures being retried or mapped to a timeout.
#[tokio::test]
async fn given_missing_executable_when_spawn_and_wait_called_then_returns_spawn_error() {
    // GIVEN: An executable that does not exist
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = ConnectorConfig::default();
    config.mode = MediumMode::SpecProb;
    config.socket_path = dir.path().join("wmediumd.sock");
    config.server.executable = "/nonexistent/bin/wmediumd".to_string();

    // WHEN
    let result = spawn_and_wait(&config, None).await;

    // THEN
    match result {
        Err(SpawnError::Spawn { message, .. }) => {
            assert!(message.contains("/nonexistent/bin/wmediumd"), "got {message}");
        }
        other => panic!("Expected spawn error, got {other:?}"),
    }
}

/// **VALUE**: Verifies a server that exits before opening its socket is reported as exited.
///
/// **WHY THIS MATTERS**: wmediumd exits immediately on a bad medium file. Reporting that as a
/// timeout after ten seconds hides the real cause, which is in the server log.
///
/// **BUG THIS CATCHES**: Would catch the readiness loop ignoring the child's exit status.
#[tokio::test]
async fn given_executable_exiting_immediately_when_spawn_and_wait_called_then_returns_exited() {
    // GIVEN: `false` stands in for a wmediumd that rejects its arguments
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = ConnectorConfig::default();
    config.mode = MediumMode::SpecProb;
    config.socket_path = dir.path().join("wmediumd.sock");
    config.server.executable = "false".to_string();
    config.server.startup_timeout = Duration::from_secs(5);

    // WHEN
    let result = spawn_and_wait(&config, None).await;

    // THEN
    assert!(
        matches!(result, Err(SpawnError::Exited { .. })),
        "got {result:?}"
    );
}

/// **VALUE**: Verifies a server that never opens its socket times out and is killed.
///
/// **BUG THIS CATCHES**: Would catch the readiness loop waiting forever, or the child being
/// left running after the timeout.
#[tokio::test]
async fn given_executable_never_listening_when_spawn_and_wait_called_then_returns_timeout() {
    // GIVEN: A script that ignores its arguments and never binds the socket
    let dir = tempfile::tempdir().expect("temp dir");
    let script = dir.path().join("fake-wmediumd");
    std::fs::write(&script, "#!/bin/sh\nsleep 30\n").expect("write script");
    let mut permissions = std::fs::metadata(&script).expect("metadata").permissions();
    std::os::unix::fs::PermissionsExt::set_mode(&mut permissions, 0o755);
    std::fs::set_permissions(&script, permissions).expect("chmod");

    let mut config = ConnectorConfig::default();
    config.mode = MediumMode::SpecProb;
    config.socket_path = dir.path().join("wmediumd.sock");
    config.server.executable = script.to_string_lossy().into_owned();
    config.server.startup_timeout = Duration::from_millis(300);

    // WHEN
    let result = spawn_and_wait(&config, None).await;

    // THEN
    assert!(
        matches!(result, Err(SpawnError::Timeout { .. })),
        "got {result:?}"
    );
}
