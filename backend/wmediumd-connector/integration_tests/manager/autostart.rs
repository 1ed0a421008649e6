use wmediumd_connector::discovery::process::find_running_server;
use wmediumd_connector::error::connection::ConnectionError;
use wmediumd_connector::error::spawn::SpawnError;
use wmediumd_connector::{
    ConnectionState, ConnectorConfig, InterfaceRef, MacAddress, WmediumdError, WmediumdManager,
};

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UnixListener;
use tokio::process::{Child, Command};
use tokio::time::Instant;

const PROCESS_SCAN_WAIT: Duration = Duration::from_secs(2);

/// Config that discovers or spawns `executable`, with its socket inside `dir`.
fn auto_start_config(dir: &Path, executable: &str) -> ConnectorConfig {
    let mut config = ConnectorConfig::default();
    config.socket_path = dir.join("wmediumd.sock");
    config.connect_timeout = Duration::from_secs(1);
    config.operation_timeout = Duration::from_millis(300);
    config.server.executable = executable.to_string();
    config.server.load_hwsim_module = false;
    config.server.keep_server_running = false;
    config.server.startup_timeout = Duration::from_secs(5);
    config
}

/// Start a `sleep` process standing in for an already running wmediumd and
/// wait until the process scan sees it.
async fn start_stand_in_server() -> Child {
    let child = Command::new("sleep")
        .arg("30")
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn sleep");

    let deadline = Instant::now() + PROCESS_SCAN_WAIT;
    while find_running_server("sleep").expect("process scan").is_none() {
        assert!(Instant::now() < deadline, "sleep never showed up in the process list");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    child
}

/// Write an executable script that records its arguments to `args` and exits 1.
fn write_failing_server(dir: &Path) -> (PathBuf, PathBuf) {
    let script = dir.join("fake-wmediumd-exits");
    let args = dir.join("args");
    std::fs::write(
        &script,
        format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nexit 1\n", args.display()),
    )
    .expect("write script");

    let mut permissions = std::fs::metadata(&script).expect("metadata").permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&script, permissions).expect("chmod");

    (script, args)
}

// ============================================================================
// connect() with server.auto_start: discovery and spawning
// ============================================================================

/// **VALUE**: Verifies a running server without its control socket is refused.
///
/// **WHY THIS MATTERS**: A wmediumd started by hand without `-s` accepts no control
/// connections. Spawning a second one would fight the first over the radios.
///
/// **BUG THIS CATCHES**: Would catch connect spawning anyway, or the failed attempt leaving the
/// manager in CONNECTING.
#[tokio::test]
async fn given_running_server_without_socket_when_connect_called_then_no_server_socket() {
    // GIVEN: A process named like the configured executable and no socket
    let _server = start_stand_in_server().await;
    let dir = tempfile::tempdir().expect("temp dir");
    let manager =
        WmediumdManager::new(auto_start_config(dir.path(), "sleep")).expect("valid config");

    // WHEN
    let result = manager.connect().await;

    // THEN
    assert!(
        matches!(
            result,
            Err(WmediumdError::Connection(ConnectionError::NoServerSocket { .. }))
        ),
        "got {result:?}"
    );
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.handle().await.is_none());
}

/// **VALUE**: Verifies a running server with its socket is attached to, never owned.
///
/// **WHY THIS MATTERS**: A server the harness did not start must survive the harness's
/// disconnect; marking it owned would have it stopped.
///
/// **BUG THIS CATCHES**: Would catch the attach path reporting `owned`, losing the PID, or
/// disconnect trying to stop a server it never spawned.
#[tokio::test]
async fn given_running_server_with_socket_when_connect_called_then_attaches_unowned() {
    // GIVEN: A running process and a socket accepting connections at the configured path
    let mut server = start_stand_in_server().await;
    let dir = tempfile::tempdir().expect("temp dir");
    let config = auto_start_config(dir.path(), "sleep");
    let _listener = UnixListener::bind(&config.socket_path).expect("bind");
    let manager = WmediumdManager::new(config).expect("valid config");

    // WHEN
    let handle = manager.connect().await.expect("attach");

    // THEN: Attached to a discovered, unowned server
    assert!(!handle.server().owned);
    assert!(handle.server().pid.is_some());
    assert!(handle.server().command.contains("sleep"), "{}", handle.server().command);
    assert_eq!(manager.state(), ConnectionState::Connected);

    // AND: Disconnect leaves the running server alone
    manager.disconnect().await.expect("disconnect");
    assert!(matches!(server.try_wait(), Ok(None)), "stand-in server was stopped");
}

/// **VALUE**: Verifies a spawned server exiting at startup is reported and its medium file removed.
///
/// **WHY THIS MATTERS**: wmediumd exits at once on a medium file it cannot parse. Each failed
/// attempt must not leave an `mn_wmd_config_*` file behind in the temp directory.
///
/// **BUG THIS CATCHES**: Would catch the exit being reported as a timeout, the error losing its
/// spawn cause, or the medium file leaking on the failure path.
#[tokio::test]
async fn given_server_exiting_at_startup_when_connect_called_then_exited_and_medium_file_removed() {
    // GIVEN: Two interfaces to write a medium file for and a server that exits immediately
    let dir = tempfile::tempdir().expect("temp dir");
    let (script, args) = write_failing_server(dir.path());
    let mut config = auto_start_config(dir.path(), &script.to_string_lossy());
    config.medium.interfaces = (0..2u8)
        .map(|n| {
            InterfaceRef::new(
                format!("sta{n}"),
                "wlan0",
                MacAddress::new([0x02, 0, 0, 0, n, 0]),
            )
        })
        .collect();
    let manager = WmediumdManager::new(config).expect("valid config");

    // WHEN
    let result = manager.connect().await;

    // THEN: The spawn failure surfaces as a connection error
    assert!(
        matches!(
            result,
            Err(WmediumdError::Connection(ConnectionError::Spawn(
                SpawnError::Exited { .. }
            )))
        ),
        "got {result:?}"
    );
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    // AND: The server was handed a medium file that no longer exists
    let recorded = std::fs::read_to_string(&args).expect("server recorded its arguments");
    let lines: Vec<&str> = recorded.lines().collect();
    let position = lines
        .iter()
        .position(|arg| *arg == "-c")
        .expect("medium file passed with -c");
    let medium_file = Path::new(lines[position + 1]);
    let file_name = medium_file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    assert!(file_name.starts_with("mn_wmd_config_"), "{file_name}");
    assert!(!medium_file.exists(), "{} was left behind", medium_file.display());
}
