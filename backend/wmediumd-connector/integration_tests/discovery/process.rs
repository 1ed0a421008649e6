use wmediumd_connector::discovery::process::{find_running_server, is_socket, stop_pid};
use wmediumd_connector::error::discovery::DiscoveryError;

use tokio::net::UnixListener;

// ============================================================================
// Public API tests for process discovery and management
// These test the PUBLIC interface from an external consumer's perspective
// ============================================================================

// ----------------------------------------------------------------------------
// stop_pid() - Process termination tests
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies that `stop_pid()` gracefully handles attempts to stop non-existent processes.
///
/// **WHY THIS MATTERS**: wmediumd can die between discovery and termination. If `stop_pid()`
/// panics instead of returning false, cleanup of an already-dead server crashes the harness.
///
/// **BUG THIS CATCHES**: Would catch if `stop_pid()` panics when the PID doesn't exist.
#[test]
fn given_nonexistent_pid_when_stop_pid_called_then_returns_false() {
    // GIVEN: A PID that doesn't exist
    let fake_pid = u32::MAX;

    // WHEN: Attempting to stop the process
    let result = stop_pid(fake_pid);

    // THEN: Should return false (graceful handling)
    assert!(!result, "Should return false for non-existent process");
}

/// **VALUE**: Refuses to signal PID 1 (init/systemd) or the current process.
///
/// **WHY THIS MATTERS**: Interrupting PID 1 takes the whole system down, and interrupting
/// ourselves kills the harness mid-run. Both are safety boundaries.
///
/// **BUG THIS CATCHES**: Would catch removal of either guard.
#[test]
fn given_protected_pids_when_stop_pid_called_then_refuses_and_returns_false() {
    // GIVEN: PID 0, PID 1 and our own PID
    let protected = [0, 1, std::process::id()];

    for pid in protected {
        // WHEN: Attempting to stop it
        let result = stop_pid(pid);

        // THEN: Refused
        assert!(!result, "Should never signal protected PID {pid}");
    }
}

// ----------------------------------------------------------------------------
// find_running_server() - Process lookup tests
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies that an executable that is certainly not running is not found.
///
/// **BUG THIS CATCHES**: Would catch substring matching on process names, which could mistake
/// any process containing the name for a running server.
#[test]
fn given_unused_executable_name_when_find_running_server_called_then_returns_none() {
    // GIVEN: A name no process uses
    let executable = "/opt/nowhere/wmediumd-not-running-7f3c";

    // WHEN
    let result = find_running_server(executable);

    // THEN
    assert!(matches!(result, Ok(None)), "got {result:?}");
}

/// **VALUE**: Verifies an executable without a file name is a validation error.
#[test]
fn given_executable_without_file_name_when_find_running_server_called_then_validation_error() {
    // GIVEN / WHEN
    let result = find_running_server("/");

    // THEN
    assert!(matches!(result, Err(DiscoveryError::Validation { .. })));
}

// ----------------------------------------------------------------------------
// is_socket() - Control socket checks
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies only an actual Unix socket counts as a server socket.
///
/// **WHY THIS MATTERS**: A leftover regular file at the socket path would otherwise be taken
/// as a running server, and every connect would fail with a confusing error.
///
/// **BUG THIS CATCHES**: Would catch `is_socket` degenerating into an existence check.
#[tokio::test]
async fn given_socket_file_and_regular_file_when_is_socket_called_then_only_socket_matches() {
    // GIVEN: A bound socket and a regular file
    let dir = tempfile::tempdir().expect("temp dir");
    let socket_path = dir.path().join("wmediumd.sock");
    let _listener = UnixListener::bind(&socket_path).expect("bind");
    let file_path = dir.path().join("regular");
    std::fs::write(&file_path, b"").expect("write");

    // WHEN / THEN
    assert!(is_socket(&socket_path));
    assert!(!is_socket(&file_path));
    assert!(!is_socket(&dir.path().join("absent.sock")));
}
