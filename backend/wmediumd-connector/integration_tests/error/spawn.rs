use wmediumd_connector::error::connection::ConnectionError;
use wmediumd_connector::error::spawn::SpawnError;
use common::ErrorLocation;

use std::error::Error;
use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;

/// **VALUE**: Verifies that `SpawnError::Spawn` includes file/line/column location tracking.
///
/// **WHY THIS MATTERS**: wmediumd can fail to start for several reasons (not installed,
/// log file not writable, kill failed during stop). The location tells which step failed.
///
/// **BUG THIS CATCHES**: Would catch the location being dropped from the Display format.
#[test]
#[track_caller]
fn given_spawn_error_when_formatted_then_includes_location() {
    // GIVEN: A Spawn error with location
    let io_err = IoError::new(ErrorKind::NotFound, "binary not found");
    let err = SpawnError::Spawn {
        message: "Failed to spawn wmediumd".to_string(),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(io_err),
    };

    // WHEN: Formatting the error as string
    let error_string = format!("{}", err);

    // THEN: Should include error type, message, and file location
    assert!(error_string.contains("Spawn Error"));
    assert!(error_string.contains("Failed to spawn wmediumd"));
    assert!(error_string.contains("spawn.rs"));
}

/// **VALUE**: Verifies the underlying IO error stays reachable through `source()`.
///
/// **BUG THIS CATCHES**: Would catch `#[source]` being removed from the variant, which hides
/// the OS error (ENOENT vs EACCES) from callers walking the chain.
#[test]
fn given_spawn_error_when_source_requested_then_returns_io_error() {
    // GIVEN
    let err = SpawnError::Spawn {
        message: "Failed to spawn wmediumd".to_string(),
        location: ErrorLocation::caller(),
        source: Box::new(IoError::new(ErrorKind::PermissionDenied, "denied")),
    };

    // WHEN
    let source = err.source().expect("source present");

    // THEN
    assert_eq!(source.to_string(), "denied");
}

/// **VALUE**: Verifies `Exited` and `Timeout` render distinct prefixes.
///
/// **WHY THIS MATTERS**: "exited" points at the server log, "timeout" points at a slow host or
/// a wrong socket path. Confusing the two sends the reader the wrong way.
#[test]
fn given_exited_and_timeout_errors_when_formatted_then_prefixes_differ() {
    // GIVEN
    let exited = SpawnError::Exited {
        message: "wmediumd exited with exit status: 1".to_string(),
        location: ErrorLocation::caller(),
    };
    let timeout = SpawnError::Timeout {
        message: "wmediumd socket did not accept connections".to_string(),
        location: ErrorLocation::caller(),
    };

    // WHEN / THEN
    assert!(exited.to_string().starts_with("Exited Error: wmediumd exited"));
    assert!(timeout.to_string().starts_with("Timeout Error: wmediumd socket"));
}

/// **VALUE**: Verifies spawn errors convert into connection errors without losing their text.
#[test]
fn given_spawn_error_when_converted_to_connection_error_then_message_preserved() {
    // GIVEN
    let err = SpawnError::Validation {
        message: "snr mode requires a medium config file".to_string(),
        location: ErrorLocation::caller(),
    };

    // WHEN
    let converted = ConnectionError::from(err);

    // THEN: Transparent wrapper
    assert!(matches!(converted, ConnectionError::Spawn(SpawnError::Validation { .. })));
    assert!(converted.to_string().contains("snr mode requires a medium config file"));
}
