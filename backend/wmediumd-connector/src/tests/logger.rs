// Unit tests for logger module initialization logic
// Tests focus on thread-safety and error handling

use crate::error::logger::LoggerError;
use crate::logger::{LOG_FILE_NAME, initialize, initialize_internal};

use std::path::PathBuf;

use serial_test::serial;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: A harness may initialize logging from several setup paths. If the
/// second call panics or errors, the harness dies before wmediumd is even contacted.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed,
/// causing fern to fail when trying to set a global logger twice.
#[test]
#[serial]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = tempfile::tempdir().expect("temp dir");

    // WHEN: Calling initialize twice
    let result1 = initialize(temp_dir.path());
    let result2 = initialize(temp_dir.path());

    // THEN: Both should return Ok (second one logs warning but doesn't error)
    assert!(result1.is_ok(), "First initialization should succeed");
    assert!(
        result2.is_ok(),
        "Second initialization should succeed (idempotent)"
    );
    assert!(temp_dir.path().join(LOG_FILE_NAME).exists());
}

/// **VALUE**: Verifies that the logger handles unusable directories gracefully.
///
/// **WHY THIS MATTERS**: If the log directory cannot be written, the caller should get a
/// clear error instead of a panic.
///
/// **BUG THIS CATCHES**: Would catch if `fern::log_file()` is unwrapped instead of mapped
/// into `LoggerError`.
#[test]
#[serial]
fn given_invalid_log_dir_when_initialize_internal_called_then_returns_error() {
    // GIVEN: A path that cannot hold a file on Unix-like systems
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Initializing with it
    let result = initialize_internal(&invalid_dir);

    // THEN: Initialize error mentioning the log file
    match result {
        Err(LoggerError::Initialize { message, .. }) => {
            assert!(message.contains(LOG_FILE_NAME), "got {message}");
        }
        Ok(()) => panic!("Should return error for invalid log directory"),
    }
}
