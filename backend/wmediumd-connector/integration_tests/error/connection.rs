use wmediumd_connector::WmediumdError;
use wmediumd_connector::error::connection::ConnectionError;
use common::ErrorLocation;

use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;

/// **VALUE**: Verifies an unreachable socket error names the socket and its location.
///
/// **WHY THIS MATTERS**: The most common setup mistake is a wrong socket path. The rendered
/// error must show the path the connector actually tried.
#[test]
#[track_caller]
fn given_unreachable_error_when_formatted_then_includes_message_and_location() {
    // GIVEN
    let err = ConnectionError::Unreachable {
        message: "Failed to connect to /var/run/wmediumd.sock".to_string(),
        location: ErrorLocation::from(Location::caller()),
        source: IoError::new(ErrorKind::NotFound, "no such file"),
    };

    // WHEN
    let error_string = err.to_string();

    // THEN
    assert!(error_string.contains("Unreachable Error"));
    assert!(error_string.contains("/var/run/wmediumd.sock"));
    assert!(error_string.contains("connection.rs"));
}

/// **VALUE**: Verifies every connection failure invalidates the channel.
///
/// **BUG THIS CATCHES**: Would catch a closed channel being classified as recoverable, which
/// leaves the manager CONNECTED on a dead socket.
#[test]
fn given_connection_errors_when_classified_then_break_channel() {
    // GIVEN
    let closed = WmediumdError::from(ConnectionError::ChannelClosed {
        message: "wmediumd closed the control socket".to_string(),
        location: ErrorLocation::caller(),
        source: IoError::new(ErrorKind::UnexpectedEof, "eof"),
    });
    let no_socket = WmediumdError::from(ConnectionError::NoServerSocket {
        message: "wmediumd already started but without server socket".to_string(),
        location: ErrorLocation::caller(),
    });

    // WHEN / THEN
    assert!(closed.breaks_channel());
    assert!(no_socket.breaks_channel());
}

/// **VALUE**: Verifies state and timeout errors render their own prefixes.
#[test]
fn given_state_and_timeout_errors_when_formatted_then_prefixes_match() {
    // GIVEN
    let state = WmediumdError::State {
        message: "Not connected to wmediumd".to_string(),
        location: ErrorLocation::caller(),
    };
    let timeout = WmediumdError::Timeout {
        message: "No response to update".to_string(),
        location: ErrorLocation::caller(),
    };

    // WHEN / THEN
    assert!(state.to_string().starts_with("State Error: Not connected"));
    assert!(timeout.to_string().starts_with("Timeout Error: No response"));
    assert!(!state.breaks_channel());
    assert!(timeout.breaks_channel());
}
