use crate::{ModelError, ServerInfoBuilder};

fn complete_builder() -> ServerInfoBuilder {
    ServerInfoBuilder::default()
        .with_pid(4242)
        .with_socket_path("/var/run/wmediumd.sock")
        .with_command("wmediumd -l 5 -s")
        .with_owned(true)
}

fn expect_validation(builder: ServerInfoBuilder, expected: &str) {
    match builder.build() {
        Err(ModelError::Validation { message, .. }) => assert_eq!(message, expected),
        Ok(info) => panic!("Expected validation error, built {info:?}"),
    }
}

/// **VALUE**: Verifies a fully specified builder produces the expected ServerInfo.
///
/// **WHY THIS MATTERS**: ServerInfo is what the connector records about the server it
/// spawned; later it decides whether it may stop the process from the `owned` flag.
///
/// **BUG THIS CATCHES**: Would catch fields being dropped or swapped in `build()`.
#[test]
fn given_complete_builder_when_built_then_returns_server_info() {
    // GIVEN / WHEN: A complete builder
    let info = complete_builder().build().expect("valid server info");

    // THEN: All fields are carried over
    assert_eq!(info.pid, Some(4242));
    assert_eq!(info.socket_path.to_str(), Some("/var/run/wmediumd.sock"));
    assert_eq!(info.command, "wmediumd -l 5 -s");
    assert!(info.owned);
}

/// **VALUE**: Verifies that builder validation rejects zero PIDs.
///
/// **WHY THIS MATTERS**: PID 0 would make a later stop signal the whole process group.
///
/// **BUG THIS CATCHES**: Would catch if the zero PID check is deleted.
#[test]
fn given_zero_pid_when_building_server_info_then_returns_validation_error() {
    expect_validation(complete_builder().with_pid(0), "PID must be non-zero");
}

/// **VALUE**: Verifies an owned server cannot be recorded without a PID.
///
/// **WHY THIS MATTERS**: The connector stops owned servers by PID. Without one the stop
/// would silently do nothing and leak the wmediumd process.
///
/// **BUG THIS CATCHES**: Would catch if the owned/PID consistency check is removed.
#[test]
fn given_owned_without_pid_when_building_then_returns_validation_error() {
    let builder = complete_builder().with_optional_pid(None);
    expect_validation(builder, "An owned server must have a PID");
}

/// **VALUE**: Verifies that an attached server without a known PID is accepted.
///
/// **WHY THIS MATTERS**: Attaching to a socket served by a process discovery cannot see
/// (another namespace, renamed binary) is a supported mode.
///
/// **BUG THIS CATCHES**: Would catch if the PID becomes mandatory again.
#[test]
fn given_attached_server_without_pid_when_built_then_succeeds() {
    let info = complete_builder()
        .with_optional_pid(None)
        .with_owned(false)
        .build()
        .expect("attached server info");

    assert_eq!(info.pid, None);
    assert!(!info.owned);
}

/// **VALUE**: Verifies required fields are enforced.
///
/// **WHY THIS MATTERS**: An empty socket path or command produces unreadable logs and
/// a handle that points nowhere.
///
/// **BUG THIS CATCHES**: Would catch if required field checks are removed.
#[test]
fn given_missing_or_empty_fields_when_building_then_returns_validation_error() {
    expect_validation(
        ServerInfoBuilder::default().with_command("wmediumd").with_owned(false),
        "Socket path is required",
    );
    expect_validation(complete_builder().with_socket_path(""), "Socket path cannot be empty");
    expect_validation(complete_builder().with_command(""), "Command cannot be empty");
    expect_validation(
        ServerInfoBuilder::default()
            .with_socket_path("/tmp/w.sock")
            .with_owned(false),
        "Command is required",
    );
}
