use crate::helpers::{Behavior, FakeWmediumd};

use wmediumd_connector::error::connection::ConnectionError;
use wmediumd_connector::protocol::Request;
use wmediumd_connector::{
    ConnectionState, ConnectorConfig, LinkSetting, MacAddress, WmediumdError, WmediumdManager,
};

use std::time::Duration;

fn sta(n: u8) -> MacAddress {
    MacAddress::new([0x02, 0, 0, 0, n, 0])
}

// ============================================================================
// Lifecycle tests against a fake wmediumd
// These drive the manager the way a test harness would
// ============================================================================

/// **VALUE**: Verifies connect is idempotent.
///
/// **WHY THIS MATTERS**: Harness setup code often calls connect from several places. A second
/// socket would leave the first one dangling in wmediumd's client list.
///
/// **BUG THIS CATCHES**: Would catch connect opening a new channel (new handle id, second
/// server side connection) while already connected.
#[tokio::test]
async fn given_connected_manager_when_connect_called_again_then_returns_same_handle() {
    // GIVEN: A manager connected to a fake server
    let server = FakeWmediumd::start().await;
    let manager = WmediumdManager::new(server.config()).expect("valid config");
    let first = manager.connect().await.expect("first connect");

    // WHEN: Connecting again
    let second = manager.connect().await.expect("second connect");

    // THEN: Same handle, one server side connection
    assert_eq!(first.id(), second.id());
    assert_eq!(first.socket_path(), server.socket_path());
    assert_eq!(first.owner_pid(), std::process::id());
    assert!(!first.server().owned, "Attached servers are never owned");
    manager
        .set_link_snr(sta(0), sta(1), 10)
        .await
        .expect("channel usable");
    assert_eq!(server.recorded().connections, 1);
    assert_eq!(manager.state(), ConnectionState::Connected);
}

/// **VALUE**: Verifies disconnect twice is a quiet no-op the second time.
///
/// **BUG THIS CATCHES**: Would catch a second disconnect failing with a state error or
/// sending a second shutdown message on a closed socket.
#[tokio::test]
async fn given_disconnected_manager_when_disconnect_called_again_then_no_error() {
    // GIVEN: A connected manager
    let server = FakeWmediumd::start().await;
    let manager = WmediumdManager::new(server.config()).expect("valid config");
    manager.connect().await.expect("connect");

    // WHEN: Disconnecting twice
    let first = manager.disconnect().await;
    let second = manager.disconnect().await;

    // THEN: Both succeed and exactly one shutdown reached the server
    assert!(first.is_ok(), "first disconnect failed: {first:?}");
    assert!(second.is_ok(), "second disconnect failed: {second:?}");
    assert!(server.wait_until(|r| r.shutdowns == 1).await);
    assert_eq!(server.recorded().shutdowns, 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.handle().await.is_none());
}

/// **VALUE**: Verifies control operations are refused before connect without touching the socket.
///
/// **WHY THIS MATTERS**: An update sent outside a session would be applied by a server the
/// harness thinks it does not control.
///
/// **BUG THIS CATCHES**: Would catch operations lazily connecting, or a state check placed
/// after the write.
#[tokio::test]
async fn given_never_connected_manager_when_update_called_then_state_error_and_no_traffic() {
    // GIVEN: A manager that was never connected
    let server = FakeWmediumd::start().await;
    let manager = WmediumdManager::new(server.config()).expect("valid config");

    // WHEN: Sending an update and registering an interface
    let update = manager.set_link_snr(sta(0), sta(1), 5).await;
    let register = manager.register_interface(sta(0)).await;

    // THEN: State errors and nothing reached the server
    assert!(matches!(update, Err(WmediumdError::State { .. })));
    assert!(matches!(register, Err(WmediumdError::State { .. })));
    let recorded = server.recorded();
    assert_eq!(recorded.connections, 0);
    assert!(recorded.requests.is_empty());
}

/// **VALUE**: Verifies a timed out operation leaves the manager disconnected and a
/// reconnect starts clean.
///
/// **WHY THIS MATTERS**: After a timeout the response may still arrive later and would be
/// read as the answer to the next request. The channel must be discarded.
///
/// **BUG THIS CATCHES**: Would catch a manager that keeps the channel after a timeout, or one
/// that cannot reconnect because stale state survived the teardown.
#[tokio::test]
async fn given_silent_server_when_operation_times_out_then_disconnected_and_reconnect_succeeds() {
    // GIVEN: A connected manager and a server that stops answering
    let server = FakeWmediumd::start().await;
    let manager = WmediumdManager::new(server.config()).expect("valid config");
    let first = manager.connect().await.expect("connect");
    server.set_behavior(Behavior::Silent);

    // WHEN: An update gets no response
    let result = manager.set_link_snr(sta(0), sta(1), 15).await;

    // THEN: Timeout, disconnected, no handle, nothing recorded in the ledger
    assert!(matches!(result, Err(WmediumdError::Timeout { .. })), "got {result:?}");
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.handle().await.is_none());
    assert_eq!(manager.link_setting(sta(0), sta(1)).await, None);

    // AND WHEN: The server recovers and the harness reconnects
    server.set_behavior(Behavior::Normal);
    let second = manager.connect().await.expect("reconnect");
    let ack = manager.set_link_snr(sta(0), sta(1), 15).await;

    // THEN: Fresh handle on a fresh connection, updates work again
    assert_ne!(first.id(), second.id());
    assert!(ack.is_ok(), "update after reconnect failed: {ack:?}");
    assert_eq!(server.recorded().connections, 2);
}

/// **VALUE**: Verifies an abandoned exchange poisons the channel.
///
/// **WHY THIS MATTERS**: A caller wrapping an update in its own shorter timeout drops the
/// future mid-exchange. The reply still in flight would otherwise answer the next request.
///
/// **BUG THIS CATCHES**: Would catch the manager reusing a channel whose last exchange never
/// completed.
#[tokio::test]
async fn given_abandoned_exchange_when_next_operation_called_then_state_error_and_teardown() {
    // GIVEN: A connected manager, a silent server and a caller giving up early
    let server = FakeWmediumd::start().await;
    let mut config = server.config();
    config.operation_timeout = Duration::from_secs(5);
    let manager = WmediumdManager::new(config).expect("valid config");
    manager.connect().await.expect("connect");
    server.set_behavior(Behavior::Silent);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        manager.set_link_snr(sta(0), sta(1), 20),
    )
    .await;
    assert!(abandoned.is_err(), "Caller timeout should fire first");

    // WHEN: The next operation runs
    server.set_behavior(Behavior::Normal);
    let result = manager.set_link_snr(sta(0), sta(1), 20).await;

    // THEN: Refused with a state error and the channel is gone
    assert!(matches!(result, Err(WmediumdError::State { .. })), "got {result:?}");
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    // AND: A reconnect works
    manager.connect().await.expect("reconnect");
    assert!(manager.set_link_snr(sta(0), sta(1), 20).await.is_ok());
}

/// **VALUE**: Verifies disconnect unregisters interfaces and ends the session.
///
/// **WHY THIS MATTERS**: wmediumd keeps registered stations after the client leaves; stale
/// entries make the next run's ADD requests fail with "duplicate".
///
/// **BUG THIS CATCHES**: Would catch disconnect skipping the unregister pass or forgetting the
/// shutdown message.
#[tokio::test]
async fn given_registered_interfaces_when_disconnect_called_then_unregisters_and_sends_shutdown() {
    // GIVEN: Two registered interfaces
    let server = FakeWmediumd::start().await;
    let manager = WmediumdManager::new(server.config()).expect("valid config");
    manager.connect().await.expect("connect");
    let first = manager.register_interface(sta(0)).await.expect("register");
    let second = manager.register_interface(sta(1)).await.expect("register");
    assert_eq!((first, second), (0, 1));
    assert_eq!(manager.registered_interfaces().await.len(), 2);

    // WHEN: Disconnecting
    manager.disconnect().await.expect("disconnect");

    // THEN: Server saw both deletes followed by the shutdown
    assert!(server.wait_until(|r| r.shutdowns == 1).await);
    let recorded = server.recorded();
    assert!(recorded.stations.is_empty(), "left: {:?}", recorded.stations);
    let tail: Vec<Request> = recorded.requests.iter().rev().take(3).cloned().collect();
    assert_eq!(tail[0], Request::Shutdown);
    assert!(tail[1..].contains(&Request::DeleteByMac(sta(0))));
    assert!(tail[1..].contains(&Request::DeleteByMac(sta(1))));
    assert!(manager.registered_interfaces().await.is_empty());
}

/// **VALUE**: Verifies a disconnect abandoned mid-exchange still leaves the manager disconnected.
///
/// **WHY THIS MATTERS**: Harness teardown code often wraps disconnect in its own timeout. If the
/// future is dropped while an unregister waits for its response, the manager must not keep
/// reporting CONNECTED without a channel, and the interface the server still holds must not be
/// forgotten.
///
/// **BUG THIS CATCHES**: Would catch the lifecycle state being published only after the awaited
/// exchanges, or the registry being emptied before the server acknowledged each removal.
#[tokio::test]
async fn given_unanswered_unregister_when_disconnect_abandoned_then_disconnected_and_interface_kept() {
    // GIVEN: A registered interface and a server that stops answering
    let server = FakeWmediumd::start().await;
    let manager = WmediumdManager::new(server.config()).expect("valid config");
    manager.connect().await.expect("connect");
    manager.register_interface(sta(0)).await.expect("register");
    server.set_behavior(Behavior::Silent);

    // WHEN: The caller gives up on disconnect while the unregister is in flight
    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), manager.disconnect()).await;
    assert!(abandoned.is_err(), "Caller timeout should fire first");

    // THEN: Disconnected, no handle, operations refused, the interface still tracked
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(!manager.is_connected());
    assert!(manager.handle().await.is_none());
    assert_eq!(manager.registered_interfaces().await.get(&sta(0)), Some(&0));
    let update = manager.set_link_snr(sta(0), sta(1), 5).await;
    assert!(matches!(update, Err(WmediumdError::State { .. })), "got {update:?}");

    // AND WHEN: The next session disconnects normally
    server.set_behavior(Behavior::Normal);
    manager.connect().await.expect("reconnect");
    manager.disconnect().await.expect("disconnect");

    // THEN: The interface the server still held is unregistered
    assert!(server.wait_until(|r| r.stations.is_empty()).await);
    assert!(manager.registered_interfaces().await.is_empty());
}

/// **VALUE**: Verifies a missing socket surfaces as a connection error.
///
/// **BUG THIS CATCHES**: Would catch a missing socket reported as a timeout or leaving the
/// manager stuck in CONNECTING.
#[tokio::test]
async fn given_missing_socket_when_connect_called_then_connection_error() {
    // GIVEN: A socket path nothing listens on
    let dir = tempfile::tempdir().expect("temp dir");
    let config = ConnectorConfig::attach(dir.path().join("absent.sock"));
    let manager = WmediumdManager::new(config).expect("valid config");

    // WHEN
    let result = manager.connect().await;

    // THEN
    assert!(
        matches!(
            result,
            Err(WmediumdError::Connection(ConnectionError::Unreachable { .. }))
        ),
        "got {result:?}"
    );
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

/// **VALUE**: Verifies the published lifecycle follows the connection.
#[tokio::test]
async fn given_state_subscriber_when_connecting_and_disconnecting_then_sees_transitions() {
    // GIVEN: A subscriber
    let server = FakeWmediumd::start().await;
    let manager = WmediumdManager::new(server.config()).expect("valid config");
    let receiver = manager.subscribe_state();
    assert_eq!(*receiver.borrow(), ConnectionState::Disconnected);

    // WHEN / THEN: Connected after connect
    manager.connect().await.expect("connect");
    assert_eq!(*receiver.borrow(), ConnectionState::Connected);
    assert!(manager.is_connected());

    // WHEN / THEN: Disconnected after disconnect
    manager.disconnect().await.expect("disconnect");
    assert_eq!(*receiver.borrow(), ConnectionState::Disconnected);
}

/// **VALUE**: End to end: connect, update, disconnect, then refused.
///
/// **WHY THIS MATTERS**: This is the exact sequence a harness runs per test case.
///
/// **BUG THIS CATCHES**: Would catch any lifecycle step leaving state behind that lets an
/// update through after disconnect.
#[tokio::test]
async fn given_valid_endpoint_when_full_session_runs_then_update_acknowledged_and_later_refused() {
    // GIVEN: A fake server
    let server = FakeWmediumd::start().await;
    let manager = WmediumdManager::new(server.config()).expect("valid config");

    // WHEN: Running a session
    manager.connect().await.expect("connect");
    let ack = manager
        .set_link_error_rate(sta(0), sta(1), 0.1)
        .await
        .expect("acknowledged");
    manager.disconnect().await.expect("disconnect");
    let after = manager.set_link_error_rate(sta(0), sta(1), 0.1).await;

    // THEN: Acknowledged during the session, state error afterwards
    assert_eq!(ack.from, sta(0));
    assert_eq!(ack.to, sta(1));
    assert_eq!(ack.setting, LinkSetting::ErrorProb(0.1));
    assert!(matches!(after, Err(WmediumdError::State { .. })));
}
