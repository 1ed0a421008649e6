use crate::helpers::{Behavior, FakeWmediumd};

use wmediumd_connector::error::protocol::ProtocolError;
use wmediumd_connector::protocol::UpdateStatus;
use wmediumd_connector::protocol::constants::WUPDATE_INTF_NOTFOUND;
use wmediumd_connector::{
    ConnectionState, LinkSetting, MacAddress, SpecProbLink, WmediumdError, WmediumdManager,
};

use std::sync::Arc;

fn sta(n: u8) -> MacAddress {
    MacAddress::new([0x02, 0, 0, 0, n, 0])
}

async fn connected(server: &FakeWmediumd) -> WmediumdManager {
    let manager = WmediumdManager::new(server.config()).expect("valid config");
    manager.connect().await.expect("connect");
    manager
}

// ============================================================================
// Control operation tests against a fake wmediumd
// ============================================================================

/// **VALUE**: Verifies a value sent to the server can be read back from the manager.
///
/// **WHY THIS MATTERS**: wmediumd has no query message; `link_setting` is the harness's only
/// view of the medium and must match what the server actually decoded.
///
/// **BUG THIS CATCHES**: Would catch the ledger recording before acknowledgement, recording
/// under a swapped key, or a probability the server decodes differently.
#[tokio::test]
async fn given_acknowledged_updates_when_link_setting_queried_then_matches_server_view() {
    // GIVEN: A connected manager
    let server = FakeWmediumd::start().await;
    let manager = connected(&server).await;

    // WHEN: Setting an error rate and an SNR on opposite directions
    manager
        .set_link_error_rate(sta(0), sta(1), 0.1)
        .await
        .expect("errprob acknowledged");
    manager
        .set_link_snr(sta(1), sta(0), -3)
        .await
        .expect("snr acknowledged");

    // THEN: The manager reports what it sent, the server decoded the same values
    assert_eq!(
        manager.link_setting(sta(0), sta(1)).await,
        Some(LinkSetting::ErrorProb(0.1))
    );
    assert_eq!(
        manager.link_setting(sta(1), sta(0)).await,
        Some(LinkSetting::Snr(-3))
    );

    let recorded = server.recorded();
    let decoded = recorded.errprob[&(sta(0), sta(1))];
    assert!((decoded - 0.1).abs() < 1e-9, "server decoded {decoded}");
    assert_eq!(recorded.snr[&(sta(1), sta(0))], -3);
}

/// **VALUE**: Verifies a full spec-prob matrix reaches the server intact.
#[tokio::test]
async fn given_specprob_link_when_updated_then_server_decodes_full_matrix() {
    // GIVEN: A matrix with distinct corner values
    let server = FakeWmediumd::start().await;
    let manager = connected(&server).await;
    let mut link = SpecProbLink::uniform(sta(0), sta(1), 0.5);
    link.errprobs[0][11] = 0.25;
    link.errprobs[11][0] = 0.75;

    // WHEN
    let ack = manager.update_link_specprob(&link).await.expect("acknowledged");

    // THEN
    assert_eq!(ack.setting, LinkSetting::SpecProb(Box::new(link.errprobs)));
    let matrix = server.recorded().specprob[&(sta(0), sta(1))];
    assert!((matrix[0][11] - 0.25).abs() < 1e-9);
    assert!((matrix[11][0] - 0.75).abs() < 1e-9);
    assert!((matrix[5][5] - 0.5).abs() < 1e-9);
}

/// **VALUE**: Verifies invalid parameters are refused before anything is sent.
///
/// **WHY THIS MATTERS**: An out of range probability wraps around in fixed point and the
/// server would happily apply a wrong value.
///
/// **BUG THIS CATCHES**: Would catch validation after the write, or a validation failure
/// tearing down a healthy channel.
#[tokio::test]
async fn given_invalid_parameters_when_update_called_then_invalid_parameter_and_nothing_sent() {
    // GIVEN: A connected manager
    let server = FakeWmediumd::start().await;
    let manager = connected(&server).await;

    // WHEN: Sending an out of range rate, a self link and a negative station index
    let rate = manager.set_link_error_rate(sta(0), sta(1), 1.5).await;
    let self_link = manager.set_link_snr(sta(2), sta(2), 10).await;
    let station = manager.unregister_station(-1).await;

    // THEN: All rejected locally, nothing on the wire, still connected
    for result in [rate.map(|_| ()), self_link.map(|_| ()), station] {
        assert!(
            matches!(
                result,
                Err(WmediumdError::Protocol(ProtocolError::InvalidParameter { .. }))
            ),
            "got {result:?}"
        );
    }
    assert!(server.recorded().requests.is_empty());
    assert_eq!(manager.state(), ConnectionState::Connected);
}

/// **VALUE**: Verifies invalid parameters win over the state check.
#[tokio::test]
async fn given_disconnected_manager_when_invalid_update_called_then_invalid_parameter() {
    // GIVEN: A manager that is not connected
    let server = FakeWmediumd::start().await;
    let manager = WmediumdManager::new(server.config()).expect("valid config");

    // WHEN
    let result = manager.set_link_error_rate(sta(0), sta(1), -0.5).await;

    // THEN
    assert!(matches!(
        result,
        Err(WmediumdError::Protocol(ProtocolError::InvalidParameter { .. }))
    ));
}

/// **VALUE**: Verifies a rejected update is reported and the channel stays usable.
///
/// **WHY THIS MATTERS**: "Interface not found" is routine while a harness is still adding
/// stations. Dropping the connection for it would force a reconnect storm.
///
/// **BUG THIS CATCHES**: Would catch status codes being ignored (false acknowledgement) or a
/// rejection tearing down the channel.
#[tokio::test]
async fn given_server_rejects_update_when_update_called_then_rejected_and_channel_kept() {
    // GIVEN: A server rejecting with "interface not found"
    let server = FakeWmediumd::start().await;
    let manager = connected(&server).await;
    server.set_behavior(Behavior::Reject(WUPDATE_INTF_NOTFOUND));

    // WHEN
    let result = manager.set_link_snr(sta(0), sta(1), 12).await;

    // THEN: Rejected with the status, still connected, no ledger entry
    match result {
        Err(WmediumdError::Protocol(ProtocolError::Rejected { status, .. })) => {
            assert_eq!(status, UpdateStatus::InterfaceNotFound);
        }
        other => panic!("Expected rejection, got {other:?}"),
    }
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(manager.link_setting(sta(0), sta(1)).await, None);

    // AND: The same connection carries the next update
    server.set_behavior(Behavior::Normal);
    manager
        .set_link_snr(sta(0), sta(1), 12)
        .await
        .expect("accepted after rejection");
    assert_eq!(server.recorded().connections, 1);
}

/// **VALUE**: Verifies a response of the wrong type tears the channel down.
///
/// **BUG THIS CATCHES**: Would catch the manager continuing on a stream that is out of step
/// with its requests.
#[tokio::test]
async fn given_wrong_response_type_when_update_called_then_unexpected_response_and_disconnected() {
    // GIVEN: A server answering with the wrong message type
    let server = FakeWmediumd::start().await;
    let manager = connected(&server).await;
    server.set_behavior(Behavior::WrongType);

    // WHEN
    let result = manager.set_link_snr(sta(0), sta(1), 8).await;

    // THEN
    assert!(
        matches!(
            result,
            Err(WmediumdError::Protocol(ProtocolError::UnexpectedResponse { .. }))
        ),
        "got {result:?}"
    );
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.handle().await.is_none());
}

/// **VALUE**: Verifies station registration and removal through both delete messages.
///
/// **BUG THIS CATCHES**: Would catch the manager's registry diverging from the server, e.g.
/// a station removed by index still being unregistered again at disconnect.
#[tokio::test]
async fn given_registered_stations_when_unregistered_then_registry_follows_server() {
    // GIVEN: Three registered interfaces
    let server = FakeWmediumd::start().await;
    let manager = connected(&server).await;
    for n in 0..3 {
        manager.register_interface(sta(n)).await.expect("register");
    }

    // WHEN: Registering a duplicate, removing one by MAC and one by index
    let duplicate = manager.register_interface(sta(0)).await;
    manager.unregister_interface(sta(1)).await.expect("by mac");
    manager.unregister_station(2).await.expect("by index");
    let unknown = manager.unregister_station(42).await;

    // THEN
    assert!(matches!(
        duplicate,
        Err(WmediumdError::Protocol(ProtocolError::Rejected {
            status: UpdateStatus::InterfaceDuplicate,
            ..
        }))
    ));
    assert!(matches!(
        unknown,
        Err(WmediumdError::Protocol(ProtocolError::Rejected {
            status: UpdateStatus::InterfaceNotFound,
            ..
        }))
    ));
    let registered = manager.registered_interfaces().await;
    assert_eq!(registered.len(), 1);
    assert_eq!(registered.get(&sta(0)), Some(&0));
    assert_eq!(server.recorded().stations, registered);
}

/// **VALUE**: Verifies concurrent callers never interleave messages on the socket.
///
/// **WHY THIS MATTERS**: Harnesses update many links in parallel. Two half written records
/// would be decoded by wmediumd as garbage updates on random links.
///
/// **BUG THIS CATCHES**: Would catch the lock being released between write and read.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_concurrent_callers_when_updating_links_then_every_update_arrives_intact() {
    // GIVEN: A shared connected manager
    let server = FakeWmediumd::start().await;
    let manager = Arc::new(connected(&server).await);

    // WHEN: Sixteen tasks update distinct links at once
    let tasks: Vec<_> = (0..16u8)
        .map(|n| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.set_link_snr(sta(n), sta(n + 100), i32::from(n)).await })
        })
        .collect();

    for task in tasks {
        task.await.expect("task panicked").expect("update acknowledged");
    }

    // THEN: The server decoded every update with its own value
    let recorded = server.recorded();
    assert_eq!(recorded.snr.len(), 16);
    for n in 0..16u8 {
        assert_eq!(recorded.snr[&(sta(n), sta(n + 100))], i32::from(n));
    }
    assert_eq!(recorded.connections, 1);
}
