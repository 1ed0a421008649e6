use wmediumd_connector::WmediumdError;
use wmediumd_connector::error::protocol::ProtocolError;
use wmediumd_connector::protocol::UpdateStatus;
use common::ErrorLocation;

/// **VALUE**: Verifies a rejection renders the server's status alongside the message.
///
/// **WHY THIS MATTERS**: "interface not found" and "wrong medium mode" need different fixes
/// in the harness; the status must be visible in logs, not just in the variant.
#[test]
fn given_rejected_error_when_formatted_then_includes_status() {
    // GIVEN
    let err = ProtocolError::Rejected {
        status: UpdateStatus::WrongMode,
        message: "wmediumd rejected SNR update".to_string(),
        location: ErrorLocation::caller(),
    };

    // WHEN
    let error_string = err.to_string();

    // THEN
    assert!(error_string.contains("Rejected Error"));
    assert!(error_string.contains("wrong medium mode"));
    assert!(error_string.contains("protocol.rs"));
}

/// **VALUE**: Verifies which protocol errors keep the channel and which tear it down.
///
/// **WHY THIS MATTERS**: A rejection or a local parameter check leaves the byte stream in step;
/// a malformed or mismatched reply does not, and every later read would be misaligned.
///
/// **BUG THIS CATCHES**: Would catch a change to `breaks_channel` that keeps a desynchronised
/// stream alive or drops a healthy one.
#[test]
fn given_protocol_errors_when_classified_then_only_stream_errors_break_channel() {
    // GIVEN
    let invalid = ProtocolError::InvalidParameter {
        message: "errprob out of range".to_string(),
        location: ErrorLocation::caller(),
    };
    let rejected = ProtocolError::Rejected {
        status: UpdateStatus::InterfaceNotFound,
        message: "rejected".to_string(),
        location: ErrorLocation::caller(),
    };
    let unexpected = ProtocolError::UnexpectedResponse {
        message: "expected type 2, got 4".to_string(),
        location: ErrorLocation::caller(),
    };
    let malformed = ProtocolError::Malformed {
        message: "short response".to_string(),
        location: ErrorLocation::caller(),
    };

    // WHEN / THEN
    assert!(!invalid.breaks_channel());
    assert!(!rejected.breaks_channel());
    assert!(unexpected.breaks_channel());
    assert!(malformed.breaks_channel());

    // AND: The top-level error agrees
    assert!(!WmediumdError::from(invalid).breaks_channel());
    assert!(WmediumdError::from(malformed).breaks_channel());
}
