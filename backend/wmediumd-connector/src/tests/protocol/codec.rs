// Wire layout checks for the control protocol codec

use crate::error::protocol::ProtocolError;
use crate::protocol::constants::*;
use crate::protocol::{Request, ResponseKind, UpdateStatus, decode_response};

use models::{ErrorProbLink, MacAddress, SnrLink, SpecProbLink};

fn sta(n: u8) -> MacAddress {
    MacAddress::new([0x02, 0, 0, 0, n, 0])
}

/// **VALUE**: Verifies the byte layout of an SNR update request.
///
/// **WHY THIS MATTERS**: wmediumd reads the record as a packed struct. Any padding or a
/// little endian integer makes the server apply a different SNR to a different link.
///
/// **BUG THIS CATCHES**: Would catch host byte order, swapped MACs or a missing type byte.
#[test]
fn given_snr_update_when_encoded_then_layout_is_type_macs_big_endian_snr() {
    // GIVEN: An SNR update with a negative value
    let request = Request::SnrUpdate(SnrLink::new(sta(0), sta(1), -10));

    // WHEN: Encoding
    let bytes = request.encode();

    // THEN: 17 bytes, type first, then both MACs, then the big endian SNR
    assert_eq!(bytes.len(), SNR_UPDATE_REQUEST_LEN);
    assert_eq!(bytes.len(), 17);
    assert_eq!(bytes[0], WSERVER_SNR_UPDATE_REQUEST_TYPE);
    assert_eq!(&bytes[1..7], &[0x02, 0, 0, 0, 0, 0]);
    assert_eq!(&bytes[7..13], &[0x02, 0, 0, 0, 1, 0]);
    assert_eq!(&bytes[13..17], &[0xff, 0xff, 0xff, 0xf6]);
}

/// **VALUE**: Verifies error probabilities go on the wire as fixed point.
///
/// **BUG THIS CATCHES**: Would catch sending the `f64` bits or a plain scaled integer.
#[test]
fn given_errprob_update_when_encoded_then_probability_is_fixed_point() {
    // GIVEN: A 0.5 error probability
    let request = Request::ErrorProbUpdate(ErrorProbLink::new(sta(0), sta(1), 0.5));

    // WHEN: Encoding
    let bytes = request.encode();

    // THEN: Type 9 and 0xC0000000 in the last four bytes
    assert_eq!(bytes.len(), ERRPROB_UPDATE_REQUEST_LEN);
    assert_eq!(bytes[0], WSERVER_ERRPROB_UPDATE_REQUEST_TYPE);
    assert_eq!(&bytes[13..17], &[0xc0, 0, 0, 0]);
}

/// **VALUE**: Verifies the spec-prob matrix is flattened row by row after the MACs.
///
/// **WHY THIS MATTERS**: The server indexes the 144 values as `size * 12 + rate`. A column
/// major layout silently transposes the matrix.
///
/// **BUG THIS CATCHES**: Would catch a transposed flatten or a wrong record length.
#[test]
fn given_specprob_update_when_encoded_then_matrix_is_row_major() {
    // GIVEN: A matrix that is zero except for [1][0]
    let mut link = SpecProbLink::uniform(sta(0), sta(1), 0.0);
    link.errprobs[1][0] = 1.0;
    let request = Request::SpecProbUpdate(Box::new(link));

    // WHEN: Encoding
    let bytes = request.encode();

    // THEN: 589 bytes and the one non-zero value is the 13th integer
    assert_eq!(bytes.len(), SPECPROB_UPDATE_REQUEST_LEN);
    assert_eq!(bytes.len(), 589);
    let values_start = TYPE_LEN + 2 * MAC_LEN;
    let thirteenth = values_start + 12 * I32_LEN;
    assert_eq!(&bytes[thirteenth..thirteenth + 4], &[0x80, 0, 0, 0]);
    assert!(
        bytes[values_start..thirteenth].iter().all(|b| *b == 0),
        "Values before [1][0] should be zero"
    );
}

/// **VALUE**: Verifies the delete and add requests and the unanswered shutdown message.
///
/// **BUG THIS CATCHES**: Would catch a shutdown that waits for a response the server never
/// sends, which would hang every disconnect until the operation timeout.
#[test]
fn given_station_requests_when_encoded_then_sizes_and_expectations_match() {
    // GIVEN / WHEN: Station management requests
    let delete_by_id = Request::DeleteById(258).encode();
    let delete_by_mac = Request::DeleteByMac(sta(4)).encode();
    let add = Request::Add(sta(4));

    // THEN: Sizes and payloads
    assert_eq!(delete_by_id, vec![WSERVER_DEL_BY_ID_REQUEST_TYPE, 0, 0, 1, 2]);
    assert_eq!(delete_by_mac.len(), DEL_BY_MAC_REQUEST_LEN);
    assert_eq!(add.encode()[0], WSERVER_ADD_REQUEST_TYPE);
    assert_eq!(
        add.expected_response(),
        Some(ResponseKind {
            msg_type: WSERVER_ADD_RESPONSE_TYPE,
            len: ADD_RESPONSE_LEN
        })
    );

    // AND: Shutdown is a single byte that expects nothing back
    assert_eq!(Request::Shutdown.encode(), vec![WSERVER_SHUTDOWN_REQUEST_TYPE]);
    assert_eq!(Request::Shutdown.expected_response(), None);
}

/// **VALUE**: Verifies a request decodes back to what was encoded.
///
/// **WHY THIS MATTERS**: The fake server used by the integration tests decodes with this
/// function; a broken decoder would make those tests assert against garbage.
///
/// **BUG THIS CATCHES**: Would catch offset mistakes in `decode` for the MAC pair.
#[test]
fn given_encoded_snr_request_when_decoded_then_yields_same_request() {
    // GIVEN: An encoded SNR update
    let request = Request::SnrUpdate(SnrLink::new(sta(2), sta(5), 27));
    let bytes = request.encode();

    // WHEN: Decoding
    let decoded = Request::decode(&bytes).expect("valid request");

    // THEN: Identical
    assert_eq!(decoded, request);
}

/// **VALUE**: Verifies truncated or unknown request records are refused.
#[test]
fn given_truncated_request_when_decoded_then_returns_malformed() {
    // GIVEN: A request missing its last byte, and an unknown type
    let mut bytes = Request::Add(sta(1)).encode();
    bytes.pop();

    // WHEN / THEN: Both are malformed
    assert!(matches!(
        Request::decode(&bytes),
        Err(ProtocolError::Malformed { .. })
    ));
    assert!(matches!(
        Request::decode(&[42]),
        Err(ProtocolError::Malformed { .. })
    ));
}

/// **VALUE**: Verifies the add response yields the station index and the status byte.
///
/// **WHY THIS MATTERS**: The station index is the only way to later delete a station by id.
///
/// **BUG THIS CATCHES**: Would catch reading the index from the echoed request instead of
/// the trailing field, or reading the status from the wrong position.
#[test]
fn given_add_response_when_decoded_then_returns_station_and_status() {
    // GIVEN: An add response assigning station 3 with status "duplicate"
    let mut buf = vec![WSERVER_ADD_RESPONSE_TYPE];
    buf.extend(Request::Add(sta(7)).encode());
    buf.extend(3i32.to_be_bytes());
    buf.push(WUPDATE_INTF_DUPLICATE);
    let kind = Request::Add(sta(7)).expected_response().expect("add expects a response");

    // WHEN: Decoding
    let response = decode_response(kind, &buf).expect("well formed");

    // THEN: Station 3, duplicate status
    assert_eq!(response.station_id, Some(3));
    assert_eq!(response.status, UpdateStatus::InterfaceDuplicate);
    assert!(!response.status.is_success());
}

/// **VALUE**: Verifies a response of another type is reported as unexpected, not malformed.
///
/// **WHY THIS MATTERS**: An out of step response means the stream cannot be trusted anymore;
/// the manager tears the channel down on this error.
///
/// **BUG THIS CATCHES**: Would catch a decoder that checks the length before the type and
/// reports a desynchronised stream as a simple size problem.
#[test]
fn given_response_of_wrong_type_when_decoded_then_returns_unexpected_response() {
    // GIVEN: A delete-by-id response where an SNR response was expected
    let kind = Request::SnrUpdate(SnrLink::new(sta(0), sta(1), 5))
        .expected_response()
        .expect("snr update expects a response");
    let buf = vec![WSERVER_DEL_BY_ID_RESPONSE_TYPE; kind.len];

    // WHEN: Decoding
    let result = decode_response(kind, &buf);

    // THEN: Unexpected response, which breaks the channel
    let err = result.expect_err("wrong type must fail");
    assert!(matches!(err, ProtocolError::UnexpectedResponse { .. }));
    assert!(err.breaks_channel());
}

/// **VALUE**: Verifies status codes outside the known set are preserved, not mapped to success.
#[test]
fn given_unknown_status_code_when_mapped_then_kept_as_unknown() {
    // GIVEN / WHEN
    let status = UpdateStatus::from_code(9);

    // THEN
    assert_eq!(status, UpdateStatus::Unknown(9));
    assert_eq!(status.code(), 9);
    assert!(!status.is_success());
    assert_eq!(UpdateStatus::from_code(WUPDATE_WRONG_MODE), UpdateStatus::WrongMode);
}
