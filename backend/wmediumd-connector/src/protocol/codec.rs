use super::UpdateStatus;
use super::constants::*;
use super::fixed_point::{from_fixed_point, to_fixed_point};
use crate::error::protocol::ProtocolError;

use common::ErrorLocation;
use models::{ErrorProbLink, LINK_RATE_COUNT, MacAddress, SnrLink, SpecProbLink, SpecProbMatrix};

/// A control message sent from the connector to wmediumd.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Shutdown,
    SnrUpdate(SnrLink),
    ErrorProbUpdate(ErrorProbLink),
    SpecProbUpdate(Box<SpecProbLink>),
    DeleteByMac(MacAddress),
    DeleteById(i32),
    Add(MacAddress),
}

/// Type byte and total size of the response a request expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseKind {
    pub msg_type: u8,
    pub len: usize,
}

/// A decoded update response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub msg_type: u8,
    pub status: UpdateStatus,
    /// Station index assigned by the server, present on add responses only.
    pub station_id: Option<i32>,
}

impl Request {
    pub fn msg_type(&self) -> u8 {
        match self {
            Request::Shutdown => WSERVER_SHUTDOWN_REQUEST_TYPE,
            Request::SnrUpdate(_) => WSERVER_SNR_UPDATE_REQUEST_TYPE,
            Request::ErrorProbUpdate(_) => WSERVER_ERRPROB_UPDATE_REQUEST_TYPE,
            Request::SpecProbUpdate(_) => WSERVER_SPECPROB_UPDATE_REQUEST_TYPE,
            Request::DeleteByMac(_) => WSERVER_DEL_BY_MAC_REQUEST_TYPE,
            Request::DeleteById(_) => WSERVER_DEL_BY_ID_REQUEST_TYPE,
            Request::Add(_) => WSERVER_ADD_REQUEST_TYPE,
        }
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Shutdown => "shutdown",
            Request::SnrUpdate(_) => "snr update",
            Request::ErrorProbUpdate(_) => "errprob update",
            Request::SpecProbUpdate(_) => "specprob update",
            Request::DeleteByMac(_) => "delete by mac",
            Request::DeleteById(_) => "delete by id",
            Request::Add(_) => "add",
        }
    }

    /// The response this request is answered with. `None` for the shutdown
    /// message, which the server does not answer.
    pub fn expected_response(&self) -> Option<ResponseKind> {
        let (msg_type, len) = match self {
            Request::Shutdown => return None,
            Request::SnrUpdate(_) => (WSERVER_SNR_UPDATE_RESPONSE_TYPE, SNR_UPDATE_RESPONSE_LEN),
            Request::ErrorProbUpdate(_) => (
                WSERVER_ERRPROB_UPDATE_RESPONSE_TYPE,
                ERRPROB_UPDATE_RESPONSE_LEN,
            ),
            Request::SpecProbUpdate(_) => (
                WSERVER_SPECPROB_UPDATE_RESPONSE_TYPE,
                SPECPROB_UPDATE_RESPONSE_LEN,
            ),
            Request::DeleteByMac(_) => (WSERVER_DEL_BY_MAC_RESPONSE_TYPE, DEL_BY_MAC_RESPONSE_LEN),
            Request::DeleteById(_) => (WSERVER_DEL_BY_ID_RESPONSE_TYPE, DEL_BY_ID_RESPONSE_LEN),
            Request::Add(_) => (WSERVER_ADD_RESPONSE_TYPE, ADD_RESPONSE_LEN),
        };
        Some(ResponseKind { msg_type, len })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(request_len(self.msg_type()).unwrap_or(TYPE_LEN));
        buf.push(self.msg_type());

        match self {
            Request::Shutdown => {}
            Request::SnrUpdate(link) => {
                buf.extend_from_slice(&link.from.octets());
                buf.extend_from_slice(&link.to.octets());
                buf.extend_from_slice(&link.snr.to_be_bytes());
            }
            Request::ErrorProbUpdate(link) => {
                buf.extend_from_slice(&link.from.octets());
                buf.extend_from_slice(&link.to.octets());
                buf.extend_from_slice(&to_fixed_point(link.errprob).to_be_bytes());
            }
            Request::SpecProbUpdate(link) => {
                buf.extend_from_slice(&link.from.octets());
                buf.extend_from_slice(&link.to.octets());
                for value in link.flattened() {
                    buf.extend_from_slice(&to_fixed_point(value).to_be_bytes());
                }
            }
            Request::DeleteByMac(mac) | Request::Add(mac) => {
                buf.extend_from_slice(&mac.octets());
            }
            Request::DeleteById(id) => {
                buf.extend_from_slice(&id.to_be_bytes());
            }
        }

        buf
    }

    /// Parse a complete request record. Used by servers and test doubles
    /// speaking the same contract.
    #[track_caller]
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        let msg_type = *buf.first().ok_or_else(|| malformed("Empty request"))?;
        let expected_len = request_len(msg_type)
            .ok_or_else(|| malformed(format!("Unknown request type {msg_type}")))?;

        if buf.len() != expected_len {
            return Err(malformed(format!(
                "Request type {msg_type} has {} bytes, expected {expected_len}",
                buf.len()
            )));
        }

        let body = &buf[TYPE_LEN..];
        let request = match msg_type {
            WSERVER_SHUTDOWN_REQUEST_TYPE => Request::Shutdown,
            WSERVER_SNR_UPDATE_REQUEST_TYPE => Request::SnrUpdate(SnrLink::new(
                read_mac(body, 0),
                read_mac(body, MAC_LEN),
                read_i32(body, 2 * MAC_LEN),
            )),
            WSERVER_ERRPROB_UPDATE_REQUEST_TYPE => Request::ErrorProbUpdate(ErrorProbLink::new(
                read_mac(body, 0),
                read_mac(body, MAC_LEN),
                from_fixed_point(read_i32(body, 2 * MAC_LEN)),
            )),
            WSERVER_SPECPROB_UPDATE_REQUEST_TYPE => {
                let mut errprobs: SpecProbMatrix = Default::default();
                for (index, chunk) in body[2 * MAC_LEN..].chunks_exact(I32_LEN).enumerate() {
                    let value = read_i32(chunk, 0);
                    errprobs[index / LINK_RATE_COUNT][index % LINK_RATE_COUNT] =
                        from_fixed_point(value);
                }
                Request::SpecProbUpdate(Box::new(SpecProbLink::new(
                    read_mac(body, 0),
                    read_mac(body, MAC_LEN),
                    errprobs,
                )))
            }
            WSERVER_DEL_BY_MAC_REQUEST_TYPE => Request::DeleteByMac(read_mac(body, 0)),
            WSERVER_DEL_BY_ID_REQUEST_TYPE => Request::DeleteById(read_i32(body, 0)),
            WSERVER_ADD_REQUEST_TYPE => Request::Add(read_mac(body, 0)),
            other => return Err(malformed(format!("Unknown request type {other}"))),
        };

        Ok(request)
    }
}

/// Size of a request record given its type byte.
pub fn request_len(msg_type: u8) -> Option<usize> {
    match msg_type {
        WSERVER_SHUTDOWN_REQUEST_TYPE => Some(SHUTDOWN_REQUEST_LEN),
        WSERVER_SNR_UPDATE_REQUEST_TYPE => Some(SNR_UPDATE_REQUEST_LEN),
        WSERVER_ERRPROB_UPDATE_REQUEST_TYPE => Some(ERRPROB_UPDATE_REQUEST_LEN),
        WSERVER_SPECPROB_UPDATE_REQUEST_TYPE => Some(SPECPROB_UPDATE_REQUEST_LEN),
        WSERVER_DEL_BY_MAC_REQUEST_TYPE => Some(DEL_BY_MAC_REQUEST_LEN),
        WSERVER_DEL_BY_ID_REQUEST_TYPE => Some(DEL_BY_ID_REQUEST_LEN),
        WSERVER_ADD_REQUEST_TYPE => Some(ADD_REQUEST_LEN),
        _ => None,
    }
}

/// Decode a response record read from the channel.
///
/// The type byte is checked first: a response of another type means the
/// stream is out of step with the requests and nothing after it can be
/// trusted.
#[track_caller]
pub fn decode_response(kind: ResponseKind, buf: &[u8]) -> Result<Response, ProtocolError> {
    let received_type = *buf
        .first()
        .ok_or_else(|| malformed("Empty response"))?;

    if received_type != kind.msg_type {
        return Err(ProtocolError::UnexpectedResponse {
            message: format!(
                "Received response of unknown type {received_type}, expected {}",
                kind.msg_type
            ),
            location: ErrorLocation::caller(),
        });
    }

    if buf.len() != kind.len {
        return Err(malformed(format!(
            "Response type {received_type} has {} bytes, expected {}",
            buf.len(),
            kind.len
        )));
    }

    let status = UpdateStatus::from_code(buf[kind.len - STATUS_LEN]);
    let station_id = (received_type == WSERVER_ADD_RESPONSE_TYPE)
        .then(|| read_i32(buf, kind.len - STATUS_LEN - I32_LEN));

    Ok(Response {
        msg_type: received_type,
        status,
        station_id,
    })
}

#[track_caller]
fn malformed(message: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed {
        message: message.into(),
        location: ErrorLocation::caller(),
    }
}

// Callers check lengths before slicing.
fn read_mac(buf: &[u8], offset: usize) -> MacAddress {
    let mut octets = [0u8; MAC_LEN];
    octets.copy_from_slice(&buf[offset..offset + MAC_LEN]);
    MacAddress::new(octets)
}

fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
