//! wmediumd server control protocol.
//!
//! Messages are fixed-size records in network byte order without padding.
//! The first byte of every message is its type; each update response echoes
//! the request it answers and ends with a one byte [`UpdateStatus`].

pub mod codec;
pub mod constants;
pub mod fixed_point;

pub use codec::{Request, Response, ResponseKind, decode_response, request_len};
pub use fixed_point::{from_fixed_point, to_fixed_point};

use constants::{WUPDATE_INTF_DUPLICATE, WUPDATE_INTF_NOTFOUND, WUPDATE_SUCCESS, WUPDATE_WRONG_MODE};

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Result code carried in the last byte of every update response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStatus {
    Success,
    InterfaceNotFound,
    InterfaceDuplicate,
    WrongMode,
    Unknown(u8),
}

impl UpdateStatus {
    pub const fn from_code(code: u8) -> Self {
        match code {
            WUPDATE_SUCCESS => UpdateStatus::Success,
            WUPDATE_INTF_NOTFOUND => UpdateStatus::InterfaceNotFound,
            WUPDATE_INTF_DUPLICATE => UpdateStatus::InterfaceDuplicate,
            WUPDATE_WRONG_MODE => UpdateStatus::WrongMode,
            other => UpdateStatus::Unknown(other),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            UpdateStatus::Success => WUPDATE_SUCCESS,
            UpdateStatus::InterfaceNotFound => WUPDATE_INTF_NOTFOUND,
            UpdateStatus::InterfaceDuplicate => WUPDATE_INTF_DUPLICATE,
            UpdateStatus::WrongMode => WUPDATE_WRONG_MODE,
            UpdateStatus::Unknown(code) => code,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, UpdateStatus::Success)
    }
}

impl Display for UpdateStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            UpdateStatus::Success => formatter.write_str("success"),
            UpdateStatus::InterfaceNotFound => formatter.write_str("interface not found"),
            UpdateStatus::InterfaceDuplicate => formatter.write_str("interface duplicate"),
            UpdateStatus::WrongMode => formatter.write_str("wrong medium mode"),
            UpdateStatus::Unknown(code) => write!(formatter, "unknown code {code}"),
        }
    }
}
