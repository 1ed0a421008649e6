pub mod config;
pub mod connection;
pub mod discovery;
pub mod logger;
pub mod protocol;
pub mod spawn;

use common::ErrorLocation;

use thiserror::Error;

/// Every failure a caller of the connector can observe.
#[derive(Debug, Error)]
pub enum WmediumdError {
    #[error(transparent)]
    Configuration(#[from] config::ConfigError),

    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),

    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    #[error("State Error: {message} {location}")]
    State {
        message: String,
        location: ErrorLocation,
    },

    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },
}

impl WmediumdError {
    #[track_caller]
    pub(crate) fn state(message: impl Into<String>) -> Self {
        WmediumdError::State {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub(crate) fn timeout(message: impl Into<String>) -> Self {
        WmediumdError::Timeout {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    /// True when the control channel can no longer be trusted after this error
    /// and must be closed.
    ///
    /// A rejected update or a parameter caught before sending leaves the byte
    /// stream in sync; anything else may have left a partial message behind.
    pub fn breaks_channel(&self) -> bool {
        match self {
            WmediumdError::Protocol(err) => err.breaks_channel(),
            WmediumdError::Configuration(_) | WmediumdError::State { .. } => false,
            WmediumdError::Connection(_) | WmediumdError::Timeout { .. } => true,
        }
    }
}
