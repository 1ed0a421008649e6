use crate::protocol::UpdateStatus;

use common::ErrorLocation;
use models::ModelError;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ProtocolError {
    /// Caught before anything was written to the channel.
    #[error("Invalid Parameter Error: {message} {location}")]
    InvalidParameter {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unexpected Response Error: {message} {location}")]
    UnexpectedResponse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Malformed Message Error: {message} {location}")]
    Malformed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Rejected Error: {message} (status {status}) {location}")]
    Rejected {
        status: UpdateStatus,
        message: String,
        location: ErrorLocation,
    },
}

impl ProtocolError {
    pub fn breaks_channel(&self) -> bool {
        match self {
            ProtocolError::InvalidParameter { .. } | ProtocolError::Rejected { .. } => false,
            ProtocolError::UnexpectedResponse { .. } | ProtocolError::Malformed { .. } => true,
        }
    }
}

impl From<ModelError> for ProtocolError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        ProtocolError::InvalidParameter {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
