use crate::error::discovery::DiscoveryError;
use crate::error::spawn::SpawnError;

use common::ErrorLocation;

use std::io::Error as IoError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("Unreachable Error: {message} {location}")]
    Unreachable {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("No Server Socket Error: {message} {location}")]
    NoServerSocket {
        message: String,
        location: ErrorLocation,
    },

    #[error("Channel Closed Error: {message} {location}")]
    ChannelClosed {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
