//! Client for the wmediumd wireless medium emulator.
//!
//! The connector finds (or starts) a wmediumd server, keeps one control
//! connection to its Unix socket and pushes link quality updates and
//! interface registrations over it. Entry point is [`WmediumdManager`].

pub mod config;
pub mod discovery;
pub mod error;
pub mod logger;
pub mod manager;
pub mod medium;
pub mod protocol;

mod channel;
#[cfg(test)]
mod tests;

pub use config::ConnectorConfig;
pub use error::WmediumdError;
pub use manager::{ConnectionHandle, ConnectionState, LinkSetting, UpdateAck, WmediumdManager};
pub use models::{
    ErrorProbLink, InterfaceRef, MacAddress, MediumMode, ServerInfo, SnrLink, SpecProbLink,
};

pub const WMEDIUMD_BINARY: &str = "wmediumd";
pub const WMEDIUMD_RUN_DIR: &str = "/var/run";
pub const DEFAULT_SOCKET_PATH: &str =
    const_format::concatcp!(WMEDIUMD_RUN_DIR, "/", WMEDIUMD_BINARY, ".sock");
