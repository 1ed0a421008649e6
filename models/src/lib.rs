//! Domain models for the wmediumd connector.
//!
//! This crate contains pure data structures: station interfaces, the links
//! between them and the server reference the connector supervises. Models
//! carry validation but no I/O; the connector crate moves them over the wire.
//!
//! ## Architecture
//!
//! - **common**: `ErrorLocation` shared by every error type
//! - **models** (this crate): Pure data structures
//! - **wmediumd-connector**: Server lifecycle, control channel and protocol

pub mod error;
pub mod interface;
pub mod link;
pub mod mac_address;
pub mod medium_mode;
pub mod server_info;

pub use common::ErrorLocation;
pub use error::model_error::ModelError;
pub use interface::InterfaceRef;
pub use link::{
    ErrorProbLink, LINK_RATE_COUNT, LINK_SIZE_COUNT, SnrLink, SpecProbLink, SpecProbMatrix,
};
pub use mac_address::MacAddress;
pub use medium_mode::MediumMode;
pub use server_info::ServerInfo;
pub use server_info::builder::ServerInfoBuilder;

#[cfg(test)]
mod tests;
