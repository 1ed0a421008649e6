//! Server discovery and spawning utilities.
//!
//! This module provides functionality for:
//! - Finding a running wmediumd process and checking its control socket
//! - Making sure the `mac80211_hwsim` radios module is loaded
//! - Spawning a new server when none is running and waiting for its socket
//! - Stopping servers the connector owns

pub mod process;
pub mod spawn;
