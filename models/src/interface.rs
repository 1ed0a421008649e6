use crate::MacAddress;

use serde::{Deserialize, Serialize};

/// An unambiguous reference to one interface of an emulated station.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceRef {
    pub station: String,
    pub interface: String,
    pub mac: MacAddress,
}

impl InterfaceRef {
    pub fn new(station: impl Into<String>, interface: impl Into<String>, mac: MacAddress) -> Self {
        Self {
            station: station.into(),
            interface: interface.into(),
            mac,
        }
    }

    /// Identifier used to reference the interface from link definitions,
    /// `"<station>.<interface>"`.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.station, self.interface)
    }
}
