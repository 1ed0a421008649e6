use models::{MacAddress, SpecProbMatrix};

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

/// A link value the server has acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSetting {
    Snr(i32),
    ErrorProb(f64),
    SpecProb(Box<SpecProbMatrix>),
}

/// Acknowledgement of a successful link update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateAck {
    pub from: MacAddress,
    pub to: MacAddress,
    pub setting: LinkSetting,
    /// Time from sending the request to reading the full response.
    pub elapsed: Duration,
}

/// Last acknowledged setting per directed link.
///
/// wmediumd has no query message, so this is the only record of what the
/// medium currently looks like from the connector's side.
#[derive(Debug, Default)]
pub(crate) struct LinkLedger {
    entries: HashMap<(MacAddress, MacAddress), LinkSetting>,
}

impl LinkLedger {
    pub(crate) fn record(&mut self, from: MacAddress, to: MacAddress, setting: LinkSetting) {
        self.entries.insert((from, to), setting);
    }

    pub(crate) fn get(&self, from: MacAddress, to: MacAddress) -> Option<&LinkSetting> {
        self.entries.get(&(from, to))
    }

    /// Drop every link touching `mac`.
    pub(crate) fn forget_interface(&mut self, mac: MacAddress) {
        self.entries
            .retain(|(from, to), _| *from != mac && *to != mac);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
