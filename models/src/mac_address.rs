use crate::error::model_error::ModelError;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MAC_ADDRESS_LEN: usize = 6;

const MAC_ADDRESS_PATTERN: &str = r"^(?i)[0-9a-f]{2}(?::[0-9a-f]{2}){5}$";

static MAC_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_mac_regex() -> &'static Regex {
    MAC_REGEX.get_or_init(|| Regex::new(MAC_ADDRESS_PATTERN).expect("valid regex pattern"))
}

/// IEEE 802 MAC address of a simulated radio interface.
///
/// Parsed from the colon separated notation (`02:00:00:00:01:00`, any case)
/// and always rendered lower-case. On the wire it travels as 6 raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; MAC_ADDRESS_LEN]);

impl MacAddress {
    pub const fn new(octets: [u8; MAC_ADDRESS_LEN]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; MAC_ADDRESS_LEN] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = ModelError;

    #[track_caller]
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if !get_mac_regex().is_match(value) {
            return Err(ModelError::validation(format!(
                "Invalid MAC address: '{value}' (expected xx:xx:xx:xx:xx:xx)"
            )));
        }

        let mut octets = [0u8; MAC_ADDRESS_LEN];
        for (octet, part) in octets.iter_mut().zip(value.split(':')) {
            *octet = u8::from_str_radix(part, 16).map_err(|e| {
                ModelError::validation(format!("Invalid MAC octet '{part}' in '{value}': {e}"))
            })?;
        }

        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl From<[u8; MAC_ADDRESS_LEN]> for MacAddress {
    fn from(octets: [u8; MAC_ADDRESS_LEN]) -> Self {
        Self(octets)
    }
}

impl Display for MacAddress {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let [a, b, c, d, e, f] = self.0;
        write!(
            formatter,
            "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{f:02x}"
        )
    }
}
