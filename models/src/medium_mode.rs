use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};

/// How wmediumd models the medium between two interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediumMode {
    /// Links are described by their signal to noise ratio.
    #[default]
    Snr,
    /// Links are described by a single frame error probability.
    ErrorProb,
    /// Links are described by an error probability per frame size and rate,
    /// pushed at runtime; the server starts without a medium file.
    SpecProb,
}

impl MediumMode {
    /// Numeric mode identifier used by wmediumd.
    pub const fn code(self) -> u8 {
        match self {
            MediumMode::Snr => 0,
            MediumMode::ErrorProb => 1,
            MediumMode::SpecProb => 2,
        }
    }
}

impl Display for MediumMode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            MediumMode::Snr => "snr",
            MediumMode::ErrorProb => "error_prob",
            MediumMode::SpecProb => "spec_prob",
        };
        formatter.write_str(name)
    }
}
