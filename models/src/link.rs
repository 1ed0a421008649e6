use crate::MacAddress;
use crate::error::model_error::ModelError;

use serde::{Deserialize, Serialize};

/// Number of frame size classes in a spec-prob matrix.
pub const LINK_SIZE_COUNT: usize = 12;

/// Number of data rate classes in a spec-prob matrix.
pub const LINK_RATE_COUNT: usize = 12;

/// Error probabilities indexed `[size_idx][rate_idx]`.
pub type SpecProbMatrix = [[f64; LINK_RATE_COUNT]; LINK_SIZE_COUNT];

#[track_caller]
fn validate_probability(value: f64, what: &str) -> Result<(), ModelError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ModelError::validation(format!(
            "Invalid {what}: {value} (must be within 0.0-1.0)"
        )));
    }
    Ok(())
}

#[track_caller]
fn validate_endpoints(from: &MacAddress, to: &MacAddress) -> Result<(), ModelError> {
    if from == to {
        return Err(ModelError::validation(format!(
            "Link endpoints must differ (both are {from})"
        )));
    }
    Ok(())
}

/// Directed link quality expressed as signal to noise ratio (dB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnrLink {
    pub from: MacAddress,
    pub to: MacAddress,
    pub snr: i32,
}

impl SnrLink {
    pub fn new(from: MacAddress, to: MacAddress, snr: i32) -> Self {
        Self { from, to, snr }
    }

    #[track_caller]
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_endpoints(&self.from, &self.to)
    }
}

/// Directed link quality expressed as a frame error probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorProbLink {
    pub from: MacAddress,
    pub to: MacAddress,
    pub errprob: f64,
}

impl ErrorProbLink {
    pub fn new(from: MacAddress, to: MacAddress, errprob: f64) -> Self {
        Self { from, to, errprob }
    }

    #[track_caller]
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_endpoints(&self.from, &self.to)?;
        validate_probability(self.errprob, "error probability")
    }
}

/// Directed link quality expressed as one error probability per frame size
/// and data rate class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecProbLink {
    pub from: MacAddress,
    pub to: MacAddress,
    pub errprobs: SpecProbMatrix,
}

impl SpecProbLink {
    pub fn new(from: MacAddress, to: MacAddress, errprobs: SpecProbMatrix) -> Self {
        Self { from, to, errprobs }
    }

    /// Same probability for every size and rate class.
    pub fn uniform(from: MacAddress, to: MacAddress, errprob: f64) -> Self {
        Self::new(from, to, [[errprob; LINK_RATE_COUNT]; LINK_SIZE_COUNT])
    }

    #[track_caller]
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_endpoints(&self.from, &self.to)?;
        for (size_idx, row) in self.errprobs.iter().enumerate() {
            for (rate_idx, value) in row.iter().enumerate() {
                validate_probability(
                    *value,
                    &format!("error probability at [{size_idx}][{rate_idx}]"),
                )?;
            }
        }
        Ok(())
    }

    /// Row-major iteration, `size_idx * LINK_RATE_COUNT + rate_idx`.
    pub fn flattened(&self) -> impl Iterator<Item = f64> + '_ {
        self.errprobs.iter().flat_map(|row| row.iter().copied())
    }
}
