// Data-driven codec parameters.
//
// `CodecConfig` holds everything that must agree between corpus building,
// training and generation: the quantization grain, the training window
// length (which is also the delimiter run length), and the set of durations
// a piece may contain. Loaded from JSON; every field falls back to its
// default when omitted.

use crate::error::CodecError;
use crate::quantize::{AcceptableDurations, DEFAULT_ACCEPTABLE_DURATIONS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sixteenth-note grid.
pub const DEFAULT_TIME_STEP: f64 = 0.25;

/// 64 sixteenth steps, four bars of 4/4.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Duration of one token, in quarter lengths.
    pub time_step: f64,
    /// Training window length, and the number of "/" tokens between pieces.
    pub sequence_length: usize,
    /// Durations (quarter lengths) a piece may contain.
    pub acceptable_durations: Vec<f64>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            time_step: DEFAULT_TIME_STEP,
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            acceptable_durations: DEFAULT_ACCEPTABLE_DURATIONS.to_vec(),
        }
    }
}

impl CodecConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &Path) -> Result<Self, CodecError> {
        let data = std::fs::read_to_string(path)?;
        let config: CodecConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// The quantization grid described by this config.
    pub fn durations(&self) -> AcceptableDurations {
        AcceptableDurations::new(self.time_step, self.acceptable_durations.clone())
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(CodecError::InvalidConfig(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.sequence_length == 0 {
            return Err(CodecError::InvalidConfig(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        if self.acceptable_durations.is_empty() {
            return Err(CodecError::InvalidConfig(
                "acceptable_durations is empty".to_string(),
            ));
        }
        self.durations().validate_grid()
    }
}
