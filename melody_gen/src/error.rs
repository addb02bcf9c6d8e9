// Error kinds for sampling, generation and output.

use melody_codec::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Temperature must be finite and strictly positive.
    #[error("temperature must be positive, got {0}")]
    InvalidTemperature(f64),

    /// Negative or NaN probabilities, or nothing with positive mass.
    #[error("invalid probability distribution: {0}")]
    InvalidDistribution(String),

    /// The predictor returned a distribution of the wrong width.
    #[error("predictor returned {got} probabilities for a vocabulary of {expected}")]
    DistributionSize { expected: usize, got: usize },

    /// Neither start symbols nor seed gave the predictor any context.
    #[error("generation needs at least one start symbol or seed token")]
    EmptyContext,

    #[error("invalid generation config: {0}")]
    InvalidConfig(String),

    #[error("predictor failed: {0}")]
    Predictor(String),

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
