// Error kinds for the codec.
//
// Quantization errors (`UnacceptableDuration`, `FractionalSteps`) describe
// bad input data and are reported per piece, so a corpus build can skip the
// piece and continue. Vocabulary errors (`UnknownToken`,
// `CorruptVocabulary`) mean the vocabulary and the data it is applied to
// disagree; callers should treat them as fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// An event's duration is not on the acceptable-duration grid.
    #[error("event {index} has unacceptable duration {duration} quarter lengths")]
    UnacceptableDuration { index: usize, duration: f64 },

    /// `duration / time_step` is not a positive whole number of steps.
    #[error("duration {duration} is not a positive multiple of time step {time_step}")]
    FractionalSteps { duration: f64, time_step: f64 },

    /// A note pitch outside the MIDI range 0..=127.
    #[error("event {index} has pitch {pitch}, above the MIDI range")]
    InvalidPitch { index: usize, pitch: u8 },

    /// A vocabulary id is not below the one-hot width.
    #[error("id {id} out of range for one-hot width {width}")]
    IdOutOfRange { id: usize, width: usize },

    /// A token has no entry in the vocabulary.
    #[error("token '{0}' is not in the vocabulary")]
    UnknownToken(String),

    #[error("cannot decode an empty token sequence")]
    EmptySequence,

    /// Text that is not a pitch, "r", "_" or "/".
    #[error("malformed token '{0}'")]
    MalformedToken(String),

    /// A piece delimiter appeared inside a melody being decoded.
    #[error("piece delimiter at position {position} inside a melody")]
    UnexpectedDelimiter { position: usize },

    /// A loaded vocabulary is not a bijection onto `0..n`.
    #[error("corrupt vocabulary: {0}")]
    CorruptVocabulary(String),

    #[error("invalid codec config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
