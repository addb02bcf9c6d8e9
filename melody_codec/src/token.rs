// Token alphabet for the time-step encoding.
//
// One token per time step:
// - a MIDI pitch, written as its decimal number ("60")
// - "r" for the first step of a rest
// - "_" for every step that holds the previous note or rest
// - "/" for the piece delimiter used between pieces of a corpus
//
// The text form of a stream is the tokens joined by single spaces. Tokens
// serialize as their text form so vocabulary files stay human-readable.

use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const REST_MARKER: &str = "r";
pub const CARRY_MARKER: &str = "_";
pub const DELIMITER_MARKER: &str = "/";

/// Highest valid MIDI pitch.
pub const MAX_PITCH: u8 = 127;

/// One time step of an encoded melody.
///
/// The derived ordering (pitches ascending, then rest, carry, delimiter) is
/// the order in which `Vocabulary::build` assigns ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Token {
    Pitch(u8),
    Rest,
    Carry,
    Delimiter,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Pitch(p) => write!(f, "{p}"),
            Token::Rest => f.write_str(REST_MARKER),
            Token::Carry => f.write_str(CARRY_MARKER),
            Token::Delimiter => f.write_str(DELIMITER_MARKER),
        }
    }
}

impl FromStr for Token {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            REST_MARKER => Ok(Token::Rest),
            CARRY_MARKER => Ok(Token::Carry),
            DELIMITER_MARKER => Ok(Token::Delimiter),
            // Canonical decimal only: "060" would not write back as itself.
            _ if is_canonical_number(s) => match s.parse::<u8>() {
                Ok(p) if p <= MAX_PITCH => Ok(Token::Pitch(p)),
                _ => Err(CodecError::MalformedToken(s.to_string())),
            },
            _ => Err(CodecError::MalformedToken(s.to_string())),
        }
    }
}

fn is_canonical_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && (s == "0" || !s.starts_with('0'))
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.to_string()
    }
}

impl TryFrom<String> for Token {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Split a whitespace-separated stream into tokens.
pub fn parse_stream(text: &str) -> Result<Vec<Token>, CodecError> {
    text.split_whitespace().map(str::parse).collect()
}

/// Join tokens into the single-space text form.
pub fn join_stream(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
