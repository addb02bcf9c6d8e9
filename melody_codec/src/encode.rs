// Time-step encoding: events -> token stream.
//
// Each event becomes `round(duration / time_step)` tokens: its symbol on the
// first step, then "_" for every further step it is held. For example, with
// a sixteenth-note step:
//
//     [Rest(0.25), Note(60, 1.0), Note(72, 0.5)]  ->  r 60 _ _ _ 72 _
//
// The token count of a piece is the sum of its events' step counts, which
// is what decode.rs relies on to rebuild durations.

use crate::error::CodecError;
use crate::event::{Event, Symbol};
use crate::quantize::steps_for;
use crate::token::{MAX_PITCH, Token, join_stream};

/// The token that opens an event with this symbol.
pub fn onset_token(symbol: Symbol) -> Token {
    match symbol {
        Symbol::Note { pitch } => Token::Pitch(pitch),
        Symbol::Rest => Token::Rest,
    }
}

/// Encode a piece into one token per time step.
///
/// Fails with `FractionalSteps` if any duration is not a positive whole
/// number of steps; the duration quantizer should have rejected such a
/// piece earlier. Fails with `InvalidPitch` for pitches above 127, which
/// have no token.
pub fn encode_events(events: &[Event], time_step: f64) -> Result<Vec<Token>, CodecError> {
    let mut tokens = Vec::new();
    for (index, event) in events.iter().enumerate() {
        if let Some(pitch) = event.pitch().filter(|&p| p > MAX_PITCH) {
            return Err(CodecError::InvalidPitch { index, pitch });
        }
        let steps = steps_for(event.duration, time_step)?;
        tokens.push(onset_token(event.symbol));
        tokens.extend(std::iter::repeat_n(Token::Carry, steps - 1));
    }
    Ok(tokens)
}

/// Encode a piece straight to its space-separated text form.
pub fn encode_to_string(events: &[Event], time_step: f64) -> Result<String, CodecError> {
    Ok(join_stream(&encode_events(events, time_step)?))
}
