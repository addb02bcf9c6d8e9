// Time-step decoding: token stream -> events.
//
// Inverts encode.rs by run-length counting. An onset token (pitch or "r")
// closes whatever symbol is pending and starts a new run of length 1; each
// "_" extends the pending run. The last pending run is always closed at the
// end of the stream, so for any on-grid piece `decode(encode(x)) == x`.
//
// Generated streams can begin with "_" (a seed cut mid-note, or an
// unlucky first draw). Carries with nothing to extend are decoded as a rest
// so the decoded piece still spans exactly one time step per token.

use crate::error::CodecError;
use crate::event::{Event, Symbol};
use crate::token::Token;
use tracing::debug;

/// Decode a token sequence into events, each step lasting `step_duration`
/// quarter lengths.
pub fn decode_tokens(tokens: &[Token], step_duration: f64) -> Result<Vec<Event>, CodecError> {
    if tokens.is_empty() {
        return Err(CodecError::EmptySequence);
    }
    if !(step_duration.is_finite() && step_duration > 0.0) {
        return Err(CodecError::InvalidConfig(format!(
            "step duration must be positive, got {step_duration}"
        )));
    }

    let mut events = Vec::new();
    let mut pending: Option<Symbol> = None;
    let mut run: usize = 0;

    let close = |events: &mut Vec<Event>, symbol: Option<Symbol>, run: usize| {
        if let Some(symbol) = symbol {
            events.push(Event {
                symbol,
                duration: step_duration * run as f64,
            });
        }
    };

    for (position, &token) in tokens.iter().enumerate() {
        match token {
            Token::Carry => {
                if pending.is_none() {
                    debug!(position, "leading carry decoded as rest");
                    pending = Some(Symbol::Rest);
                }
                run += 1;
            }
            Token::Pitch(pitch) => {
                close(&mut events, pending, run);
                pending = Some(Symbol::Note { pitch });
                run = 1;
            }
            Token::Rest => {
                close(&mut events, pending, run);
                pending = Some(Symbol::Rest);
                run = 1;
            }
            Token::Delimiter => return Err(CodecError::UnexpectedDelimiter { position }),
        }
    }
    close(&mut events, pending, run);

    Ok(events)
}
