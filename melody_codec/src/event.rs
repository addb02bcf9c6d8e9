// Note and rest events: the score-side representation of a melody.
//
// An event is a symbol (a MIDI pitch or a rest) held for a duration measured
// in quarter lengths (1.0 = one quarter note). Pieces are ordered slices of
// events with no overlap, so a melody is monophonic by construction.
//
// Parsing notation files into events and rendering events to audio are
// outside this crate; `melody_gen::midi` writes decoded events to MIDI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What sounds during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Symbol {
    /// A pitched note, as a MIDI number (60 = middle C).
    Note { pitch: u8 },
    Rest,
}

/// A single note or rest with its duration in quarter lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub symbol: Symbol,
    /// Duration in quarter lengths. Always positive for events produced by
    /// the decoder.
    pub duration: f64,
}

impl Event {
    pub fn note(pitch: u8, duration: f64) -> Self {
        Event {
            symbol: Symbol::Note { pitch },
            duration,
        }
    }

    pub fn rest(duration: f64) -> Self {
        Event {
            symbol: Symbol::Rest,
            duration,
        }
    }

    /// MIDI pitch, or None for a rest.
    pub fn pitch(&self) -> Option<u8> {
        match self.symbol {
            Symbol::Note { pitch } => Some(pitch),
            Symbol::Rest => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol {
            Symbol::Note { pitch } => write!(f, "{}:{}", pitch_name(pitch), self.duration),
            Symbol::Rest => write!(f, "r:{}", self.duration),
        }
    }
}

/// Convert a MIDI pitch to a compact note name (e.g., 60 -> "C4", 66 -> "F#4").
pub fn pitch_name(pitch: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
    ];
    let octave = pitch as i16 / 12 - 1;
    format!("{}{}", NAMES[(pitch % 12) as usize], octave)
}

/// Total length of a piece in quarter lengths.
pub fn total_duration(events: &[Event]) -> f64 {
    events.iter().map(|e| e.duration).sum()
}

/// One-line text rendering of a melody for logs and CLI output,
/// e.g. `r:0.25 C4:0.5 D4:1`.
pub fn melody_summary(events: &[Event]) -> String {
    events
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_names() {
        assert_eq!(pitch_name(60), "C4");
        assert_eq!(pitch_name(69), "A4");
        assert_eq!(pitch_name(66), "F#4");
        assert_eq!(pitch_name(0), "C-1");
        assert_eq!(pitch_name(127), "G9");
    }

    #[test]
    fn test_event_pitch() {
        let n = Event::note(62, 0.5);
        assert_eq!(n.pitch(), Some(62));
        assert_eq!(Event::rest(1.0).pitch(), None);
    }

    #[test]
    fn test_summary() {
        let events = [Event::rest(0.25), Event::note(60, 0.5), Event::note(62, 1.0)];
        assert_eq!(melody_summary(&events), "r:0.25 C4:0.5 D4:1");
        assert_eq!(total_duration(&events), 1.75);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&Event::note(60, 0.5)).unwrap();
        assert_eq!(json, r#"{"kind":"note","pitch":60,"duration":0.5}"#);

        let rest: Event = serde_json::from_str(r#"{"kind":"rest","duration":0.25}"#).unwrap();
        assert_eq!(rest, Event::rest(0.25));
    }
}
