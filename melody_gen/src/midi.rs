// MIDI output for decoded melodies.
//
// Writes a Standard MIDI File (format 0, one track) from a sequence of
// events: a tempo meta event, a program change, then note on/off pairs.
// Rests produce no events of their own; their length is carried as delta
// time onto the next note-on (or the end-of-track marker).
//
// Durations are in quarter lengths and map to ticks at
// `TICKS_PER_QUARTER`, rounded to the nearest tick.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::GenerateError;
use melody_codec::event::{Event, Symbol};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

/// General MIDI acoustic grand piano.
const PROGRAM: u8 = 0;

const VELOCITY: u8 = 80;

/// Microseconds per quarter note fit in 24 bits; slower tempos are clamped.
const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;

/// Largest delta time a MIDI variable-length quantity can hold.
const MAX_DELTA: u32 = 0x0FFF_FFFF;

/// Convert events to MIDI and write to a file.
pub fn write_midi(events: &[Event], tempo_bpm: u16, path: &Path) -> Result<(), GenerateError> {
    std::fs::write(path, midi_bytes(events, tempo_bpm)?)?;
    Ok(())
}

/// Encode events as SMF bytes.
pub fn midi_bytes(events: &[Event], tempo_bpm: u16) -> Result<Vec<u8>, GenerateError> {
    let smf = events_to_smf(events, tempo_bpm)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Convert events to an in-memory single-track SMF.
pub fn events_to_smf(events: &[Event], tempo_bpm: u16) -> Result<Smf<'static>, GenerateError> {
    if tempo_bpm == 0 {
        return Err(GenerateError::Midi("tempo must be positive".to_string()));
    }

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));
    let channel = u4::new(0);
    let mut track: Track<'static> = Vec::new();

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(
            (60_000_000 / tempo_bpm as u32).min(MAX_TEMPO_MICROS),
        ))),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(PROGRAM),
            },
        },
    });

    // Rest time waiting to be attached to the next event.
    let mut pending: u32 = 0;
    for (i, event) in events.iter().enumerate() {
        let ticks = duration_ticks(event.duration).ok_or_else(|| {
            GenerateError::Midi(format!(
                "event {i} has unusable duration {}",
                event.duration
            ))
        })?;
        match event.symbol {
            Symbol::Rest => {
                pending = pending.saturating_add(ticks);
            }
            Symbol::Note { pitch } => {
                if pitch > 127 {
                    return Err(GenerateError::Midi(format!(
                        "event {i} has pitch {pitch} above 127"
                    )));
                }
                track.push(TrackEvent {
                    delta: delta(pending)?,
                    kind: TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOn {
                            key: u7::new(pitch),
                            vel: u7::new(VELOCITY),
                        },
                    },
                });
                track.push(TrackEvent {
                    delta: delta(ticks)?,
                    kind: TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOff {
                            key: u7::new(pitch),
                            vel: u7::new(0),
                        },
                    },
                });
                pending = 0;
            }
        }
    }

    track.push(TrackEvent {
        delta: delta(pending)?,
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    Ok(smf)
}

fn duration_ticks(duration: f64) -> Option<u32> {
    let ticks = (duration * TICKS_PER_QUARTER as f64).round();
    if (1.0..=MAX_DELTA as f64).contains(&ticks) {
        Some(ticks as u32)
    } else {
        None
    }
}

fn delta(ticks: u32) -> Result<u28, GenerateError> {
    if ticks > MAX_DELTA {
        return Err(GenerateError::Midi(format!("delta of {ticks} ticks is too long")));
    }
    Ok(u28::new(ticks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_events(smf: &Smf) -> Vec<(u32, bool, u8)> {
        smf.tracks[0]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => Some((e.delta.as_int(), true, key.as_int())),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { key, .. },
                    ..
                } => Some((e.delta.as_int(), false, key.as_int())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_rest_delays_next_note() {
        let events = [Event::rest(0.25), Event::note(60, 0.5), Event::note(62, 1.0)];
        let smf = events_to_smf(&events, 120).unwrap();
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(
            note_events(&smf),
            vec![(120, true, 60), (240, false, 60), (0, true, 62), (480, false, 62)]
        );
    }

    #[test]
    fn test_trailing_rest_extends_track() {
        let smf = events_to_smf(&[Event::note(64, 1.0), Event::rest(2.0)], 90).unwrap();
        let last = smf.tracks[0].last().unwrap();
        assert!(matches!(last.kind, TrackEventKind::Meta(MetaMessage::EndOfTrack)));
        assert_eq!(last.delta.as_int(), 960);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(events_to_smf(&[Event::note(60, 1.0)], 0).is_err());
        assert!(events_to_smf(&[Event::note(200, 1.0)], 120).is_err());
        assert!(events_to_smf(&[Event::note(60, 0.0)], 120).is_err());
    }

    #[test]
    fn test_bytes_parse_back() {
        let events = [Event::note(60, 1.0), Event::rest(0.5), Event::note(67, 0.5)];
        let bytes = midi_bytes(&events, 100).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
        let parsed = Smf::parse(&bytes).unwrap();
        assert_eq!(parsed.tracks.len(), 1);
        assert_eq!(note_events(&parsed).len(), 4);
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("melody.mid");
        write_midi(&[Event::note(72, 0.25)], 120, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 14);
    }
}
