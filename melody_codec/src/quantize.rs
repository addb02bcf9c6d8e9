// Duration quantization: the acceptable-duration grid.
//
// Every token covers `time_step` quarter lengths, so a piece can only be
// encoded if each of its durations is a whole number of steps. On top of
// that, a corpus restricts itself to a small set of common durations
// (sixteenth through whole note, plus dotted eighth/quarter/half) to keep
// the vocabulary of held lengths the model must learn small.
//
// Checks are pure and advisory: they report the first offending event and
// leave the decision to skip or abort the piece to the caller.
//
// Piece durations are compared with `DURATION_EPSILON` rather than exactly,
// so 0.1 + 0.15 is accepted as 0.25. The grid itself must be exact: every
// acceptable duration is a whole number of steps with no rounding, which is
// what makes decoding reproduce the encoded durations.

use crate::error::CodecError;
use crate::event::Event;

/// Durations (quarter lengths) accepted by default.
pub const DEFAULT_ACCEPTABLE_DURATIONS: [f64; 8] = [
    0.25, // 16th
    0.5,  // 8th
    0.75, // dotted 8th
    1.0,  // quarter
    1.5,  // dotted quarter
    2.0,  // half
    3.0,  // dotted half
    4.0,  // whole
];

/// Tolerance for duration membership and whole-step checks.
pub const DURATION_EPSILON: f64 = 1e-6;

/// Number of whole time steps in `duration`.
///
/// Fails if the ratio is not within `DURATION_EPSILON` of a positive
/// integer.
pub fn steps_for(duration: f64, time_step: f64) -> Result<usize, CodecError> {
    let ratio = duration / time_step;
    let steps = ratio.round();
    if !ratio.is_finite() || steps < 1.0 || (ratio - steps).abs() > DURATION_EPSILON {
        return Err(CodecError::FractionalSteps {
            duration,
            time_step,
        });
    }
    Ok(steps as usize)
}

/// The quantization grid: a time step plus the durations allowed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptableDurations {
    time_step: f64,
    durations: Vec<f64>,
}

impl AcceptableDurations {
    pub fn new(time_step: f64, durations: Vec<f64>) -> Self {
        AcceptableDurations {
            time_step,
            durations,
        }
    }

    /// Check that every allowed duration is exactly `steps * time_step`.
    ///
    /// The decoder rebuilds durations as `time_step * run`, so a grid such
    /// as 0.1 with 0.3 (three steps give 0.30000000000000004) could not
    /// decode to the duration it encoded.
    pub fn validate_grid(&self) -> Result<(), CodecError> {
        for &d in &self.durations {
            let exact = steps_for(d, self.time_step)
                .is_ok_and(|steps| self.time_step * steps as f64 == d);
            if !exact {
                return Err(CodecError::InvalidConfig(format!(
                    "acceptable duration {d} is not an exact multiple of time step {}",
                    self.time_step
                )));
            }
        }
        Ok(())
    }

    pub fn is_acceptable(&self, event: &Event) -> bool {
        self.durations
            .iter()
            .any(|&d| (d - event.duration).abs() <= DURATION_EPSILON)
    }

    /// Pass only if every event in the piece is acceptable. Reports the
    /// first offending event.
    pub fn check_piece(&self, events: &[Event]) -> Result<(), CodecError> {
        match events.iter().position(|e| !self.is_acceptable(e)) {
            Some(index) => Err(CodecError::UnacceptableDuration {
                index,
                duration: events[index].duration,
            }),
            None => Ok(()),
        }
    }

    /// Pass only if every piece passes.
    pub fn check_corpus(&self, pieces: &[Vec<Event>]) -> bool {
        pieces.iter().all(|p| self.check_piece(p).is_ok())
    }
}

impl Default for AcceptableDurations {
    fn default() -> Self {
        AcceptableDurations::new(0.25, DEFAULT_ACCEPTABLE_DURATIONS.to_vec())
    }
}
