// Shared fixtures for the end-to-end pipeline tests.
//
// Provides a small hand-written corpus of monophonic pieces in the shape of
// the folk-song data the pipeline targets (stepwise lines, dotted rhythms,
// occasional rests, all on the sixteenth-note grid), plus one piece with an
// off-grid duration that the corpus build must skip.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use melody_codec::event::Event;

/// Four short pieces, all on the default acceptable-duration grid.
pub fn folk_pieces() -> Vec<Vec<Event>> {
    vec![
        vec![
            Event::note(67, 0.5),
            Event::note(67, 0.5),
            Event::note(69, 1.0),
            Event::note(67, 1.0),
            Event::note(72, 1.0),
            Event::note(71, 2.0),
            Event::rest(1.0),
        ],
        vec![
            Event::note(64, 0.75),
            Event::note(65, 0.25),
            Event::note(67, 1.5),
            Event::note(65, 0.5),
            Event::note(64, 1.0),
            Event::note(62, 1.0),
            Event::note(60, 4.0),
        ],
        vec![
            Event::rest(0.5),
            Event::note(60, 0.5),
            Event::note(62, 0.5),
            Event::note(64, 0.5),
            Event::note(65, 1.0),
            Event::note(67, 3.0),
        ],
        vec![
            Event::note(72, 1.0),
            Event::note(71, 0.5),
            Event::note(69, 0.5),
            Event::note(67, 2.0),
            Event::rest(0.25),
            Event::note(65, 0.25),
            Event::note(64, 0.5),
            Event::note(62, 1.0),
            Event::note(60, 2.0),
        ],
    ]
}

/// A piece with a quintuplet-like duration no grid can represent.
pub fn off_grid_piece() -> Vec<Event> {
    vec![Event::note(60, 1.0), Event::note(62, 0.2), Event::note(64, 1.0)]
}
