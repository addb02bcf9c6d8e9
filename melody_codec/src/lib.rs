// Melody Codec
//
// Turns monophonic note/rest events into a fixed time-step token stream for
// sequence-model training, and turns generated token streams back into
// timed events. Every duration is quantized onto a grid of `time_step`
// quarter lengths: the first step of an event carries its symbol (MIDI pitch
// or "r"), each following step carries the hold marker "_".
//
// Architecture:
// - event.rs: Note/rest events with quarter-length durations, pitch names
// - token.rs: Token alphabet (pitch, rest, carry, delimiter) and stream text form
// - quantize.rs: Acceptable-duration grid and per-piece validation
// - encode.rs: Events -> token stream
// - decode.rs: Token stream -> events (run-length inversion of encode.rs)
// - vocabulary.rs: Bidirectional token <-> id table, JSON persistence
// - corpus.rs: Multi-piece corpus assembly with delimiter runs, parallel build
// - window.rs: One-hot context windows and next-token targets for training
// - config.rs: Data-driven codec parameters
// - error.rs: Codec error kinds
//
// The vocabulary is the contract between training and generation: the exact
// table built from a corpus must be the one used to generate from a model
// trained on that corpus.

pub mod config;
pub mod corpus;
pub mod decode;
pub mod encode;
pub mod error;
pub mod event;
pub mod quantize;
pub mod token;
pub mod vocabulary;
pub mod window;

pub use error::CodecError;
