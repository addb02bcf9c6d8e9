// Melody Generator
//
// Autoregressive generation over the time-step token encoding from
// `melody_codec`. A next-token predictor (any model that maps a one-hot
// context window to a distribution over the vocabulary) is queried one step
// at a time; each distribution is reshaped by a temperature and sampled,
// and the sampled token extends both the model's context and the output
// melody until the step budget runs out or the model emits the piece
// delimiter "/".
//
// Architecture:
// - sampling.rs: Temperature reweighting and weighted index draws
// - predictor.rs: The `NextTokenPredictor` capability trait and simple stubs
// - markov.rs: Count-based n-gram predictor with backoff, trained from a corpus
// - generator.rs: The generation loop (context window, stop conditions)
// - config.rs: Generation and whole-pipeline configuration
// - midi.rs: MIDI file output for decoded melodies
// - logging.rs: tracing subscriber setup for the CLI
// - error.rs: Generation error kinds
//
// Generation is deterministic given the RNG seed and the predictor.

pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod markov;
pub mod midi;
pub mod predictor;
pub mod sampling;

pub use error::GenerateError;
