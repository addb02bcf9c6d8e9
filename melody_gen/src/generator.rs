// Autoregressive melody generation.
//
// The generator keeps two sequences:
// - the context: vocabulary ids of `start_symbols + seed + sampled tokens`,
//   which is what the predictor sees (its last `max_sequence_length` ids)
// - the melody: the seed tokens plus every sampled token, which is what the
//   caller gets back
//
// Each step one-hot encodes the context window, asks the predictor for a
// distribution, samples an id at the configured temperature and appends it
// to the context. If the id maps to the delimiter "/" the piece is over and
// the loop stops without adding it to the melody; otherwise the token is
// appended. At most `num_steps` ids are sampled.
//
// Steps depend on the previous sample, so one generation is strictly
// sequential. Independent generations can run in parallel with separate
// predictors and RNGs.

use crate::config::GenerationConfig;
use crate::error::GenerateError;
use crate::predictor::NextTokenPredictor;
use crate::sampling::sample_with_temperature;
use melody_codec::CodecError;
use melody_codec::token::Token;
use melody_codec::vocabulary::Vocabulary;
use melody_codec::window::OneHot;
use rand::Rng;
use tracing::debug;

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `num_steps` samples were drawn.
    Budget,
    /// The predictor's sample was the piece delimiter.
    Delimiter,
}

/// The result of one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// Seed followed by the generated tokens. Never contains "/".
    pub melody: Vec<Token>,
    /// Number of samples drawn, including a final delimiter.
    pub steps: usize,
    pub stop: StopReason,
    seed_len: usize,
}

impl Generation {
    /// Only the tokens produced by the model.
    pub fn generated(&self) -> &[Token] {
        &self.melody[self.seed_len..]
    }
}

pub struct MelodyGenerator<'a, P> {
    predictor: P,
    vocabulary: &'a Vocabulary,
    config: GenerationConfig,
}

impl<'a, P: NextTokenPredictor> MelodyGenerator<'a, P> {
    /// Fails on an invalid config or start symbols missing from the
    /// vocabulary.
    pub fn new(
        predictor: P,
        vocabulary: &'a Vocabulary,
        config: GenerationConfig,
    ) -> Result<Self, GenerateError> {
        config.validate()?;
        vocabulary.encode(&config.start_symbols)?;
        Ok(MelodyGenerator {
            predictor,
            vocabulary,
            config,
        })
    }

    /// Generate one melody continuing `seed`.
    ///
    /// Seed tokens missing from the vocabulary are an `UnknownToken` error.
    /// A delimiter inside the seed is passed to the model but kept out of
    /// the returned melody.
    pub fn generate(
        &mut self,
        seed: &[Token],
        rng: &mut impl Rng,
    ) -> Result<Generation, GenerateError> {
        let vocab_size = self.vocabulary.len();
        let mut context = self.vocabulary.encode(&self.config.start_symbols)?;
        context.extend(self.vocabulary.encode(seed)?);
        if context.is_empty() {
            return Err(GenerateError::EmptyContext);
        }

        let mut melody: Vec<Token> = seed
            .iter()
            .copied()
            .filter(|&t| t != Token::Delimiter)
            .collect();
        let seed_len = melody.len();
        let mut steps = 0;
        let mut stop = StopReason::Budget;

        while steps < self.config.num_steps {
            if context.len() > self.config.max_sequence_length {
                let excess = context.len() - self.config.max_sequence_length;
                context.drain(..excess);
            }

            let window = OneHot::from_ids(&context, vocab_size)?;
            let probabilities = self.predictor.predict(&window)?;
            if probabilities.len() != vocab_size {
                return Err(GenerateError::DistributionSize {
                    expected: vocab_size,
                    got: probabilities.len(),
                });
            }

            let id = sample_with_temperature(&probabilities, self.config.temperature, rng)?;
            steps += 1;
            context.push(id);

            let token = self
                .vocabulary
                .token(id)
                .ok_or_else(|| CodecError::UnknownToken(format!("id {id}")))?;
            if token == Token::Delimiter {
                stop = StopReason::Delimiter;
                break;
            }
            melody.push(token);
        }

        debug!(steps, ?stop, length = melody.len(), "generation finished");
        Ok(Generation {
            melody,
            steps,
            stop,
            seed_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{FixedDistribution, ScriptedPredictor};
    use melody_codec::token::parse_stream;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // Ids: 60 -> 0, 62 -> 1, 64 -> 2, r -> 3, _ -> 4, / -> 5
    fn vocab() -> Vocabulary {
        Vocabulary::build(&parse_stream("60 62 64 r _ /").unwrap())
    }

    fn config(num_steps: usize, max_len: usize, start: &[Token]) -> GenerationConfig {
        GenerationConfig {
            num_steps,
            max_sequence_length: max_len,
            temperature: 1.0,
            start_symbols: start.to_vec(),
        }
    }

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_runs_to_budget() {
        let vocab = vocab();
        let predictor = ScriptedPredictor::new(vec![1, 4, 2, 4, 4], 6);
        let mut g = MelodyGenerator::new(predictor, &vocab, config(5, 8, &[Token::Delimiter]))
            .unwrap();
        let seed = parse_stream("60 _").unwrap();
        let out = g.generate(&seed, &mut rng(1)).unwrap();
        assert_eq!(out.stop, StopReason::Budget);
        assert_eq!(out.steps, 5);
        assert_eq!(out.melody, parse_stream("60 _ 62 _ 64 _ _").unwrap());
        assert_eq!(out.generated(), parse_stream("62 _ 64 _ _").unwrap().as_slice());
    }

    #[test]
    fn test_stops_at_delimiter() {
        let vocab = vocab();
        let mut predictor = ScriptedPredictor::new(vec![2, 4, 5, 0, 0], 6);
        let out = MelodyGenerator::new(&mut predictor, &vocab, config(10, 8, &[]))
            .unwrap()
            .generate(&[Token::Pitch(60)], &mut rng(1))
            .unwrap();
        assert_eq!(out.stop, StopReason::Delimiter);
        assert_eq!(out.steps, 3);
        assert_eq!(out.melody, parse_stream("60 64 _").unwrap());
        assert_eq!(predictor.calls(), 3);
    }

    #[test]
    fn test_context_window_and_start_symbols() {
        let vocab = vocab();
        let mut predictor = ScriptedPredictor::new(vec![3, 4], 6);
        let start = [Token::Delimiter, Token::Delimiter];
        let out = MelodyGenerator::new(&mut predictor, &vocab, config(3, 3, &start))
            .unwrap()
            .generate(&[Token::Pitch(62)], &mut rng(1))
            .unwrap();
        // Start symbols never reach the melody.
        assert_eq!(out.melody, parse_stream("62 r _ _").unwrap());
        let seen = &predictor.seen_contexts;
        assert_eq!(seen[0], vec![5, 5, 1]);
        assert_eq!(seen[1], vec![5, 1, 3]);
        assert_eq!(seen[2], vec![1, 3, 4]);
    }

    #[test]
    fn test_zero_budget_returns_seed() {
        let vocab = vocab();
        let predictor = FixedDistribution::uniform(6);
        let mut g = MelodyGenerator::new(predictor, &vocab, config(0, 4, &[])).unwrap();
        let seed = parse_stream("64 _ r").unwrap();
        let out = g.generate(&seed, &mut rng(3)).unwrap();
        assert_eq!(out.melody, seed);
        assert_eq!(out.steps, 0);
        assert!(out.generated().is_empty());
    }

    #[test]
    fn test_random_generation_never_emits_delimiter() {
        let vocab = vocab();
        for seed_value in 0..20 {
            let predictor = FixedDistribution::uniform(6);
            let mut g = MelodyGenerator::new(predictor, &vocab, config(50, 4, &[Token::Delimiter]))
                .unwrap();
            let out = g.generate(&[], &mut rng(seed_value)).unwrap();
            assert!(out.steps <= 50);
            assert!(!out.melody.contains(&Token::Delimiter));
            match out.stop {
                StopReason::Budget => assert_eq!(out.melody.len(), 50),
                StopReason::Delimiter => assert_eq!(out.melody.len(), out.steps - 1),
            }
        }
    }

    #[test]
    fn test_errors() {
        let vocab = vocab();
        let uniform = FixedDistribution::uniform(6);
        let mut g = MelodyGenerator::new(uniform.clone(), &vocab, config(5, 4, &[])).unwrap();
        // Unknown seed token.
        assert!(matches!(
            g.generate(&[Token::Pitch(99)], &mut rng(0)),
            Err(GenerateError::Codec(CodecError::UnknownToken(_)))
        ));
        // Nothing to condition on.
        assert!(matches!(
            g.generate(&[], &mut rng(0)),
            Err(GenerateError::EmptyContext)
        ));

        // Wrong distribution width.
        let narrow = FixedDistribution::uniform(4);
        let mut g = MelodyGenerator::new(narrow, &vocab, config(5, 4, &[])).unwrap();
        assert!(matches!(
            g.generate(&[Token::Rest], &mut rng(0)),
            Err(GenerateError::DistributionSize {
                expected: 6,
                got: 4
            })
        ));

        // Bad temperature and unknown start symbols are caught up front.
        let mut bad = config(5, 4, &[]);
        bad.temperature = 0.0;
        assert!(MelodyGenerator::new(uniform.clone(), &vocab, bad).is_err());
        let unknown_start = config(5, 4, &[Token::Pitch(70)]);
        assert!(MelodyGenerator::new(uniform, &vocab, unknown_start).is_err());
    }
}
