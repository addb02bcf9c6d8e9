// Generation and pipeline configuration.
//
// `GenerationConfig` controls one generation call. `PipelineConfig` bundles
// it with the codec parameters and MIDI tempo so the CLI can read a single
// JSON file; every field falls back to its default when omitted.
//
// The default start symbols are one full delimiter run: the model sees the
// same context it saw at the start of every training piece. Inside a
// pipeline file, an omitted `max_sequence_length` or `start_symbols` follows
// `codec.sequence_length`, so changing the training window once keeps
// generation in step with it.

use crate::error::GenerateError;
use melody_codec::config::{CodecConfig, DEFAULT_SEQUENCE_LENGTH};
use melody_codec::token::Token;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum number of tokens to sample.
    pub num_steps: usize,
    /// Context window cap; older ids are dropped from the front.
    pub max_sequence_length: usize,
    /// Sampling temperature, > 0. Lower is more conservative.
    pub temperature: f64,
    /// Tokens prepended to the seed to warm up the context. They never
    /// appear in the output.
    pub start_symbols: Vec<Token>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            num_steps: 500,
            max_sequence_length: DEFAULT_SEQUENCE_LENGTH,
            temperature: 0.7,
            start_symbols: vec![Token::Delimiter; DEFAULT_SEQUENCE_LENGTH],
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), GenerateError> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(GenerateError::InvalidTemperature(self.temperature));
        }
        if self.max_sequence_length == 0 {
            return Err(GenerateError::InvalidConfig(
                "max_sequence_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub codec: CodecConfig,
    pub generation: GenerationConfig,
    /// Tempo of written MIDI files, quarter notes per minute.
    pub tempo_bpm: u16,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            codec: CodecConfig::default(),
            generation: GenerationConfig::default(),
            tempo_bpm: 120,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse and validate, deriving omitted generation window fields from
    /// `codec.sequence_length`.
    pub fn from_json(json: &str) -> Result<Self, GenerateError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let generation = value.get("generation");
        let given = |field: &str| generation.is_some_and(|g| g.get(field).is_some());
        let given_length = given("max_sequence_length");
        let given_start = given("start_symbols");

        let mut config: PipelineConfig = serde_json::from_value(value)?;
        let sequence_length = config.codec.sequence_length;
        if !given_length {
            config.generation.max_sequence_length = sequence_length;
        }
        if !given_start {
            config.generation.start_symbols = vec![Token::Delimiter; sequence_length];
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        self.codec.validate()?;
        self.generation.validate()?;
        if self.tempo_bpm == 0 {
            return Err(GenerateError::InvalidConfig(
                "tempo_bpm must be positive".to_string(),
            ));
        }

        let sequence_length = self.codec.sequence_length;
        if self.generation.max_sequence_length != sequence_length {
            warn!(
                max_sequence_length = self.generation.max_sequence_length,
                sequence_length, "generation context differs from the training window"
            );
        }
        if self.generation.start_symbols.len() != sequence_length {
            warn!(
                start_symbols = self.generation.start_symbols.len(),
                sequence_length, "warm-up length differs from the training window"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generation.start_symbols.len(), 64);
        assert!(config.generation.start_symbols.iter().all(|&t| t == Token::Delimiter));
    }

    #[test]
    fn test_json_overrides() {
        let config = PipelineConfig::from_json(
            r#"{
                "codec": {"sequence_length": 32},
                "generation": {"temperature": 0.3, "start_symbols": ["/", "/"]},
                "tempo_bpm": 90
            }"#,
        )
        .unwrap();
        assert_eq!(config.codec.sequence_length, 32);
        assert_eq!(config.codec.time_step, 0.25);
        assert_eq!(config.generation.temperature, 0.3);
        // Explicit start symbols are kept; the omitted window follows the codec.
        assert_eq!(config.generation.start_symbols, vec![Token::Delimiter; 2]);
        assert_eq!(config.generation.max_sequence_length, 32);
        assert_eq!(config.generation.num_steps, 500);
        assert_eq!(config.tempo_bpm, 90);
    }

    #[test]
    fn test_generation_window_follows_codec() {
        let config = PipelineConfig::from_json(r#"{"codec": {"sequence_length": 16}}"#).unwrap();
        assert_eq!(config.generation.max_sequence_length, 16);
        assert_eq!(config.generation.start_symbols, vec![Token::Delimiter; 16]);

        let explicit = PipelineConfig::from_json(
            r#"{"codec": {"sequence_length": 16}, "generation": {"max_sequence_length": 8}}"#,
        )
        .unwrap();
        assert_eq!(explicit.generation.max_sequence_length, 8);
        assert_eq!(explicit.generation.start_symbols.len(), 16);

        let empty = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(empty, PipelineConfig::default());
    }

    #[test]
    fn test_invalid_values() {
        let mut generation = GenerationConfig {
            temperature: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            generation.validate(),
            Err(GenerateError::InvalidTemperature(_))
        ));
        generation.temperature = 1.0;
        generation.max_sequence_length = 0;
        assert!(generation.validate().is_err());

        let pipeline = PipelineConfig {
            tempo_bpm: 0,
            ..Default::default()
        };
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn test_load_rejects_bad_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"generation": {"start_symbols": ["q"]}}"#).unwrap();
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(GenerateError::Json(_))
        ));
    }
}
