// Corpus assembly: many encoded pieces -> one delimited token stream.
//
// Pieces are concatenated with a run of `sequence_length` "/" tokens after
// each one. A training window is `sequence_length` tokens wide, so any
// window that would otherwise reach from one piece into the next sees only
// delimiters past the end of its own piece. The model learns "/" as the
// end-of-piece token, and the generator stops when it samples one.
//
// `build_corpus` is the whole pre-training pipeline for in-memory pieces:
// quantization check and encoding run per piece in parallel (pieces are
// independent), then the accepted pieces are assembled and the vocabulary
// is built from the complete stream. Rejected pieces are reported and
// skipped, not fatal.

use crate::config::CodecConfig;
use crate::encode::encode_events;
use crate::error::CodecError;
use crate::event::Event;
use crate::token::{DELIMITER_MARKER, Token, join_stream, parse_stream};
use crate::vocabulary::Vocabulary;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Join per-piece text streams, following each with a space and
/// `sequence_length` copies of "/ ", and drop the final trailing space.
///
/// `["60", "62"]` with `sequence_length = 2` gives `"60 / / 62 / /"`.
pub fn assemble_corpus(pieces: &[String], sequence_length: usize) -> String {
    let delimiter = format!("{DELIMITER_MARKER} ").repeat(sequence_length);
    let mut corpus = String::new();
    for piece in pieces {
        corpus.push_str(piece);
        corpus.push(' ');
        corpus.push_str(&delimiter);
    }
    if corpus.ends_with(' ') {
        corpus.pop();
    }
    corpus
}

/// Token-level twin of `assemble_corpus`.
pub fn assemble_tokens(pieces: &[Vec<Token>], sequence_length: usize) -> Vec<Token> {
    let total: usize = pieces.iter().map(|p| p.len() + sequence_length).sum();
    let mut corpus = Vec::with_capacity(total);
    for piece in pieces {
        corpus.extend_from_slice(piece);
        corpus.extend(std::iter::repeat_n(Token::Delimiter, sequence_length));
    }
    corpus
}

/// Split an assembled corpus back into its pieces, dropping delimiter runs.
pub fn split_pieces(corpus: &[Token]) -> Vec<Vec<Token>> {
    corpus
        .split(|&t| t == Token::Delimiter)
        .filter(|piece| !piece.is_empty())
        .map(<[Token]>::to_vec)
        .collect()
}

pub fn save_corpus(path: &Path, corpus: &[Token]) -> Result<(), CodecError> {
    std::fs::write(path, join_stream(corpus))?;
    Ok(())
}

pub fn load_corpus(path: &Path) -> Result<Vec<Token>, CodecError> {
    let text = std::fs::read_to_string(path)?;
    parse_stream(&text)
}

/// A piece that failed quantization or encoding.
#[derive(Debug)]
pub struct RejectedPiece {
    /// Index into the input pieces.
    pub index: usize,
    pub error: CodecError,
}

/// Output of `build_corpus`.
#[derive(Debug)]
pub struct CorpusBuild {
    /// The assembled, delimited corpus.
    pub corpus: Vec<Token>,
    /// Vocabulary built from `corpus`.
    pub vocabulary: Vocabulary,
    /// Indices of the pieces that made it into the corpus, in order.
    pub accepted: Vec<usize>,
    pub rejected: Vec<RejectedPiece>,
}

/// Check, encode and assemble pieces, then build the vocabulary.
///
/// Fails only on an invalid config; bad pieces land in `rejected`.
pub fn build_corpus(
    pieces: &[Vec<Event>],
    config: &CodecConfig,
) -> Result<CorpusBuild, CodecError> {
    config.validate()?;
    let grid = config.durations();

    let results: Vec<Result<Vec<Token>, CodecError>> = pieces
        .par_iter()
        .map(|piece| {
            grid.check_piece(piece)?;
            encode_events(piece, config.time_step)
        })
        .collect();

    let mut encoded = Vec::new();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(tokens) => {
                encoded.push(tokens);
                accepted.push(index);
            }
            Err(error) => {
                warn!(piece = index, %error, "skipping piece");
                rejected.push(RejectedPiece { index, error });
            }
        }
    }

    let corpus = assemble_tokens(&encoded, config.sequence_length);
    let vocabulary = Vocabulary::build(&corpus);
    info!(
        pieces = accepted.len(),
        skipped = rejected.len(),
        tokens = corpus.len(),
        vocabulary = vocabulary.len(),
        "corpus built"
    );

    Ok(CorpusBuild {
        corpus,
        vocabulary,
        accepted,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_two_pieces() {
        let pieces = vec!["60".to_string(), "62".to_string()];
        assert_eq!(assemble_corpus(&pieces, 2), "60 / / 62 / /");
    }

    #[test]
    fn test_assemble_matches_token_form() {
        let text = vec!["60 _ r".to_string(), "62 _ _ 64".to_string()];
        let tokens: Vec<Vec<Token>> = text.iter().map(|p| parse_stream(p).unwrap()).collect();
        assert_eq!(
            join_stream(&assemble_tokens(&tokens, 3)),
            assemble_corpus(&text, 3)
        );
    }

    #[test]
    fn test_assemble_nothing() {
        assert_eq!(assemble_corpus(&[], 4), "");
        assert!(assemble_tokens(&[], 4).is_empty());
    }

    #[test]
    fn test_split_pieces() {
        let corpus = parse_stream("60 _ / / 62 / /").unwrap();
        assert_eq!(
            split_pieces(&corpus),
            vec![vec![Token::Pitch(60), Token::Carry], vec![Token::Pitch(62)]]
        );
    }

    #[test]
    fn test_build_skips_bad_pieces() {
        let pieces = vec![
            vec![Event::note(60, 1.0), Event::rest(0.5)],
            vec![Event::note(61, 1.25)],
            vec![Event::note(62, 0.25)],
        ];
        let config = CodecConfig {
            sequence_length: 2,
            ..Default::default()
        };
        let build = build_corpus(&pieces, &config).unwrap();
        assert_eq!(build.accepted, vec![0, 2]);
        assert_eq!(build.rejected.len(), 1);
        assert_eq!(build.rejected[0].index, 1);
        assert!(matches!(
            build.rejected[0].error,
            CodecError::UnacceptableDuration { index: 0, .. }
        ));
        assert_eq!(join_stream(&build.corpus), "60 _ _ _ r _ / / 62 / /");
        // 60, 62, r, _, /
        assert_eq!(build.vocabulary.len(), 5);
    }

    #[test]
    fn test_build_rejects_unreadable_pitch() {
        let pieces = vec![
            vec![Event::note(60, 1.0)],
            vec![Event::note(62, 0.5), Event::note(200, 1.0)],
            vec![Event::note(64, 0.25)],
        ];
        let config = CodecConfig {
            sequence_length: 1,
            ..Default::default()
        };
        let build = build_corpus(&pieces, &config).unwrap();
        assert_eq!(build.accepted, vec![0, 2]);
        assert_eq!(build.rejected.len(), 1);
        assert!(matches!(
            build.rejected[0].error,
            CodecError::InvalidPitch {
                index: 1,
                pitch: 200
            }
        ));

        // Everything written from the build reads back.
        let dir = tempfile::tempdir().unwrap();
        let corpus_path = dir.path().join("dataset.txt");
        let vocab_path = dir.path().join("mapping.json");
        save_corpus(&corpus_path, &build.corpus).unwrap();
        build.vocabulary.save(&vocab_path).unwrap();
        assert_eq!(load_corpus(&corpus_path).unwrap(), build.corpus);
        assert_eq!(Vocabulary::load(&vocab_path).unwrap(), build.vocabulary);
    }

    #[test]
    fn test_build_rejects_bad_config() {
        let config = CodecConfig {
            sequence_length: 0,
            ..Default::default()
        };
        assert!(build_corpus(&[], &config).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.txt");
        let corpus = parse_stream("60 _ / / r 62 / /").unwrap();
        save_corpus(&path, &corpus).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "60 _ / / r 62 / /");
        assert_eq!(load_corpus(&path).unwrap(), corpus);
    }
}
