// Training windows: (context, next-token) pairs from a corpus.
//
// The corpus is mapped to vocabulary ids, then a window of
// `sequence_length` ids slides over it one token at a time. Window `i` has
// context `ids[i..i + sequence_length]` and target `ids[i + sequence_length]`,
// giving `len - sequence_length` examples (none when the corpus is not
// longer than one window). Contexts are one-hot encoded at the vocabulary's
// width, the input layout a next-token model expects:
// `(sequence_length, vocabulary_size)` per example.
//
// Fully materialized, a corpus costs
// `examples * sequence_length * vocabulary_size` floats, so the windower is
// an iterator and examples are built on demand. `training_examples` collects
// them for callers with small corpora.

use crate::error::CodecError;
use crate::token::Token;
use crate::vocabulary::Vocabulary;

/// A row-major matrix of one-hot rows.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHot {
    rows: usize,
    width: usize,
    data: Vec<f32>,
}

impl OneHot {
    /// One row per id, each `width` wide with a single 1.0 at the id.
    ///
    /// Fails with `IdOutOfRange` if an id is not below `width`.
    pub fn from_ids(ids: &[usize], width: usize) -> Result<Self, CodecError> {
        if let Some(&id) = ids.iter().find(|&&id| id >= width) {
            return Err(CodecError::IdOutOfRange { id, width });
        }
        Ok(Self::from_checked_ids(ids, width))
    }

    /// Ids must already be below `width`.
    fn from_checked_ids(ids: &[usize], width: usize) -> Self {
        let mut data = vec![0.0; ids.len() * width];
        for (row, &id) in ids.iter().enumerate() {
            data[row * width + id] = 1.0;
        }
        OneHot {
            rows: ids.len(),
            width,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(rows, width)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.width)
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.width..(index + 1) * self.width]
    }

    /// The hot column of each row.
    pub fn hot_indices(&self) -> Vec<usize> {
        (0..self.rows)
            .map(|r| {
                self.row(r)
                    .iter()
                    .position(|&v| v == 1.0)
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// One supervised example.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub context: OneHot,
    /// Vocabulary id of the token after the context.
    pub target: usize,
}

/// Map every token to its vocabulary id.
pub fn map_to_ids(tokens: &[Token], vocabulary: &Vocabulary) -> Result<Vec<usize>, CodecError> {
    vocabulary.encode(tokens)
}

/// Lazy iterator over the training examples of a corpus.
#[derive(Debug, Clone)]
pub struct SequenceWindower {
    ids: Vec<usize>,
    sequence_length: usize,
    vocabulary_size: usize,
    next: usize,
}

impl SequenceWindower {
    /// Fails with `UnknownToken` if the corpus contains a token missing from
    /// the vocabulary, and `InvalidConfig` for a zero-length window.
    pub fn new(
        tokens: &[Token],
        vocabulary: &Vocabulary,
        sequence_length: usize,
    ) -> Result<Self, CodecError> {
        if sequence_length == 0 {
            return Err(CodecError::InvalidConfig(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        Ok(SequenceWindower {
            ids: map_to_ids(tokens, vocabulary)?,
            sequence_length,
            vocabulary_size: vocabulary.len(),
            next: 0,
        })
    }

    /// Total number of examples, independent of iteration progress.
    pub fn num_examples(&self) -> usize {
        self.ids.len().saturating_sub(self.sequence_length)
    }

    /// The raw id window and target at `index`, without one-hot expansion.
    pub fn window(&self, index: usize) -> Option<(&[usize], usize)> {
        if index >= self.num_examples() {
            return None;
        }
        let end = index + self.sequence_length;
        Some((&self.ids[index..end], self.ids[end]))
    }

    /// Shape of the full input tensor: `(examples, sequence_length, vocabulary_size)`.
    pub fn input_shape(&self) -> (usize, usize, usize) {
        (self.num_examples(), self.sequence_length, self.vocabulary_size)
    }
}

impl Iterator for SequenceWindower {
    type Item = TrainingExample;

    fn next(&mut self) -> Option<Self::Item> {
        let (context, target) = self.window(self.next)?;
        let example = TrainingExample {
            // Ids were mapped through a vocabulary of this size.
            context: OneHot::from_checked_ids(context, self.vocabulary_size),
            target,
        };
        self.next += 1;
        Some(example)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.num_examples().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SequenceWindower {}

/// Every training example of a corpus, in corpus order.
pub fn training_examples(
    tokens: &[Token],
    vocabulary: &Vocabulary,
    sequence_length: usize,
) -> Result<Vec<TrainingExample>, CodecError> {
    Ok(SequenceWindower::new(tokens, vocabulary, sequence_length)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::parse_stream;

    fn corpus() -> (Vec<Token>, Vocabulary) {
        let tokens = parse_stream("60 _ 62 _ r 64 / /").unwrap();
        let vocab = Vocabulary::build(&tokens);
        (tokens, vocab)
    }

    #[test]
    fn test_one_hot_rows() {
        let m = OneHot::from_ids(&[2, 0, 1], 3).unwrap();
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m.row(0), &[0.0, 0.0, 1.0]);
        assert_eq!(m.row(1), &[1.0, 0.0, 0.0]);
        assert_eq!(m.hot_indices(), vec![2, 0, 1]);
    }

    #[test]
    fn test_one_hot_rejects_wide_id() {
        assert!(matches!(
            OneHot::from_ids(&[0, 3], 3),
            Err(CodecError::IdOutOfRange { id: 3, width: 3 })
        ));
        assert_eq!(OneHot::from_ids(&[], 3).unwrap().shape(), (0, 3));
    }

    #[test]
    fn test_example_count() {
        let (tokens, vocab) = corpus();
        let w = SequenceWindower::new(&tokens, &vocab, 3).unwrap();
        assert_eq!(w.len(), tokens.len() - 3);
        assert_eq!(w.input_shape(), (5, 3, vocab.len()));
        assert_eq!(w.count(), 5);
    }

    #[test]
    fn test_targets_follow_context() {
        let (tokens, vocab) = corpus();
        let s = 3;
        let examples = training_examples(&tokens, &vocab, s).unwrap();
        for (i, example) in examples.iter().enumerate() {
            assert_eq!(example.context.shape(), (s, vocab.len()));
            assert_eq!(vocab.token(example.target), Some(tokens[i + s]));
            let context: Vec<Token> = example
                .context
                .hot_indices()
                .into_iter()
                .map(|id| vocab.token(id).unwrap())
                .collect();
            assert_eq!(context, &tokens[i..i + s]);
        }
    }

    #[test]
    fn test_short_corpus_has_no_examples() {
        let (tokens, vocab) = corpus();
        assert_eq!(training_examples(&tokens, &vocab, tokens.len()).unwrap().len(), 0);
        assert_eq!(training_examples(&tokens, &vocab, 100).unwrap().len(), 0);
    }

    #[test]
    fn test_unknown_token_fails() {
        let (_, vocab) = corpus();
        let other = parse_stream("60 _ 65").unwrap();
        assert!(matches!(
            SequenceWindower::new(&other, &vocab, 1),
            Err(CodecError::UnknownToken(t)) if t == "65"
        ));
    }

    #[test]
    fn test_zero_window_rejected() {
        let (tokens, vocab) = corpus();
        assert!(SequenceWindower::new(&tokens, &vocab, 0).is_err());
    }

    #[test]
    fn test_raw_window() {
        let (tokens, vocab) = corpus();
        let w = SequenceWindower::new(&tokens, &vocab, 2).unwrap();
        let (context, target) = w.window(0).unwrap();
        let expected = [
            vocab.id(Token::Pitch(60)).unwrap(),
            vocab.id(Token::Carry).unwrap(),
        ];
        assert_eq!(context, &expected);
        assert_eq!(target, vocab.id(Token::Pitch(62)).unwrap());
        assert!(w.window(w.num_examples()).is_none());
    }
}
