// Token vocabulary: the bijection between tokens and dense integer ids.
//
// Built once from a complete corpus and then treated as read-only
// configuration. Training windows, model outputs and generated melodies are
// all expressed in its ids, so the table written next to a corpus must be
// the one loaded at generation time; rebuilding it from a different corpus
// silently remaps every id.
//
// Ids follow the token ordering (`Token`'s `Ord`): pitches ascending, then
// "r", "_", "/". Both directions are O(1): `ids` for token -> id and
// `tokens` for id -> token.
//
// On disk the vocabulary is a JSON object of token -> id. Loading checks
// that the ids are exactly 0..n with no duplicates, so a hand-edited or
// truncated file fails at load time instead of producing wrong tokens
// mid-generation.

use crate::error::CodecError;
use crate::token::Token;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    /// id -> token.
    tokens: Vec<Token>,
    /// token -> id.
    ids: HashMap<Token, usize>,
}

impl Vocabulary {
    /// Build from every token in a (possibly multi-piece) stream.
    pub fn build(stream: &[Token]) -> Self {
        let distinct: BTreeSet<Token> = stream.iter().copied().collect();
        Self::from_ordered(distinct.into_iter().collect())
    }

    fn from_ordered(tokens: Vec<Token>) -> Self {
        let ids = tokens.iter().enumerate().map(|(i, &t)| (t, i)).collect();
        Vocabulary { tokens, ids }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Id of a token. Fails with `UnknownToken` when the token never
    /// appeared in the corpus the vocabulary was built from.
    pub fn id(&self, token: Token) -> Result<usize, CodecError> {
        self.ids
            .get(&token)
            .copied()
            .ok_or_else(|| CodecError::UnknownToken(token.to_string()))
    }

    /// Token for an id, or None if the id is out of range.
    pub fn token(&self, id: usize) -> Option<Token> {
        self.tokens.get(id).copied()
    }

    /// Tokens in id order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Map a token sequence to ids.
    pub fn encode(&self, tokens: &[Token]) -> Result<Vec<usize>, CodecError> {
        tokens.iter().map(|&t| self.id(t)).collect()
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        let map: BTreeMap<String, usize> = self
            .tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();
        Ok(serde_json::to_string_pretty(&map)?)
    }

    /// Parse a token -> id JSON object, enforcing bijectivity onto `0..n`.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        let map: BTreeMap<String, usize> = serde_json::from_str(json)?;
        let n = map.len();
        let mut slots: Vec<Option<Token>> = vec![None; n];
        for (text, id) in map {
            let token: Token = text
                .parse()
                .map_err(|_| CodecError::CorruptVocabulary(format!("invalid token '{text}'")))?;
            let slot = slots.get_mut(id).ok_or_else(|| {
                CodecError::CorruptVocabulary(format!(
                    "id {id} for '{text}' is out of range 0..{n}"
                ))
            })?;
            if let Some(existing) = slot {
                return Err(CodecError::CorruptVocabulary(format!(
                    "id {id} is assigned to both '{existing}' and '{text}'"
                )));
            }
            *slot = Some(token);
        }
        // Token text is canonical, so distinct keys are distinct tokens and
        // every slot in 0..n is filled.
        Ok(Self::from_ordered(slots.into_iter().flatten().collect()))
    }

    pub fn save(&self, path: &Path) -> Result<(), CodecError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CodecError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }
}
