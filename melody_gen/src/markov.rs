// Count-based n-gram predictor over vocabulary ids.
//
// A lightweight stand-in for a trained network: it counts which id follows
// each context of up to `order` ids in the training corpus and, at
// prediction time, backs off from the longest context seen in training to
// shorter ones, down to the unigram table. Additive smoothing keeps every id
// at non-zero probability so temperature reweighting can still reach it.
//
// Because the corpus separates pieces with delimiter runs, contexts made of
// "/" tokens learn how pieces begin, and contexts at the end of a piece
// learn to predict "/", which is what stops generation.
//
// Tables are keyed by the context ids joined with commas ("4,0,0") and
// saved as JSON next to the vocabulary they index into.

use crate::error::GenerateError;
use crate::predictor::NextTokenPredictor;
use melody_codec::window::OneHot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Next id -> count.
type TransitionTable = BTreeMap<usize, f64>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkovPredictor {
    /// Longest context length used.
    pub order: usize,
    pub vocabulary_size: usize,
    /// Pseudo-count added to every id.
    pub smoothing: f64,
    /// `tables[k]`: contexts of exactly `k` ids. `tables[0]` holds the
    /// unigram table under the empty key.
    pub tables: Vec<BTreeMap<String, TransitionTable>>,
}

impl MarkovPredictor {
    /// Count transitions in an id stream.
    pub fn train(
        ids: &[usize],
        order: usize,
        vocabulary_size: usize,
        smoothing: f64,
    ) -> Result<Self, GenerateError> {
        if vocabulary_size == 0 {
            return Err(GenerateError::InvalidConfig(
                "cannot train on an empty vocabulary".to_string(),
            ));
        }
        if !(smoothing.is_finite() && smoothing >= 0.0) {
            return Err(GenerateError::InvalidConfig(format!(
                "smoothing must be non-negative, got {smoothing}"
            )));
        }
        if let Some(&bad) = ids.iter().find(|&&id| id >= vocabulary_size) {
            return Err(GenerateError::InvalidConfig(format!(
                "id {bad} outside vocabulary of {vocabulary_size}"
            )));
        }

        let mut tables: Vec<BTreeMap<String, TransitionTable>> = vec![BTreeMap::new(); order + 1];
        for (t, &next) in ids.iter().enumerate() {
            for (k, table) in tables.iter_mut().enumerate().take(order.min(t) + 1) {
                let key = context_key(&ids[t - k..t]);
                *table.entry(key).or_default().entry(next).or_insert(0.0) += 1.0;
            }
        }

        info!(
            order,
            vocabulary_size,
            contexts = tables.iter().map(BTreeMap::len).sum::<usize>(),
            "trained Markov predictor"
        );
        Ok(MarkovPredictor {
            order,
            vocabulary_size,
            smoothing,
            tables,
        })
    }

    /// Distribution over the next id given a context of ids.
    ///
    /// Uses the longest suffix of `context` (at most `order` ids) that was
    /// seen in training.
    pub fn distribution(&self, context: &[usize]) -> Vec<f64> {
        let longest = self.order.min(context.len());
        let table = (1..=longest)
            .rev()
            .find_map(|k| {
                self.tables[k]
                    .get(&context_key(&context[context.len() - k..]))
                    .filter(|t| t.values().sum::<f64>() > 0.0)
            })
            .or_else(|| self.tables.first().and_then(|t| t.get("")));

        let counts = |id: usize| table.and_then(|t| t.get(&id)).copied().unwrap_or(0.0);
        let weights: Vec<f64> = (0..self.vocabulary_size)
            .map(|id| counts(id) + self.smoothing)
            .collect();
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            weights.into_iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / self.vocabulary_size as f64; self.vocabulary_size]
        }
    }

    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let data = std::fs::read_to_string(path)?;
        let model: MarkovPredictor = serde_json::from_str(&data)?;
        if model.tables.len() != model.order + 1 {
            return Err(GenerateError::InvalidConfig(format!(
                "model of order {} has {} tables",
                model.order,
                model.tables.len()
            )));
        }
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<(), GenerateError> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

impl NextTokenPredictor for MarkovPredictor {
    fn predict(&mut self, context: &OneHot) -> Result<Vec<f64>, GenerateError> {
        if context.width() != self.vocabulary_size {
            return Err(GenerateError::Predictor(format!(
                "context width {} does not match model vocabulary {}",
                context.width(),
                self.vocabulary_size
            )));
        }
        Ok(self.distribution(&context.hot_indices()))
    }
}

/// Encode a context as a string key for BTreeMap lookup.
fn context_key(context: &[usize]) -> String {
    context
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
