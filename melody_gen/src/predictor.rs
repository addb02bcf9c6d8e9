// The next-token predictor boundary.
//
// A predictor takes a one-hot context of shape `(context_len, |V|)` and
// returns `|V|` probabilities for the token that follows. The trained
// network the pipeline was designed around, the Markov model in markov.rs,
// and the deterministic stubs below all sit behind the same trait, so the
// generator never knows which one it is driving.

use crate::error::GenerateError;
use melody_codec::window::OneHot;

pub trait NextTokenPredictor {
    /// Probability of each vocabulary id following `context`.
    fn predict(&mut self, context: &OneHot) -> Result<Vec<f64>, GenerateError>;
}

impl<P: NextTokenPredictor + ?Sized> NextTokenPredictor for &mut P {
    fn predict(&mut self, context: &OneHot) -> Result<Vec<f64>, GenerateError> {
        (**self).predict(context)
    }
}

impl<P: NextTokenPredictor + ?Sized> NextTokenPredictor for Box<P> {
    fn predict(&mut self, context: &OneHot) -> Result<Vec<f64>, GenerateError> {
        (**self).predict(context)
    }
}

/// Returns the same distribution regardless of context.
#[derive(Debug, Clone)]
pub struct FixedDistribution {
    probabilities: Vec<f64>,
}

impl FixedDistribution {
    pub fn new(probabilities: Vec<f64>) -> Self {
        FixedDistribution { probabilities }
    }

    /// Equal mass on every id.
    pub fn uniform(vocabulary_size: usize) -> Self {
        Self::new(vec![1.0 / vocabulary_size as f64; vocabulary_size])
    }
}

impl NextTokenPredictor for FixedDistribution {
    fn predict(&mut self, _context: &OneHot) -> Result<Vec<f64>, GenerateError> {
        Ok(self.probabilities.clone())
    }
}

/// Puts all mass on a fixed sequence of ids, one per call, repeating the
/// last id once the script is exhausted. Records every context it was
/// shown.
#[derive(Debug, Clone)]
pub struct ScriptedPredictor {
    script: Vec<usize>,
    vocabulary_size: usize,
    calls: usize,
    /// Hot ids of each context passed to `predict`, in call order.
    pub seen_contexts: Vec<Vec<usize>>,
}

impl ScriptedPredictor {
    pub fn new(script: Vec<usize>, vocabulary_size: usize) -> Self {
        ScriptedPredictor {
            script,
            vocabulary_size,
            calls: 0,
            seen_contexts: Vec::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl NextTokenPredictor for ScriptedPredictor {
    fn predict(&mut self, context: &OneHot) -> Result<Vec<f64>, GenerateError> {
        let id = self
            .script
            .get(self.calls)
            .or_else(|| self.script.last())
            .copied()
            .ok_or_else(|| GenerateError::Predictor("empty script".to_string()))?;
        if id >= self.vocabulary_size {
            return Err(GenerateError::Predictor(format!(
                "scripted id {id} outside vocabulary of {}",
                self.vocabulary_size
            )));
        }
        self.calls += 1;
        self.seen_contexts.push(context.hot_indices());
        let mut probabilities = vec![0.0; self.vocabulary_size];
        probabilities[id] = 1.0;
        Ok(probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_distribution() {
        let mut p = FixedDistribution::uniform(4);
        let out = p.predict(&OneHot::from_ids(&[0, 1], 4).unwrap()).unwrap();
        assert_eq!(out, vec![0.25; 4]);
    }

    #[test]
    fn test_scripted_predictor() {
        let mut p = ScriptedPredictor::new(vec![2, 0], 3);
        let ctx = OneHot::from_ids(&[1], 3).unwrap();
        assert_eq!(p.predict(&ctx).unwrap(), vec![0.0, 0.0, 1.0]);
        assert_eq!(p.predict(&ctx).unwrap(), vec![1.0, 0.0, 0.0]);
        // Exhausted: repeats the last id.
        assert_eq!(p.predict(&ctx).unwrap(), vec![1.0, 0.0, 0.0]);
        assert_eq!(p.calls(), 3);
        assert_eq!(p.seen_contexts, vec![vec![1], vec![1], vec![1]]);
    }

    #[test]
    fn test_scripted_predictor_bad_id() {
        let mut p = ScriptedPredictor::new(vec![5], 3);
        assert!(p.predict(&OneHot::from_ids(&[0], 3).unwrap()).is_err());
    }

    #[test]
    fn test_boxed_predictor() {
        let mut p: Box<dyn NextTokenPredictor> = Box::new(FixedDistribution::uniform(2));
        assert_eq!(p.predict(&OneHot::from_ids(&[0], 2).unwrap()).unwrap(), vec![0.5, 0.5]);
    }
}
