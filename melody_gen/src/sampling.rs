// Temperature sampling from a next-token distribution.
//
// The distribution is sharpened or flattened by dividing log-probabilities
// by the temperature and renormalizing:
//
//     p'_i = exp(ln(p_i) / T) / sum_j exp(ln(p_j) / T)
//
// T = 1 leaves p unchanged (up to float error); T -> 0 concentrates all
// mass on the most likely token; T > 1 flattens toward uniform. Zero
// probabilities stay zero at every temperature. T <= 0 is rejected.
//
// The only randomness is the final draw, taken from the caller's RNG, so a
// seeded RNG gives reproducible generations.

use crate::error::GenerateError;
use rand::Rng;

/// Rescale `probabilities` by `temperature` and renormalize.
pub fn reweight(probabilities: &[f64], temperature: f64) -> Result<Vec<f64>, GenerateError> {
    if !(temperature.is_finite() && temperature > 0.0) {
        return Err(GenerateError::InvalidTemperature(temperature));
    }
    if let Some(p) = probabilities.iter().find(|p| p.is_nan() || **p < 0.0) {
        return Err(GenerateError::InvalidDistribution(format!(
            "probability {p} is not a non-negative number"
        )));
    }

    let logits: Vec<f64> = probabilities.iter().map(|p| p.ln() / temperature).collect();
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return Err(GenerateError::InvalidDistribution(
            "no outcome has positive probability".to_string(),
        ));
    }

    // Subtracting the max keeps exp() in range for small temperatures.
    let exp: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    Ok(exp.into_iter().map(|e| e / sum).collect())
}

/// Draw an index from a distribution using a uniform value in [0, 1).
///
/// Walks the cumulative sum; zero-weight entries are never returned.
pub fn draw_index(weights: &[f64], rng_val: f64) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return None;
    }
    let target = rng_val * total;
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if w > 0.0 && cumulative > target {
            return Some(i);
        }
    }
    // Float error can leave the target just past the last sum.
    weights.iter().rposition(|&w| w > 0.0)
}

/// Sample one outcome index from `probabilities` at `temperature`.
pub fn sample_with_temperature(
    probabilities: &[f64],
    temperature: f64,
    rng: &mut impl Rng,
) -> Result<usize, GenerateError> {
    let reweighted = reweight(probabilities, temperature)?;
    let rng_val: f64 = rng.random();
    draw_index(&reweighted, rng_val).ok_or_else(|| {
        GenerateError::InvalidDistribution("no outcome has positive probability".to_string())
    })
}
