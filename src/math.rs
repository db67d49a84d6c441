use randomkit::dist::Uniform;
use randomkit::{Rng, Sample};
use statrs::function::gamma;

use crate::error::{Error, Result};

pub fn gammaln(x: f64) -> f64 {
    gamma::ln_gamma(x)
}

/// Uniform draws on [0, 1).
pub fn unit_uniform() -> Result<Uniform> {
    Uniform::new(0.0, 1.0).map_err(|e| Error::InvalidParameter(e.to_string()))
}

/// Draws an index uniformly from `0..n`.
pub fn random_index(n: usize, uniform: &Uniform, rng: &mut Rng) -> usize {
    let idx = (uniform.sample(rng) * n as f64) as usize;
    idx.min(n - 1)
}

/// Inverse-CDF draw from unnormalised, non-negative `weights` summing to `total`.
pub fn sample_discrete(weights: &[f64], total: f64, uniform: &Uniform, rng: &mut Rng) -> usize {
    let mut threshold = uniform.sample(rng) * total;
    for (idx, w) in weights.iter().enumerate() {
        threshold -= w;
        if threshold < 0.0 {
            return idx;
        }
    }
    weights.len() - 1
}
