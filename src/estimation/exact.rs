//! Exact |ψ|² distribution over an enumerated Hilbert space.

use num_complex::Complex64;

use crate::error::Result;
use crate::hilbert::Configuration;
use crate::wavefunction::{evaluate_in_chunks, Wavefunction};

/// Normalized probabilities |ψ(s)|² / Z of every enumerated state.
#[derive(Clone, Debug)]
pub struct ExactDistribution {
    pub log_psi: Vec<Complex64>,
    pub probabilities: Vec<f64>,
}

impl ExactDistribution {
    /// Evaluate `states` in model calls of `chunk` configurations and normalize.
    pub fn compute<W: Wavefunction + ?Sized>(
        wavefunction: &W,
        states: &[Configuration],
        chunk: Option<usize>,
    ) -> Result<Self> {
        let log_psi = evaluate_in_chunks(wavefunction, states, chunk)?;
        let probabilities = normalized_probabilities(&log_psi);
        Ok(Self { log_psi, probabilities })
    }
}

/// |ψ|²/Z from log-amplitudes, normalized with log-sum-exp over `2·Re log ψ`.
pub fn normalized_probabilities(log_psi: &[Complex64]) -> Vec<f64> {
    let max = log_psi
        .iter()
        .map(|l| 2.0 * l.re)
        .fold(f64::NEG_INFINITY, f64::max);
    let unnormalized: Vec<f64> = log_psi.iter().map(|l| (2.0 * l.re - max).exp()).collect();
    let z: f64 = unnormalized.iter().sum();
    unnormalized.into_iter().map(|p| p / z).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalization_survives_huge_amplitudes() {
        let log_psi = vec![
            Complex64::new(400.0, 0.3),
            Complex64::new(400.0 + 0.5 * 2f64.ln(), -1.0),
            Complex64::new(-400.0, 0.0),
        ];
        let p = normalized_probabilities(&log_psi);
        assert_relative_eq!(p[0], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(p[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }
}
