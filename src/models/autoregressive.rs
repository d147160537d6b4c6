//! Linear autoregressive wavefunction.
//!
//! Along a site order `o`, the k-th site is +1 with probability σ(z_k) where
//! z_k = b_k + Σ_{m<k} W_km s_{o_m}. The amplitude is
//! ψ(s) = Π_k p(s_{o_k} | ·)^{1/2} · exp(i Σ_k φ_k s_{o_k}), so |ψ|² is
//! normalized by construction.

use num_complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VmcError};
use crate::hilbert::Configuration;
use crate::wavefunction::{AutoregressiveWavefunction, SiteLogProbs, Wavefunction};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinearAutoregressive {
    order: Vec<usize>,
    biases: Vec<f64>,
    /// Row k holds the k weights on the previously sampled sites.
    weights: Vec<Vec<f64>>,
    phases: Vec<f64>,
}

/// ln(1 + e^x) without overflow.
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

impl LinearAutoregressive {
    /// Random model over `n_sites` in raster order.
    pub fn random<R: Rng + ?Sized>(n_sites: usize, scale: f64, rng: &mut R) -> Result<Self> {
        Self::random_with_order((0..n_sites).collect(), scale, rng)
    }

    /// Random model conditioning sites in `order` (a permutation of raster indices).
    pub fn random_with_order<R: Rng + ?Sized>(order: Vec<usize>, scale: f64, rng: &mut R) -> Result<Self> {
        let n = order.len();
        let mut seen = vec![false; n];
        for &site in &order {
            if site >= n || std::mem::replace(&mut seen[site], true) {
                return Err(VmcError::Config(format!("site order {:?} is not a permutation", order)));
            }
        }
        let normal = Normal::new(0.0, scale)
            .map_err(|err| VmcError::Config(format!("invalid initialisation scale {}: {}", scale, err)))?;
        let biases = (0..n).map(|_| normal.sample(rng)).collect();
        let weights = (0..n).map(|k| (0..k).map(|_| normal.sample(rng)).collect()).collect();
        let phases = (0..n).map(|_| normal.sample(rng)).collect();
        Ok(Self { order, biases, weights, phases })
    }

    pub fn n_sites(&self) -> usize {
        self.order.len()
    }

    /// Conditional log-probabilities of every site, indexed by raster site.
    fn conditionals(&self, s: &[i8]) -> Vec<SiteLogProbs> {
        let mut out = vec![[0.0; 2]; self.n_sites()];
        for (k, &site) in self.order.iter().enumerate() {
            let z = self.biases[k]
                + self.weights[k]
                    .iter()
                    .zip(&self.order[..k])
                    .map(|(w, &prev)| w * s[prev] as f64)
                    .sum::<f64>();
            out[site] = [-softplus(z), -softplus(-z)];
        }
        out
    }

    fn log_amplitude(&self, s: &[i8]) -> Complex64 {
        let conditionals = self.conditionals(s);
        let log_prob: f64 = s
            .iter()
            .zip(&conditionals)
            .map(|(&v, lp)| lp[usize::from(v > 0)])
            .sum();
        let phase: f64 = self
            .order
            .iter()
            .zip(&self.phases)
            .map(|(&site, phi)| phi * s[site] as f64)
            .sum();
        Complex64::new(0.5 * log_prob, phase)
    }
}

impl Wavefunction for LinearAutoregressive {
    fn log_amplitudes(&self, batch: &[Configuration]) -> Vec<Complex64> {
        batch.iter().map(|s| self.log_amplitude(s)).collect()
    }

    fn as_autoregressive(&self) -> Option<&dyn AutoregressiveWavefunction> {
        Some(self)
    }
}

impl AutoregressiveWavefunction for LinearAutoregressive {
    fn site_order(&self) -> Vec<usize> {
        self.order.clone()
    }

    fn conditional_log_probs(&self, batch: &[Configuration]) -> Vec<Vec<SiteLogProbs>> {
        batch.iter().map(|s| self.conditionals(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilbert::HilbertSpace;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_normalized_by_construction() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let model = LinearAutoregressive::random_with_order(vec![2, 0, 3, 1], 0.8, &mut rng).unwrap();
        let hilbert = HilbertSpace::chain(4, false).unwrap();
        let states: Vec<Configuration> = hilbert.all_configurations().unwrap().collect();
        let norm: f64 = model
            .log_amplitudes(&states)
            .iter()
            .map(|l| (2.0 * l.re).exp())
            .sum();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_conditionals_ignore_later_sites() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let model = LinearAutoregressive::random_with_order(vec![1, 0, 2], 1.0, &mut rng).unwrap();
        let a = model.conditionals(&[1, -1, 1]);
        let b = model.conditionals(&[-1, -1, -1]);
        // site 1 is first in the order and depends on nothing
        assert_eq!(a[1], b[1]);
        for lp in &a {
            assert_relative_eq!(lp[0].exp() + lp[1].exp(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rejects_bad_order() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        assert!(LinearAutoregressive::random_with_order(vec![0, 0, 1], 1.0, &mut rng).is_err());
        assert!(LinearAutoregressive::random_with_order(vec![0, 3, 1], 1.0, &mut rng).is_err());
    }
}
