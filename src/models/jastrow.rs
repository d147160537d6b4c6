//! Spin Jastrow wavefunction.
//!
//! log ψ(s) = Σᵢ aᵢ sᵢ + Σᵢ<ⱼ Wᵢⱼ sᵢ sⱼ with complex fields `a` and couplings `W`.
//! Without couplings it reduces to a complex product state (log-linear model).

use num_complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VmcError};
use crate::hilbert::Configuration;
use crate::wavefunction::{OptimizableWavefunction, Wavefunction};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Jastrow {
    /// Single-site fields aᵢ
    pub fields: Vec<Complex64>,
    /// Pair couplings Wᵢⱼ for i < j in row-major order, empty for a product state
    pub couplings: Vec<Complex64>,
}

impl Jastrow {
    /// Full Jastrow with all pair couplings set to zero.
    pub fn zeros(n_sites: usize) -> Self {
        Self {
            fields: vec![Complex64::new(0.0, 0.0); n_sites],
            couplings: vec![Complex64::new(0.0, 0.0); n_sites * n_sites.saturating_sub(1) / 2],
        }
    }

    /// Product state `ψ(s) = exp(Σᵢ aᵢ sᵢ)`.
    pub fn product_state(fields: Vec<Complex64>) -> Self {
        Self { fields, couplings: Vec::new() }
    }

    /// Gaussian random parameters with standard deviation `scale`; the
    /// imaginary parts stay zero unless `complex` is set.
    pub fn random<R: Rng + ?Sized>(
        n_sites: usize,
        with_couplings: bool,
        complex: bool,
        scale: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let normal = Normal::new(0.0, scale)
            .map_err(|err| VmcError::Config(format!("invalid initialisation scale {}: {}", scale, err)))?;
        let draw = |rng: &mut R| {
            let re = normal.sample(rng);
            let im = if complex { normal.sample(rng) } else { 0.0 };
            Complex64::new(re, im)
        };
        let mut model = Self::zeros(n_sites);
        if !with_couplings {
            model.couplings.clear();
        }
        for a in model.fields.iter_mut() {
            *a = draw(rng);
        }
        for w in model.couplings.iter_mut() {
            *w = draw(rng);
        }
        Ok(model)
    }

    pub fn n_sites(&self) -> usize {
        self.fields.len()
    }

    /// Generate all unique site pairs (i, j) with i < j, in coupling order.
    fn unique_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = if self.couplings.is_empty() { 0 } else { self.n_sites() };
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j)))
    }

    fn log_amplitude(&self, s: &[i8]) -> Complex64 {
        let field: Complex64 = self.fields.iter().zip(s).map(|(a, &v)| *a * v as f64).sum();
        let pair: Complex64 = self
            .unique_pairs()
            .zip(&self.couplings)
            .map(|((i, j), w)| *w * (s[i] * s[j]) as f64)
            .sum();
        field + pair
    }

    fn complex_params(&self) -> impl Iterator<Item = &Complex64> {
        self.fields.iter().chain(&self.couplings)
    }
}

impl Wavefunction for Jastrow {
    fn log_amplitudes(&self, batch: &[Configuration]) -> Vec<Complex64> {
        batch.iter().map(|s| self.log_amplitude(s)).collect()
    }
}

/// Parameters are laid out as all real parts followed by all imaginary parts.
impl OptimizableWavefunction for Jastrow {
    fn num_params(&self) -> usize {
        2 * (self.fields.len() + self.couplings.len())
    }

    fn params(&self) -> Vec<f64> {
        self.complex_params()
            .map(|c| c.re)
            .chain(self.complex_params().map(|c| c.im))
            .collect()
    }

    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        if params.len() != self.num_params() {
            return Err(VmcError::shape("Jastrow parameters", self.num_params(), params.len()));
        }
        let half = params.len() / 2;
        for (k, c) in self.fields.iter_mut().chain(self.couplings.iter_mut()).enumerate() {
            *c = Complex64::new(params[k], params[half + k]);
        }
        Ok(())
    }

    fn log_derivatives(&self, batch: &[Configuration]) -> Vec<Vec<Complex64>> {
        batch
            .iter()
            .map(|s| {
                let real: Vec<f64> = s
                    .iter()
                    .map(|&v| v as f64)
                    .chain(self.unique_pairs().map(|(i, j)| (s[i] * s[j]) as f64))
                    .collect();
                let re_part = real.iter().map(|&x| Complex64::new(x, 0.0));
                let im_part = real.iter().map(|&x| Complex64::new(0.0, x));
                re_part.chain(im_part).collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_product_state_value() {
        let model = Jastrow::product_state(vec![Complex64::new(0.5, 0.1), Complex64::new(-0.2, 0.0)]);
        let value = model.log_amplitudes(&[Configuration::new(vec![1, -1])])[0];
        assert_relative_eq!(value.re, 0.7, epsilon = 1e-12);
        assert_relative_eq!(value.im, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_params_round_trip() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut model = Jastrow::random(4, true, true, 0.3, &mut rng).unwrap();
        assert_eq!(model.num_params(), 2 * (4 + 6));
        let params = model.params();
        let before = model.clone();
        model.set_params(&params).unwrap();
        assert_eq!(model, before);
        assert!(model.set_params(&params[1..]).is_err());
    }

    #[test]
    fn test_numerical_log_derivatives() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let model = Jastrow::random(5, true, true, 0.2, &mut rng).unwrap();
        let config = Configuration::new(vec![1, -1, -1, 1, 1]);
        let h = 1e-5;

        let analytical = &model.log_derivatives(std::slice::from_ref(&config))[0];
        let numerical = model.numerical_log_derivatives(&config, h).unwrap();

        assert_eq!(analytical.len(), numerical.len());
        for (a, n) in analytical.iter().zip(&numerical) {
            assert_relative_eq!(a.re, n.re, epsilon = 1e-6);
            assert_relative_eq!(a.im, n.im, epsilon = 1e-6);
        }
    }
}
