//! Local energy E_loc(s) = Σ_s' O(s, s') ψ(s') / ψ(s).

use num_complex::Complex64;
use tracing::debug;

use crate::error::{Result, VmcError};
use crate::hilbert::Configuration;
use crate::operators::Operator;
use crate::wavefunction::{evaluate_in_chunks, Wavefunction};

/// Per-sample local energies together with the log-amplitudes of the samples.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalEnergies {
    pub values: Vec<Complex64>,
    pub log_psi: Vec<Complex64>,
}

/// Computes local energies of an operator for batches of configurations.
pub struct LocalEnergyEstimator<O> {
    operator: O,
    max_chunk: Option<usize>,
}

impl<O: Operator> LocalEnergyEstimator<O> {
    pub fn new(operator: O) -> Self {
        Self { operator, max_chunk: None }
    }

    /// Bound the number of configurations per model call (default: one call per batch).
    pub fn with_max_chunk(mut self, chunk: usize) -> Self {
        self.max_chunk = Some(chunk);
        self
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub fn local_energies<W: Wavefunction + ?Sized>(
        &self,
        wavefunction: &W,
        batch: &[Configuration],
    ) -> Result<Vec<Complex64>> {
        Ok(self.compute(wavefunction, batch)?.values)
    }

    /// Evaluate the samples and all their connected configurations in one
    /// model pass, then combine the log-amplitude differences.
    pub fn compute<W: Wavefunction + ?Sized>(
        &self,
        wavefunction: &W,
        batch: &[Configuration],
    ) -> Result<LocalEnergies> {
        let n = batch.len();
        let mut inputs: Vec<Configuration> = batch.to_vec();
        // per sample: (coefficient, index into `inputs`)
        let mut terms: Vec<Vec<(Complex64, usize)>> = Vec::with_capacity(n);
        let mut owner: Vec<usize> = (0..n).collect();

        for (i, config) in batch.iter().enumerate() {
            let connections = self.operator.connected_configurations(config)?;
            let mut sample_terms = Vec::with_capacity(connections.len());
            for (connected, coefficient) in connections {
                if connected == *config {
                    sample_terms.push((coefficient, i));
                } else {
                    sample_terms.push((coefficient, inputs.len()));
                    inputs.push(connected);
                    owner.push(i);
                }
            }
            terms.push(sample_terms);
        }

        debug!(samples = n, evaluations = inputs.len(), "local energy model pass");
        let log_psi = evaluate_in_chunks(wavefunction, &inputs, self.max_chunk).map_err(|err| match err {
            VmcError::NumericalInstability { context, index } => {
                VmcError::NumericalInstability { context, index: owner[index] }
            }
            other => other,
        })?;

        let mut values = Vec::with_capacity(n);
        for (i, sample_terms) in terms.iter().enumerate() {
            let reference = log_psi[i];
            let e_loc: Complex64 = sample_terms
                .iter()
                .map(|&(coefficient, k)| coefficient * (log_psi[k] - reference).exp())
                .sum();
            if !e_loc.is_finite() {
                return Err(VmcError::NumericalInstability { context: "local energy", index: i });
            }
            values.push(e_loc);
        }

        Ok(LocalEnergies { values, log_psi: log_psi[..n].to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilbert::HilbertSpace;
    use crate::models::Jastrow;
    use crate::operators::{Heisenberg, Ising};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// NaN whenever site 0 is up.
    struct Broken;

    impl Wavefunction for Broken {
        fn log_amplitudes(&self, batch: &[Configuration]) -> Vec<Complex64> {
            batch
                .iter()
                .map(|s| if s[0] > 0 { Complex64::new(f64::NAN, 0.0) } else { Complex64::new(0.0, 0.0) })
                .collect()
        }
    }

    struct Truncating;

    impl Wavefunction for Truncating {
        fn log_amplitudes(&self, batch: &[Configuration]) -> Vec<Complex64> {
            vec![Complex64::new(0.0, 0.0); batch.len().saturating_sub(1)]
        }
    }

    #[test]
    fn test_invariant_under_global_log_shift() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let hilbert = HilbertSpace::chain(6, true).unwrap();
        let estimator = LocalEnergyEstimator::new(Heisenberg::default().build(hilbert.clone()));
        let model = Jastrow::random(6, true, true, 0.4, &mut rng).unwrap();
        // ψ -> c·ψ with c = exp(3.7 - 1.2i)
        struct Scaled<'a>(&'a Jastrow, Complex64);
        impl Wavefunction for Scaled<'_> {
            fn log_amplitudes(&self, batch: &[Configuration]) -> Vec<Complex64> {
                self.0.log_amplitudes(batch).into_iter().map(|l| l + self.1).collect()
            }
        }
        let scaled = Scaled(&model, Complex64::new(3.7, -1.2));

        let batch: Vec<Configuration> = (0..20).map(|_| hilbert.random_configuration(&mut rng)).collect();
        let a = estimator.local_energies(&model, &batch).unwrap();
        let b = estimator.local_energies(&scaled, &batch).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(x.re, y.re, epsilon = 1e-10);
            assert_relative_eq!(x.im, y.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_uniform_state_ising() {
        // ψ = const: E_loc = diagonal + Σ off-diagonal elements
        let hilbert = HilbertSpace::chain(4, false).unwrap();
        let estimator = LocalEnergyEstimator::new(Ising::new(2.0).build(hilbert));
        let model = Jastrow::product_state(vec![Complex64::new(0.0, 0.0); 4]);
        let up = Configuration::new(vec![1, 1, 1, 1]);
        let e = estimator.local_energies(&model, &[up]).unwrap()[0];
        assert_relative_eq!(e.re, -3.0 - 4.0 * 2.0);
        assert_relative_eq!(e.im, 0.0);
    }

    #[test]
    fn test_chunked_matches_single_pass() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let hilbert = HilbertSpace::new(vec![2, 3], true).unwrap();
        let op = Ising::new(0.9).build(hilbert.clone());
        let model = Jastrow::random(6, true, true, 0.5, &mut rng).unwrap();
        let batch: Vec<Configuration> = (0..9).map(|_| hilbert.random_configuration(&mut rng)).collect();
        let single = LocalEnergyEstimator::new(&op).compute(&model, &batch).unwrap();
        let chunked = LocalEnergyEstimator::new(&op).with_max_chunk(4).compute(&model, &batch).unwrap();
        assert_eq!(single, chunked);
    }

    #[test]
    fn test_nan_short_circuits_batch() {
        let hilbert = HilbertSpace::chain(3, true).unwrap();
        let estimator = LocalEnergyEstimator::new(Ising::new(1.0).build(hilbert));
        // the first sample is fine itself but connects to a NaN configuration
        let batch = vec![Configuration::new(vec![-1, -1, -1]), Configuration::new(vec![-1, 1, -1])];
        let err = estimator.local_energies(&Broken, &batch).unwrap_err();
        assert!(matches!(err, VmcError::NumericalInstability { context: "log-amplitude", index: 0 }));
    }

    #[test]
    fn test_output_size_mismatch() {
        let hilbert = HilbertSpace::chain(3, true).unwrap();
        let estimator = LocalEnergyEstimator::new(Ising::new(1.0).build(hilbert));
        let batch = vec![Configuration::new(vec![-1, -1, -1])];
        assert!(matches!(
            estimator.local_energies(&Truncating, &batch),
            Err(VmcError::ShapeMismatch { .. })
        ));
    }
}
