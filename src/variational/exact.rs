//! Exact variational estimator over the fully enumerated Hilbert space.
//!
//! The space is walked in fixed batches in enumeration order. At the start
//! of every cycle the whole distribution |ψ|²/Z and all local energies are
//! computed for the current parameters, and the exact mean is used for
//! centering. A cycle is `num_of_batch_until_full_cycle` batches; the
//! probability weights of one cycle sum to 1, so summing the batch gradients
//! of exactly one cycle gives the full-space gradient.

use num_complex::Complex64;
use tracing::{debug, info};

use super::batch::TrainingBatch;
use crate::error::{Result, VmcError};
use crate::estimation::{normalized_probabilities, EnergyAccumulator, EnergyStats, LocalEnergyEstimator};
use crate::hilbert::{Configuration, ConfigurationBatch, HilbertSpace};
use crate::operators::Operator;
use crate::wavefunction::Wavefunction;

/// Full-space quantities of the current cycle.
#[derive(Clone, Debug)]
struct Cycle {
    probabilities: Vec<f64>,
    local_energies: Vec<Complex64>,
    log_psi: Vec<Complex64>,
    stats: EnergyStats,
}

pub struct ExactVariational<O> {
    estimator: LocalEnergyEstimator<O>,
    batch_size: usize,
    states: Vec<Configuration>,
    position: usize,
    cycle: Option<Cycle>,
}

impl<O: Operator> ExactVariational<O> {
    pub fn new(operator: O, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(VmcError::InvalidSamplerConfig("batch size must be positive".into()));
        }
        let states: Vec<Configuration> = operator.hilbert().all_configurations()?.collect();
        let estimator = LocalEnergyEstimator::new(operator).with_max_chunk(batch_size);
        Ok(Self { estimator, batch_size, states, position: 0, cycle: None })
    }

    pub fn hilbert(&self) -> &HilbertSpace {
        self.estimator.operator().hilbert()
    }

    pub fn operator(&self) -> &O {
        self.estimator.operator()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// ceil(|H| / batch_size)
    pub fn num_of_batch_until_full_cycle(&self) -> usize {
        (self.states.len() + self.batch_size - 1) / self.batch_size
    }

    /// Exact statistics of the current cycle, once one has started.
    pub fn cycle_stats(&self) -> Option<EnergyStats> {
        self.cycle.as_ref().map(|c| c.stats)
    }

    /// Start over at the first batch, recomputing the distribution.
    pub fn reset_cycle(&mut self) {
        self.position = 0;
        self.cycle = None;
    }

    fn start_cycle<W: Wavefunction + ?Sized>(&self, wavefunction: &W) -> Result<Cycle> {
        let local = self.estimator.compute(wavefunction, &self.states)?;
        let probabilities = normalized_probabilities(&local.log_psi);
        let mut acc = EnergyAccumulator::default();
        for (&e, &p) in local.values.iter().zip(&probabilities) {
            acc.push(e, p);
        }
        let stats = acc.stats();
        info!(
            energy = stats.energy.re,
            variance = stats.variance,
            states = self.states.len(),
            "exact cycle"
        );
        Ok(Cycle { probabilities, local_energies: local.values, log_psi: local.log_psi, stats })
    }

    /// Next batch of the enumeration; the last batch of a cycle may be short.
    pub fn next_batch<W: Wavefunction + ?Sized>(&mut self, wavefunction: &W) -> Result<TrainingBatch> {
        let cycle = match self.cycle.take() {
            Some(cycle) if self.position != 0 => cycle,
            _ => {
                self.position = 0;
                self.start_cycle(wavefunction)?
            }
        };

        let start = self.position * self.batch_size;
        let end = (start + self.batch_size).min(self.states.len());
        let configurations = ConfigurationBatch::with_weights(
            self.states[start..end].to_vec(),
            cycle.probabilities[start..end].to_vec(),
        )?;
        let batch = TrainingBatch::new(
            configurations,
            cycle.local_energies[start..end].to_vec(),
            cycle.log_psi[start..end].to_vec(),
            cycle.stats.energy,
            cycle.stats,
        );
        debug!(batch = self.position, size = end - start, "exact batch");

        self.cycle = Some(cycle);
        self.position += 1;
        if self.position == self.num_of_batch_until_full_cycle() {
            self.position = 0;
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Jastrow;
    use crate::operators::Heisenberg;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashSet;

    fn setup() -> (ExactVariational<crate::operators::LatticeHamiltonian>, Jastrow) {
        let hilbert = HilbertSpace::chain(7, true).unwrap();
        let operator = Heisenberg::default().build(hilbert);
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        let model = Jastrow::random(7, true, true, 0.3, &mut rng).unwrap();
        (ExactVariational::new(operator, 50).unwrap(), model)
    }

    #[test]
    fn test_cycle_visits_every_state_once() {
        let (mut exact, model) = setup();
        assert_eq!(exact.num_of_batch_until_full_cycle(), 3);
        let mut seen = HashSet::new();
        let mut sizes = Vec::new();
        let mut total_weight = 0.0;
        for _ in 0..exact.num_of_batch_until_full_cycle() {
            let batch = exact.next_batch(&model).unwrap();
            sizes.push(batch.len());
            for (i, config) in batch.configurations.iter().enumerate() {
                assert!(seen.insert(config.clone()));
                total_weight += batch.configurations.weight(i);
            }
        }
        assert_eq!(seen.len(), 128);
        assert_eq!(sizes, vec![50, 50, 28]);
        assert_relative_eq!(total_weight, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_centered_on_exact_mean() {
        let (mut exact, model) = setup();
        let mut weighted_deviation = Complex64::new(0.0, 0.0);
        for _ in 0..exact.num_of_batch_until_full_cycle() {
            let batch = exact.next_batch(&model).unwrap();
            // Σ wᵢ/2 = Σ pᵢ conj(Eᵢ - Ē) over the cycle vanishes
            weighted_deviation += batch.weights.iter().sum::<Complex64>() / 2.0;
        }
        assert_relative_eq!(weighted_deviation.re, 0.0, epsilon = 1e-10);
        assert_relative_eq!(weighted_deviation.im, 0.0, epsilon = 1e-10);
        // next call starts a new cycle at the first batch
        assert_eq!(exact.next_batch(&model).unwrap().len(), 50);
    }

    #[test]
    fn test_exact_energy_matches_dense_expectation() {
        let hilbert = HilbertSpace::chain(4, true).unwrap();
        let operator = Heisenberg::default().build(hilbert.clone());
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let model = Jastrow::random(4, true, false, 0.5, &mut rng).unwrap();

        // ⟨ψ|H|ψ⟩ / ⟨ψ|ψ⟩ from the dense matrix
        let states: Vec<Configuration> = hilbert.all_configurations().unwrap().collect();
        let psi: Vec<Complex64> = model.log_amplitudes(&states).iter().map(|l| l.exp()).collect();
        let mut numerator = Complex64::new(0.0, 0.0);
        for (i, s) in states.iter().enumerate() {
            for (t, c) in operator.connected_configurations(s).unwrap() {
                let j = hilbert.configuration_to_index(&t);
                numerator += psi[i].conj() * c * psi[j];
            }
        }
        let norm: f64 = psi.iter().map(|p| p.norm_sqr()).sum();

        let mut exact = ExactVariational::new(operator, 16).unwrap();
        exact.next_batch(&model).unwrap();
        let stats = exact.cycle_stats().unwrap();
        assert_relative_eq!(stats.energy.re, numerator.re / norm, epsilon = 1e-10);
        assert_relative_eq!(stats.energy.im, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rejects_zero_batch() {
        let hilbert = HilbertSpace::chain(3, true).unwrap();
        assert!(ExactVariational::new(Heisenberg::default().build(hilbert), 0).is_err());
    }
}
