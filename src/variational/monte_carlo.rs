//! Monte Carlo variational estimator.

use tracing::debug;

use super::batch::TrainingBatch;
use crate::error::Result;
use crate::estimation::{EnergyStats, LocalEnergyEstimator};
use crate::hilbert::HilbertSpace;
use crate::operators::Operator;
use crate::sampling::Sampler;
use crate::wavefunction::Wavefunction;

/// Sampler plus local energies; every batch is centred on its own mean.
pub struct VariationalMonteCarlo<O> {
    estimator: LocalEnergyEstimator<O>,
    sampler: Sampler,
}

impl<O: Operator> VariationalMonteCarlo<O> {
    pub fn new(operator: O, sampler: impl Into<Sampler>) -> Self {
        Self { estimator: LocalEnergyEstimator::new(operator), sampler: sampler.into() }
    }

    /// Bound the number of configurations per model call in the local-energy pass.
    pub fn with_max_chunk(mut self, chunk: usize) -> Self {
        self.estimator = self.estimator.with_max_chunk(chunk);
        self
    }

    pub fn hilbert(&self) -> &HilbertSpace {
        self.estimator.operator().hilbert()
    }

    pub fn operator(&self) -> &O {
        self.estimator.operator()
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut Sampler {
        &mut self.sampler
    }

    pub fn batch_size(&self) -> usize {
        self.sampler.batch_size()
    }

    pub fn next_batch<W: Wavefunction + ?Sized>(&mut self, wavefunction: &W) -> Result<TrainingBatch> {
        let configurations = self.sampler.next_batch(wavefunction)?;
        let local = self.estimator.compute(wavefunction, configurations.configurations())?;
        let stats = EnergyStats::from_samples(&local.values);
        debug!(energy = stats.energy.re, variance = stats.variance, "monte carlo batch");
        Ok(TrainingBatch::new(configurations, local.values, local.log_psi, stats.energy, stats))
    }
}
