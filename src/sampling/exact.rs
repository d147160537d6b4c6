//! Sampling directly from the exact |ψ|² distribution.
//!
//! Only practical for small spaces; used to validate the Monte Carlo path.

use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, WeightedAliasIndex};
use tracing::debug;

use super::seeded_rng;
use crate::error::{Result, VmcError};
use crate::estimation::ExactDistribution;
use crate::hilbert::{Configuration, ConfigurationBatch, HilbertSpace};
use crate::wavefunction::Wavefunction;

pub struct ExactSampler {
    hilbert: HilbertSpace,
    batch_size: usize,
    states: Vec<Configuration>,
    rng: ChaCha20Rng,
}

impl ExactSampler {
    pub fn new(hilbert: HilbertSpace, batch_size: usize, seed: Option<u64>) -> Result<Self> {
        if batch_size == 0 {
            return Err(VmcError::InvalidSamplerConfig("batch size must be positive".into()));
        }
        let states = hilbert.all_configurations()?.collect();
        Ok(Self { hilbert, batch_size, states, rng: seeded_rng(seed) })
    }

    pub fn hilbert(&self) -> &HilbertSpace {
        &self.hilbert
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Independent draws from |ψ|²/Z, recomputed for the current parameters.
    pub fn next_batch<W: Wavefunction + ?Sized>(&mut self, wavefunction: &W) -> Result<ConfigurationBatch> {
        let distribution = ExactDistribution::compute(wavefunction, &self.states, Some(self.batch_size))?;
        let alias = WeightedAliasIndex::new(distribution.probabilities)
            .map_err(|_| VmcError::NumericalInstability { context: "exact distribution weights", index: 0 })?;
        let configurations = (0..self.batch_size)
            .map(|_| self.states[alias.sample(&mut self.rng)].clone())
            .collect();
        debug!(batch_size = self.batch_size, states = self.states.len(), "exact sampler batch");
        Ok(ConfigurationBatch::new(configurations))
    }
}
