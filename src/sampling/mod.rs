//! Sampling module - configuration streams distributed as |ψ|².
//!
//! The three strategies form a closed set behind [`Sampler`]; each call to
//! `next_batch` is synchronous and pulls exactly one batch.

mod autoregressive;
mod exact;
mod metropolis;
mod proposal;

pub use autoregressive::AutoregressiveSampler;
pub use exact::ExactSampler;
pub use metropolis::{MetropolisParams, MetropolisSampler, SamplerState};
pub use proposal::Proposal;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::error::Result;
use crate::hilbert::{ConfigurationBatch, HilbertSpace};
use crate::wavefunction::Wavefunction;

/// Deterministic generator for a fixed seed, entropy-seeded otherwise.
pub(crate) fn seeded_rng(seed: Option<u64>) -> ChaCha20Rng {
    match seed {
        Some(s) => ChaCha20Rng::seed_from_u64(s),
        None => ChaCha20Rng::from_entropy(),
    }
}

pub enum Sampler {
    Exact(ExactSampler),
    Metropolis(MetropolisSampler),
    Autoregressive(AutoregressiveSampler),
}

impl Sampler {
    pub fn next_batch<W: Wavefunction + ?Sized>(&mut self, wavefunction: &W) -> Result<ConfigurationBatch> {
        match self {
            Sampler::Exact(s) => s.next_batch(wavefunction),
            Sampler::Metropolis(s) => s.next_batch(wavefunction),
            Sampler::Autoregressive(s) => s.next_batch(wavefunction),
        }
    }

    pub fn batch_size(&self) -> usize {
        match self {
            Sampler::Exact(s) => s.batch_size(),
            Sampler::Metropolis(s) => s.batch_size(),
            Sampler::Autoregressive(s) => s.batch_size(),
        }
    }

    pub fn hilbert(&self) -> &HilbertSpace {
        match self {
            Sampler::Exact(s) => s.hilbert(),
            Sampler::Metropolis(s) => s.hilbert(),
            Sampler::Autoregressive(s) => s.hilbert(),
        }
    }

    /// Lifetime acceptance rate of a Metropolis sampler.
    pub fn acceptance_rate(&self) -> Option<f64> {
        match self {
            Sampler::Metropolis(s) => s.state().map(SamplerState::acceptance_rate),
            _ => None,
        }
    }
}

impl From<ExactSampler> for Sampler {
    fn from(sampler: ExactSampler) -> Self {
        Sampler::Exact(sampler)
    }
}

impl From<MetropolisSampler> for Sampler {
    fn from(sampler: MetropolisSampler) -> Self {
        Sampler::Metropolis(sampler)
    }
}

impl From<AutoregressiveSampler> for Sampler {
    fn from(sampler: AutoregressiveSampler) -> Self {
        Sampler::Autoregressive(sampler)
    }
}
