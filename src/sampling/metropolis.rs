//! Metropolis-Hastings sampling of |ψ|² with local moves.
//!
//! Several independent chains advance in lock step so every step costs one
//! batched wavefunction call. Acceptance uses min(1, |ψ(s')/ψ(s)|²) computed
//! from log-amplitude differences, never from normalized amplitudes.

use num_complex::Complex64;
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::proposal::Proposal;
use super::seeded_rng;
use crate::error::{Result, VmcError};
use crate::hilbert::{Bond, Configuration, ConfigurationBatch, HilbertSpace};
use crate::wavefunction::{evaluate_log_amplitudes, Wavefunction};

/// Acceptance rate below which a batch logs a warning.
const LOW_ACCEPTANCE: f64 = 0.01;

/// Parameters for the Metropolis sampler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetropolisParams {
    /// Configurations per batch; a multiple of `n_chains`
    pub batch_size: usize,
    /// Number of independent chains
    pub n_chains: usize,
    /// Steps discarded before the first batch
    pub burn_in: usize,
    /// Steps discarded between two recorded samples of a chain
    pub decorrelation: usize,
    #[serde(default)]
    pub proposal: Proposal,
    /// Fixed seed for reproducible trajectories
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MetropolisParams {
    fn default() -> Self {
        Self {
            batch_size: 1024,
            n_chains: 16,
            burn_in: 100,
            decorrelation: 2,
            proposal: Proposal::SingleFlip,
            seed: None,
        }
    }
}

impl MetropolisParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn with_n_chains(mut self, n: usize) -> Self {
        self.n_chains = n;
        self
    }

    pub fn with_burn_in(mut self, n: usize) -> Self {
        self.burn_in = n;
        self
    }

    pub fn with_decorrelation(mut self, n: usize) -> Self {
        self.decorrelation = n;
        self
    }

    pub fn with_proposal(mut self, proposal: Proposal) -> Self {
        self.proposal = proposal;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Chain configurations and acceptance bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerState {
    pub chains: Vec<Configuration>,
    pub log_psi: Vec<Complex64>,
    pub proposed: u64,
    pub accepted: u64,
    pub thermalized: bool,
}

impl SamplerState {
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }
}

pub struct MetropolisSampler {
    hilbert: HilbertSpace,
    params: MetropolisParams,
    bonds: Vec<Bond>,
    rng: ChaCha20Rng,
    state: Option<SamplerState>,
}

impl MetropolisSampler {
    /// Validates the parameters; chains are initialized lazily on the first batch.
    pub fn new(hilbert: HilbertSpace, params: MetropolisParams) -> Result<Self> {
        if params.batch_size == 0 {
            return Err(VmcError::InvalidSamplerConfig("batch size must be positive".into()));
        }
        if params.n_chains == 0 {
            return Err(VmcError::InvalidSamplerConfig("at least one chain is required".into()));
        }
        if params.batch_size % params.n_chains != 0 {
            return Err(VmcError::InvalidSamplerConfig(format!(
                "batch size {} is not a multiple of {} chains",
                params.batch_size, params.n_chains
            )));
        }
        let bonds = hilbert.bonds();
        match params.proposal {
            Proposal::MultiFlip { n } if n == 0 || n > hilbert.n_sites() => {
                return Err(VmcError::InvalidSamplerConfig(format!(
                    "cannot flip {} of {} sites",
                    n,
                    hilbert.n_sites()
                )));
            }
            Proposal::Exchange if bonds.is_empty() => {
                return Err(VmcError::InvalidSamplerConfig("exchange moves need lattice bonds".into()));
            }
            _ => {}
        }
        let rng = seeded_rng(params.seed);
        Ok(Self { hilbert, params, bonds, rng, state: None })
    }

    pub fn hilbert(&self) -> &HilbertSpace {
        &self.hilbert
    }

    pub fn params(&self) -> &MetropolisParams {
        &self.params
    }

    pub fn batch_size(&self) -> usize {
        self.params.batch_size
    }

    pub fn state(&self) -> Option<&SamplerState> {
        self.state.as_ref()
    }

    /// Drop the chains; the next batch starts from fresh random chains and
    /// burns in again. The random stream continues.
    pub fn restart(&mut self) {
        self.state = None;
    }

    fn initialize<W: Wavefunction + ?Sized>(&mut self, wavefunction: &W) -> Result<SamplerState> {
        let chains: Vec<Configuration> = (0..self.params.n_chains)
            .map(|_| match self.params.proposal {
                Proposal::Exchange => self.hilbert.random_balanced_configuration(&mut self.rng),
                _ => self.hilbert.random_configuration(&mut self.rng),
            })
            .collect();
        let log_psi = evaluate_log_amplitudes(wavefunction, &chains)?;
        Ok(SamplerState { chains, log_psi, proposed: 0, accepted: 0, thermalized: false })
    }

    /// One proposal per chain, all chains evaluated in one call.
    fn step<W: Wavefunction + ?Sized>(
        rng: &mut ChaCha20Rng,
        proposal: Proposal,
        bonds: &[Bond],
        state: &mut SamplerState,
        wavefunction: &W,
    ) -> Result<()> {
        let proposals: Vec<Configuration> = state
            .chains
            .iter()
            .map(|chain| proposal.propose(chain, bonds, rng))
            .collect();
        let new_log_psi = evaluate_log_amplitudes(wavefunction, &proposals)?;

        for (k, (candidate, new_value)) in proposals.into_iter().zip(new_log_psi).enumerate() {
            let acceptance_ratio = (2.0 * (new_value.re - state.log_psi[k].re)).exp();
            state.proposed += 1;
            if rng.gen::<f64>() < acceptance_ratio {
                state.chains[k] = candidate;
                state.log_psi[k] = new_value;
                state.accepted += 1;
            }
        }
        Ok(())
    }

    /// Next `batch_size` samples, ordered round by round over the chains.
    ///
    /// A failed batch leaves the chains and counters as they were before it.
    pub fn next_batch<W: Wavefunction + ?Sized>(&mut self, wavefunction: &W) -> Result<ConfigurationBatch> {
        let previous = self.state.clone();
        let mut state = match self.state.take() {
            Some(state) => state,
            None => self.initialize(wavefunction)?,
        };
        match self.advance(&mut state, wavefunction) {
            Ok(configurations) => {
                self.state = Some(state);
                Ok(ConfigurationBatch::new(configurations))
            }
            Err(err) => {
                warn!(error = %err, "metropolis batch failed, keeping the previous chains");
                self.state = previous;
                Err(err)
            }
        }
    }

    fn advance<W: Wavefunction + ?Sized>(
        &mut self,
        state: &mut SamplerState,
        wavefunction: &W,
    ) -> Result<Vec<Configuration>> {
        // parameters may have changed since the chains were last evaluated
        state.log_psi = evaluate_log_amplitudes(wavefunction, &state.chains)?;

        let proposal = self.params.proposal;
        if !state.thermalized {
            for _ in 0..self.params.burn_in {
                Self::step(&mut self.rng, proposal, &self.bonds, state, wavefunction)?;
            }
            state.thermalized = true;
            debug!(steps = self.params.burn_in, acceptance = state.acceptance_rate(), "burn-in finished");
        }

        let (proposed, accepted) = (state.proposed, state.accepted);
        let rounds = self.params.batch_size / self.params.n_chains;
        let mut configurations = Vec::with_capacity(self.params.batch_size);
        for _ in 0..rounds {
            for _ in 0..=self.params.decorrelation {
                Self::step(&mut self.rng, proposal, &self.bonds, state, wavefunction)?;
            }
            configurations.extend(state.chains.iter().cloned());
        }

        let batch_acceptance = (state.accepted - accepted) as f64 / (state.proposed - proposed).max(1) as f64;
        if batch_acceptance < LOW_ACCEPTANCE {
            warn!(acceptance = batch_acceptance, "metropolis acceptance rate is very low");
        }
        debug!(batch_size = configurations.len(), acceptance = batch_acceptance, "metropolis batch");
        Ok(configurations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Jastrow;
    use rand::SeedableRng;
    use std::cell::Cell;

    /// Jastrow whose amplitudes turn to NaN while `broken` is set.
    struct FlakyJastrow {
        model: Jastrow,
        broken: Cell<bool>,
    }

    impl Wavefunction for FlakyJastrow {
        fn log_amplitudes(&self, batch: &[Configuration]) -> Vec<Complex64> {
            if self.broken.get() {
                vec![Complex64::new(f64::NAN, 0.0); batch.len()]
            } else {
                self.model.log_amplitudes(batch)
            }
        }
    }

    fn model() -> Jastrow {
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        Jastrow::random(8, true, true, 0.3, &mut rng).unwrap()
    }

    #[test]
    fn test_rejects_bad_params() {
        let hilbert = HilbertSpace::chain(8, true).unwrap();
        let bad = [
            MetropolisParams::new().with_batch_size(0),
            MetropolisParams::new().with_n_chains(0),
            MetropolisParams::new().with_batch_size(100).with_n_chains(16),
            MetropolisParams::new().with_proposal(Proposal::MultiFlip { n: 9 }),
        ];
        for params in bad {
            assert!(matches!(
                MetropolisSampler::new(hilbert.clone(), params),
                Err(VmcError::InvalidSamplerConfig(_))
            ));
        }
        let single_site = HilbertSpace::chain(1, true).unwrap();
        let exchange = MetropolisParams::new().with_proposal(Proposal::Exchange);
        assert!(MetropolisSampler::new(single_site, exchange).is_err());
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let hilbert = HilbertSpace::chain(8, true).unwrap();
        let params = MetropolisParams::new()
            .with_batch_size(64)
            .with_n_chains(8)
            .with_burn_in(20)
            .with_decorrelation(1)
            .with_seed(1234);
        let wfn = model();

        let run = || {
            let mut sampler = MetropolisSampler::new(hilbert.clone(), params.clone()).unwrap();
            let batches: Vec<ConfigurationBatch> =
                (0..3).map(|_| sampler.next_batch(&wfn).unwrap()).collect();
            (batches, sampler.state().cloned().unwrap())
        };
        let (batches_a, state_a) = run();
        let (batches_b, state_b) = run();
        assert_eq!(batches_a, batches_b);
        assert_eq!(state_a, state_b);
        // burn-in plus 3 batches of 8 rounds, 2 steps each, 8 chains
        assert_eq!(state_a.proposed, (20 + 3 * 8 * 2) * 8);
        assert!(state_a.accepted > 0 && state_a.accepted < state_a.proposed);
    }

    #[test]
    fn test_exchange_conserves_magnetization() {
        let hilbert = HilbertSpace::chain(8, true).unwrap();
        let params = MetropolisParams::new()
            .with_batch_size(32)
            .with_n_chains(4)
            .with_proposal(Proposal::Exchange)
            .with_seed(3);
        let mut sampler = MetropolisSampler::new(hilbert, params).unwrap();
        let batch = sampler.next_batch(&model()).unwrap();
        assert_eq!(batch.len(), 32);
        assert!(batch.iter().all(|c| c.magnetization() == 0));
    }

    #[test]
    fn test_restart_reinitializes_chains() {
        let hilbert = HilbertSpace::chain(8, true).unwrap();
        let params = MetropolisParams::new().with_batch_size(8).with_n_chains(8).with_burn_in(5).with_seed(1);
        let mut sampler = MetropolisSampler::new(hilbert, params).unwrap();
        assert!(sampler.state().is_none());
        sampler.next_batch(&model()).unwrap();
        assert!(sampler.state().unwrap().thermalized);
        sampler.restart();
        assert!(sampler.state().is_none());
        sampler.next_batch(&model()).unwrap();
        assert_eq!(sampler.state().unwrap().proposed, (5 + 3) * 8);
    }

    #[test]
    fn test_failed_batch_keeps_chains() {
        let hilbert = HilbertSpace::chain(8, true).unwrap();
        let params = MetropolisParams::new()
            .with_batch_size(16)
            .with_n_chains(8)
            .with_burn_in(5)
            .with_decorrelation(0)
            .with_seed(4);
        let mut sampler = MetropolisSampler::new(hilbert, params).unwrap();
        let wfn = FlakyJastrow { model: model(), broken: Cell::new(false) };

        sampler.next_batch(&wfn).unwrap();
        let before = sampler.state().cloned().unwrap();

        wfn.broken.set(true);
        assert!(matches!(sampler.next_batch(&wfn), Err(VmcError::NumericalInstability { .. })));
        assert_eq!(sampler.state(), Some(&before));

        // no second burn-in: two rounds of one step on eight chains
        wfn.broken.set(false);
        assert_eq!(sampler.next_batch(&wfn).unwrap().len(), 16);
        let after = sampler.state().unwrap();
        assert!(after.thermalized);
        assert_eq!(after.proposed, before.proposed + 2 * 8);
    }

    #[test]
    fn test_failed_first_batch_leaves_no_state() {
        let hilbert = HilbertSpace::chain(8, true).unwrap();
        let params = MetropolisParams::new().with_batch_size(8).with_n_chains(8).with_seed(5);
        let mut sampler = MetropolisSampler::new(hilbert, params).unwrap();
        let wfn = FlakyJastrow { model: model(), broken: Cell::new(true) };
        assert!(sampler.next_batch(&wfn).is_err());
        assert!(sampler.state().is_none());
    }
}
