//! Variational module - turns local energies into a training signal.
//!
//! Both estimators yield [`TrainingBatch`]es with gradient weights
//! wᵢ = 2·pᵢ·conj(E_loc(sᵢ) − Ē). They differ in the centering energy Ē:
//!
//! * `VariationalMonteCarlo` centres on the mean of the batch itself. The
//!   resulting gradient estimate carries an O(1/n) bias from the correlation
//!   between the batch mean and the samples; it is the usual choice at scale.
//! * `ExactVariational` centres on the exact normalized mean over the whole
//!   space, so one full cycle gives the exact gradient.
//!
//! Both centerings are kept as they are; the exact path is the reference the
//! Monte Carlo path is validated against.

mod batch;
mod exact;
mod monte_carlo;

pub use batch::{energy_gradient_loss, TrainingBatch};
pub use exact::ExactVariational;
pub use monte_carlo::VariationalMonteCarlo;

use crate::error::Result;
use crate::estimation::EnergyStats;
use crate::hilbert::HilbertSpace;
use crate::operators::Operator;
use crate::wavefunction::Wavefunction;

pub enum VariationalEstimator<O> {
    Exact(ExactVariational<O>),
    MonteCarlo(VariationalMonteCarlo<O>),
}

impl<O: Operator> VariationalEstimator<O> {
    pub fn next_batch<W: Wavefunction + ?Sized>(&mut self, wavefunction: &W) -> Result<TrainingBatch> {
        match self {
            VariationalEstimator::Exact(e) => e.next_batch(wavefunction),
            VariationalEstimator::MonteCarlo(e) => e.next_batch(wavefunction),
        }
    }

    /// Batches per full pass: ceil(|H| / batch_size) for exact, 1 for Monte Carlo.
    pub fn num_of_batch_until_full_cycle(&self) -> usize {
        match self {
            VariationalEstimator::Exact(e) => e.num_of_batch_until_full_cycle(),
            VariationalEstimator::MonteCarlo(_) => 1,
        }
    }

    pub fn batch_size(&self) -> usize {
        match self {
            VariationalEstimator::Exact(e) => e.batch_size(),
            VariationalEstimator::MonteCarlo(e) => e.batch_size(),
        }
    }

    pub fn hilbert(&self) -> &HilbertSpace {
        match self {
            VariationalEstimator::Exact(e) => e.hilbert(),
            VariationalEstimator::MonteCarlo(e) => e.hilbert(),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, VariationalEstimator::Exact(_))
    }

    pub fn acceptance_rate(&self) -> Option<f64> {
        match self {
            VariationalEstimator::Exact(_) => None,
            VariationalEstimator::MonteCarlo(e) => e.sampler().acceptance_rate(),
        }
    }

    /// Exact statistics of the running cycle (exact estimator only).
    pub fn cycle_stats(&self) -> Option<EnergyStats> {
        match self {
            VariationalEstimator::Exact(e) => e.cycle_stats(),
            VariationalEstimator::MonteCarlo(_) => None,
        }
    }

    /// Pull-based stream of training batches for a fixed wavefunction.
    pub fn stream<'a, W: Wavefunction + ?Sized>(&'a mut self, wavefunction: &'a W) -> TrainingStream<'a, O, W> {
        TrainingStream { estimator: self, wavefunction }
    }
}

impl<O> From<ExactVariational<O>> for VariationalEstimator<O> {
    fn from(estimator: ExactVariational<O>) -> Self {
        VariationalEstimator::Exact(estimator)
    }
}

impl<O> From<VariationalMonteCarlo<O>> for VariationalEstimator<O> {
    fn from(estimator: VariationalMonteCarlo<O>) -> Self {
        VariationalEstimator::MonteCarlo(estimator)
    }
}

/// Endless iterator over training batches; each `next` pulls one batch.
pub struct TrainingStream<'a, O, W: ?Sized> {
    estimator: &'a mut VariationalEstimator<O>,
    wavefunction: &'a W,
}

impl<O: Operator, W: Wavefunction + ?Sized> Iterator for TrainingStream<'_, O, W> {
    type Item = Result<TrainingBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.estimator.next_batch(self.wavefunction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Jastrow;
    use crate::operators::Heisenberg;
    use crate::sampling::ExactSampler;

    #[test]
    fn test_stream_pulls_full_cycles() {
        let hilbert = HilbertSpace::chain(5, true).unwrap();
        let operator = Heisenberg::default().build(hilbert);
        let mut estimator: VariationalEstimator<_> = ExactVariational::new(&operator, 10).unwrap().into();
        assert_eq!(estimator.num_of_batch_until_full_cycle(), 4);
        assert!(estimator.is_exact());

        let model = Jastrow::zeros(5);
        let sizes: Vec<usize> = estimator
            .stream(&model)
            .take(8)
            .map(|batch| batch.map(|b| b.len()))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(sizes, vec![10, 10, 10, 2, 10, 10, 10, 2]);
    }

    #[test]
    fn test_monte_carlo_cycle_is_one_batch() {
        let hilbert = HilbertSpace::chain(5, true).unwrap();
        let operator = Heisenberg::default().build(hilbert.clone());
        let sampler = ExactSampler::new(hilbert, 32, Some(9)).unwrap();
        let mut estimator: VariationalEstimator<_> = VariationalMonteCarlo::new(operator, sampler).into();
        assert_eq!(estimator.num_of_batch_until_full_cycle(), 1);
        assert_eq!(estimator.batch_size(), 32);
        assert!(estimator.acceptance_rate().is_none());
        assert_eq!(estimator.next_batch(&Jastrow::zeros(5)).unwrap().len(), 32);
    }
}
