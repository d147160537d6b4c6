//! Evaluation module - drives an estimator without updating parameters and
//! reports named scalar metrics.
//!
//! Exact and Monte Carlo runs aggregate through the same code: every sample
//! enters one [`EnergyAccumulator`] with its probability weight (1/n per
//! Monte Carlo batch, |ψ|²/Z over an exact cycle).

mod callbacks;
mod sink;

pub use callbacks::{
    default_callbacks, AcceptanceRate, EvaluationCallback, EvaluationSummary, ExactLocalEnergy, GroundStateError,
    LocalEnergyStats, ACCEPTANCE_RATE, AUTOCORRELATION_TIME, BLOCKED_ERROR, ENERGY, IMAGINARY_ENERGY,
    LOCAL_ENERGY_VARIANCE, RELATIVE_ERROR, STD_ERROR,
};
pub use sink::{MetricsHistory, MetricsSink, TracingSink};

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{Result, VmcError};
use crate::estimation::EnergyAccumulator;
use crate::operators::Operator;
use crate::variational::VariationalEstimator;
use crate::wavefunction::Wavefunction;

/// Metric name to value, e.g. `energy/energy`.
pub type Metrics = BTreeMap<String, f64>;

/// A fixed number of estimator steps plus the callbacks reporting on them.
pub struct Evaluator {
    /// `None` runs exactly one full cycle of the estimator
    steps: Option<usize>,
    callbacks: Vec<Box<dyn EvaluationCallback>>,
}

impl Evaluator {
    pub fn new(steps: usize) -> Self {
        Self { steps: Some(steps), callbacks: Vec::new() }
    }

    /// Evaluator running one full cycle of the estimator.
    pub fn full_cycle() -> Self {
        Self { steps: None, callbacks: Vec::new() }
    }

    pub fn with_callback(mut self, callback: impl EvaluationCallback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn with_callbacks(mut self, callbacks: Vec<Box<dyn EvaluationCallback>>) -> Self {
        self.callbacks.extend(callbacks);
        self
    }

    pub fn run<O: Operator, W: Wavefunction + ?Sized>(
        &mut self,
        estimator: &mut VariationalEstimator<O>,
        wavefunction: &W,
    ) -> Result<Metrics> {
        let steps = match self.steps {
            Some(0) => return Err(VmcError::Config("evaluation needs at least one step".into())),
            Some(steps) => steps,
            None => {
                if let VariationalEstimator::Exact(exact) = estimator {
                    exact.reset_cycle();
                }
                estimator.num_of_batch_until_full_cycle()
            }
        };

        let mut acc = EnergyAccumulator::default();
        let mut step_energies = Vec::with_capacity(steps);
        for _ in 0..steps {
            let batch = estimator.next_batch(wavefunction)?;
            for (i, &e) in batch.local_energies.iter().enumerate() {
                acc.push(e, batch.configurations.weight(i));
            }
            step_energies.push(batch.stats.energy.re);
        }

        let summary = EvaluationSummary {
            stats: acc.stats(),
            step_energies,
            exact_stats: estimator.cycle_stats(),
            acceptance_rate: estimator.acceptance_rate(),
        };
        let mut metrics = Metrics::new();
        for callback in self.callbacks.iter_mut() {
            callback.on_evaluation_end(&summary, &mut metrics)?;
        }
        info!(steps, samples = summary.stats.n_samples, energy = summary.stats.energy.re, "evaluation finished");
        Ok(metrics)
    }
}

/// Run `steps` estimator steps and report through `callbacks`.
pub fn evaluate<O: Operator, W: Wavefunction + ?Sized>(
    estimator: &mut VariationalEstimator<O>,
    wavefunction: &W,
    steps: usize,
    callbacks: Vec<Box<dyn EvaluationCallback>>,
) -> Result<Metrics> {
    Evaluator::new(steps).with_callbacks(callbacks).run(estimator, wavefunction)
}

/// Run exactly one full cycle of an exact estimator, from its first batch.
pub fn exact_evaluate<O: Operator, W: Wavefunction + ?Sized>(
    estimator: &mut VariationalEstimator<O>,
    wavefunction: &W,
    callbacks: Vec<Box<dyn EvaluationCallback>>,
) -> Result<Metrics> {
    if !estimator.is_exact() {
        return Err(VmcError::Config("exact evaluation requires the exact estimator".into()));
    }
    Evaluator::full_cycle().with_callbacks(callbacks).run(estimator, wavefunction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilbert::HilbertSpace;
    use crate::models::Jastrow;
    use crate::operators::Ising;
    use crate::sampling::{MetropolisParams, MetropolisSampler};
    use crate::variational::{ExactVariational, VariationalMonteCarlo};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_exact_evaluation_matches_cycle_stats() {
        let hilbert = HilbertSpace::chain(6, false).unwrap();
        let mut estimator: VariationalEstimator<_> =
            ExactVariational::new(Ising::new(1.5).build(hilbert), 20).unwrap().into();
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let model = Jastrow::random(6, true, false, 0.4, &mut rng).unwrap();

        // start mid-cycle; exact evaluation must still cover the whole space once
        estimator.next_batch(&model).unwrap();
        let exact = exact_evaluate(&mut estimator, &model, vec![Box::new(ExactLocalEnergy)]).unwrap();
        let sampled_path = Evaluator::full_cycle()
            .with_callback(LocalEnergyStats)
            .run(&mut estimator, &model)
            .unwrap();
        assert_relative_eq!(exact[ENERGY], sampled_path[ENERGY], epsilon = 1e-10);
        assert_relative_eq!(exact[LOCAL_ENERGY_VARIANCE], sampled_path[LOCAL_ENERGY_VARIANCE], epsilon = 1e-10);
    }

    #[test]
    fn test_monte_carlo_evaluation_reports_acceptance() {
        let hilbert = HilbertSpace::chain(6, true).unwrap();
        let params = MetropolisParams::new().with_batch_size(32).with_n_chains(8).with_burn_in(10).with_seed(2);
        let sampler = MetropolisSampler::new(hilbert.clone(), params).unwrap();
        let mut estimator: VariationalEstimator<_> =
            VariationalMonteCarlo::new(Ising::new(1.0).build(hilbert), sampler).into();
        let model = Jastrow::zeros(6);

        let metrics = evaluate(&mut estimator, &model, 10, default_callbacks(false, None)).unwrap();
        assert!(metrics.contains_key(ENERGY));
        assert!(metrics.contains_key(BLOCKED_ERROR));
        let rate = metrics[ACCEPTANCE_RATE];
        assert!(rate > 0.0 && rate <= 1.0);

        assert!(exact_evaluate(&mut estimator, &model, Vec::new()).is_err());
        assert!(evaluate(&mut estimator, &model, 0, Vec::new()).is_err());
    }
}
