//! Periodic evaluation of the model on a separate estimator while training.

use tracing::debug;

use crate::error::{Result, VmcError};
use crate::evaluation::{default_callbacks, Evaluator, Metrics, MetricsSink};
use crate::operators::Operator;
use crate::variational::VariationalEstimator;
use crate::wavefunction::Wavefunction;

/// Prefix of every metric key reported by a [`Validation`].
pub const VALIDATION_PREFIX: &str = "validation/";

/// A held-out estimator evaluated every `every` training iterations.
///
/// Metrics land in the training sink under `validation/<key>`, at the step
/// of the iteration they were taken before.
pub struct Validation<'a, O: Operator> {
    estimator: &'a mut VariationalEstimator<O>,
    evaluator: Evaluator,
    every: usize,
}

impl<'a, O: Operator> Validation<'a, O> {
    pub fn new(estimator: &'a mut VariationalEstimator<O>, evaluator: Evaluator, every: usize) -> Result<Self> {
        if every == 0 {
            return Err(VmcError::Config("validation interval must be positive".into()));
        }
        Ok(Self { estimator, evaluator, every })
    }

    /// `steps` batches of the default callbacks; a full cycle for exact estimators.
    pub fn with_default_callbacks(
        estimator: &'a mut VariationalEstimator<O>,
        steps: usize,
        every: usize,
        true_ground_state_energy: Option<f64>,
    ) -> Result<Self> {
        let exact = estimator.is_exact();
        let evaluator = if exact { Evaluator::full_cycle() } else { Evaluator::new(steps) };
        let evaluator = evaluator.with_callbacks(default_callbacks(exact, true_ground_state_energy));
        Self::new(estimator, evaluator, every)
    }

    pub fn every(&self) -> usize {
        self.every
    }

    pub(crate) fn is_due(&self, iteration: usize) -> bool {
        iteration % self.every == 0
    }

    pub(crate) fn record<W: Wavefunction + ?Sized>(
        &mut self,
        iteration: usize,
        wavefunction: &W,
        sink: &mut dyn MetricsSink,
    ) -> Result<()> {
        let metrics = self.evaluator.run(&mut *self.estimator, wavefunction)?;
        let prefixed: Metrics =
            metrics.into_iter().map(|(key, value)| (format!("{}{}", VALIDATION_PREFIX, key), value)).collect();
        debug!(iteration, metrics = prefixed.len(), "validation");
        sink.record(iteration, &prefixed);
        Ok(())
    }
}
