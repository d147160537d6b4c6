//! Gradient accumulation with an explicit, checked update frequency.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VmcError};
use crate::operators::Operator;
use crate::variational::VariationalEstimator;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationMode {
    /// Sum the batch gradients (the exact path's batches carry weights summing to 1 per cycle)
    #[default]
    Sum,
    /// Average the batch gradients
    Mean,
}

/// Collects `frequency` batch gradients and releases their combination.
#[derive(Clone, Debug)]
pub struct GradientAccumulator {
    frequency: usize,
    mode: AccumulationMode,
    buffer: Vec<f64>,
    count: usize,
}

impl GradientAccumulator {
    pub fn new(frequency: usize, mode: AccumulationMode) -> Result<Self> {
        if frequency == 0 {
            return Err(VmcError::GradientAccumulationMismatch { required: 1, configured: 0 });
        }
        Ok(Self { frequency, mode, buffer: Vec::new(), count: 0 })
    }

    /// Accumulator updating once per full cycle of `estimator`.
    pub fn for_estimator<O: Operator>(estimator: &VariationalEstimator<O>, mode: AccumulationMode) -> Result<Self> {
        Self::new(estimator.num_of_batch_until_full_cycle(), mode)
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }

    /// An exact estimator only yields the full-space gradient when every
    /// update spans exactly one cycle; Monte Carlo accepts any frequency.
    pub fn check<O: Operator>(&self, estimator: &VariationalEstimator<O>) -> Result<()> {
        let required = estimator.num_of_batch_until_full_cycle();
        if estimator.is_exact() && self.frequency != required {
            return Err(VmcError::GradientAccumulationMismatch { required, configured: self.frequency });
        }
        Ok(())
    }

    /// Add one batch gradient; returns the combined gradient every `frequency` calls.
    pub fn push(&mut self, gradient: &[f64]) -> Result<Option<Vec<f64>>> {
        if self.count == 0 {
            self.buffer = vec![0.0; gradient.len()];
        } else if gradient.len() != self.buffer.len() {
            return Err(VmcError::shape("accumulated gradient", self.buffer.len(), gradient.len()));
        }
        for (b, g) in self.buffer.iter_mut().zip(gradient) {
            *b += g;
        }
        self.count += 1;
        if self.count < self.frequency {
            return Ok(None);
        }

        let mut combined = std::mem::take(&mut self.buffer);
        if self.mode == AccumulationMode::Mean {
            for g in combined.iter_mut() {
                *g /= self.count as f64;
            }
        }
        self.count = 0;
        Ok(Some(combined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilbert::HilbertSpace;
    use crate::operators::Ising;
    use crate::sampling::ExactSampler;
    use crate::variational::{ExactVariational, VariationalMonteCarlo};

    #[test]
    fn test_releases_every_frequency_pushes() {
        let mut sum = GradientAccumulator::new(2, AccumulationMode::Sum).unwrap();
        assert_eq!(sum.push(&[1.0, 2.0]).unwrap(), None);
        assert_eq!(sum.push(&[3.0, 4.0]).unwrap(), Some(vec![4.0, 6.0]));
        assert_eq!(sum.push(&[1.0, 1.0]).unwrap(), None);
        assert!(sum.push(&[1.0]).is_err());

        let mut mean = GradientAccumulator::new(2, AccumulationMode::Mean).unwrap();
        mean.push(&[1.0]).unwrap();
        assert_eq!(mean.push(&[3.0]).unwrap(), Some(vec![2.0]));
        assert!(GradientAccumulator::new(0, AccumulationMode::Sum).is_err());
    }

    #[test]
    fn test_exact_frequency_must_match_cycle() {
        let hilbert = HilbertSpace::chain(5, true).unwrap();
        let operator = Ising::new(1.0).build(hilbert.clone());
        let exact: VariationalEstimator<_> = ExactVariational::new(&operator, 8).unwrap().into();

        let wrong = GradientAccumulator::new(1, AccumulationMode::Sum).unwrap();
        assert!(matches!(
            wrong.check(&exact),
            Err(VmcError::GradientAccumulationMismatch { required: 4, configured: 1 })
        ));
        let right = GradientAccumulator::for_estimator(&exact, AccumulationMode::Sum).unwrap();
        assert!(right.check(&exact).is_ok());

        let sampler = ExactSampler::new(hilbert, 8, Some(0)).unwrap();
        let vmc: VariationalEstimator<_> = VariationalMonteCarlo::new(&operator, sampler).into();
        assert!(wrong.check(&vmc).is_ok());
    }
}
