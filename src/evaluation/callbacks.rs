//! Evaluation callbacks turning an evaluation summary into named metrics.

use crate::error::{Result, VmcError};
use crate::estimation::{autocorrelation_time, blocking_error, EnergyStats};

use super::Metrics;

pub const ENERGY: &str = "energy/energy";
pub const LOCAL_ENERGY_VARIANCE: &str = "energy/local_energy_variance";
pub const STD_ERROR: &str = "energy/std_error";
pub const IMAGINARY_ENERGY: &str = "energy/imaginary_energy";
pub const AUTOCORRELATION_TIME: &str = "energy/autocorrelation_time";
pub const BLOCKED_ERROR: &str = "energy/blocked_error";
pub const RELATIVE_ERROR: &str = "energy/relative_error";
pub const ACCEPTANCE_RATE: &str = "sampler/acceptance_rate";

/// Minimum number of steps for a step-series autocorrelation analysis.
const MIN_SERIES: usize = 8;

/// What an evaluation run produced, handed to every callback.
#[derive(Clone, Debug)]
pub struct EvaluationSummary {
    /// Statistics over all evaluated samples, weighted by their probabilities
    pub stats: EnergyStats,
    /// Mean energy of each step
    pub step_energies: Vec<f64>,
    /// Exact full-space statistics, when the estimator is exact
    pub exact_stats: Option<EnergyStats>,
    pub acceptance_rate: Option<f64>,
}

pub trait EvaluationCallback {
    fn on_evaluation_end(&mut self, summary: &EvaluationSummary, metrics: &mut Metrics) -> Result<()>;
}

fn insert_stats(metrics: &mut Metrics, stats: &EnergyStats) {
    metrics.insert(ENERGY.to_string(), stats.energy.re);
    metrics.insert(IMAGINARY_ENERGY.to_string(), stats.energy.im);
    metrics.insert(LOCAL_ENERGY_VARIANCE.to_string(), stats.variance);
}

/// Sampled energy, variance and error bars.
///
/// Runs long enough for a step series also report the autocorrelation time
/// of the step energies and the blocked standard error of their mean.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalEnergyStats;

impl EvaluationCallback for LocalEnergyStats {
    fn on_evaluation_end(&mut self, summary: &EvaluationSummary, metrics: &mut Metrics) -> Result<()> {
        insert_stats(metrics, &summary.stats);
        metrics.insert(STD_ERROR.to_string(), summary.stats.std_error);
        if summary.step_energies.len() >= MIN_SERIES {
            let tau = autocorrelation_time(&summary.step_energies);
            metrics.insert(AUTOCORRELATION_TIME.to_string(), tau);
            metrics.insert(BLOCKED_ERROR.to_string(), blocking_error(&summary.step_energies, tau));
        }
        Ok(())
    }
}

/// Exact energy and variance of the full enumeration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactLocalEnergy;

impl EvaluationCallback for ExactLocalEnergy {
    fn on_evaluation_end(&mut self, summary: &EvaluationSummary, metrics: &mut Metrics) -> Result<()> {
        let stats = summary
            .exact_stats
            .ok_or_else(|| VmcError::Config("exact local energy requires the exact estimator".into()))?;
        insert_stats(metrics, &stats);
        Ok(())
    }
}

/// Relative distance |E − E₀| / |E₀| to a known ground-state energy.
#[derive(Clone, Copy, Debug)]
pub struct GroundStateError {
    pub true_ground_state_energy: f64,
}

impl GroundStateError {
    pub fn new(true_ground_state_energy: f64) -> Self {
        Self { true_ground_state_energy }
    }
}

impl EvaluationCallback for GroundStateError {
    fn on_evaluation_end(&mut self, summary: &EvaluationSummary, metrics: &mut Metrics) -> Result<()> {
        if self.true_ground_state_energy == 0.0 {
            return Err(VmcError::Config("relative error against a zero ground-state energy".into()));
        }
        let energy = summary.exact_stats.unwrap_or(summary.stats).energy.re;
        let relative = ((energy - self.true_ground_state_energy) / self.true_ground_state_energy).abs();
        metrics.insert(RELATIVE_ERROR.to_string(), relative);
        Ok(())
    }
}

/// Lifetime Metropolis acceptance rate; silent for other samplers.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptanceRate;

impl EvaluationCallback for AcceptanceRate {
    fn on_evaluation_end(&mut self, summary: &EvaluationSummary, metrics: &mut Metrics) -> Result<()> {
        if let Some(rate) = summary.acceptance_rate {
            metrics.insert(ACCEPTANCE_RATE.to_string(), rate);
        }
        Ok(())
    }
}

/// The usual callbacks for an estimator: exact or sampled energy statistics,
/// the acceptance rate, and the ground-state error when the energy is known.
pub fn default_callbacks(exact: bool, true_ground_state_energy: Option<f64>) -> Vec<Box<dyn EvaluationCallback>> {
    let mut callbacks: Vec<Box<dyn EvaluationCallback>> = if exact {
        vec![Box::new(ExactLocalEnergy)]
    } else {
        vec![Box::new(LocalEnergyStats), Box::new(AcceptanceRate)]
    };
    if let Some(energy) = true_ground_state_energy {
        callbacks.push(Box::new(GroundStateError::new(energy)));
    }
    callbacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn summary(exact: bool) -> EvaluationSummary {
        let stats = EnergyStats {
            energy: Complex64::new(-9.0, 0.01),
            variance: 4.0,
            std_error: 0.1,
            n_samples: 400,
        };
        EvaluationSummary {
            stats,
            step_energies: vec![-9.0; 3],
            exact_stats: exact.then_some(EnergyStats { energy: Complex64::new(-8.0, 0.0), ..stats }),
            acceptance_rate: None,
        }
    }

    #[test]
    fn test_default_monte_carlo_callbacks() {
        let mut metrics = Metrics::new();
        for mut callback in default_callbacks(false, Some(-10.0)) {
            callback.on_evaluation_end(&summary(false), &mut metrics).unwrap();
        }
        assert_relative_eq!(metrics[ENERGY], -9.0);
        assert_relative_eq!(metrics[LOCAL_ENERGY_VARIANCE], 4.0);
        assert_relative_eq!(metrics[RELATIVE_ERROR], 0.1);
        assert!(!metrics.contains_key(ACCEPTANCE_RATE));
        assert!(!metrics.contains_key(BLOCKED_ERROR));
    }

    #[test]
    fn test_exact_callback_needs_exact_stats() {
        let mut metrics = Metrics::new();
        assert!(ExactLocalEnergy.on_evaluation_end(&summary(false), &mut metrics).is_err());
        ExactLocalEnergy.on_evaluation_end(&summary(true), &mut metrics).unwrap();
        assert_relative_eq!(metrics[ENERGY], -8.0);
        GroundStateError::new(-10.0).on_evaluation_end(&summary(true), &mut metrics).unwrap();
        assert_relative_eq!(metrics[RELATIVE_ERROR], 0.2);
    }
}
