//! Gradient descent on the variational energy, optionally preconditioned by
//! Stochastic Reconfiguration (SR).
//!
//! With SR the parameter update solves
//!
//!   S · δp = -f
//!
//! where, with pᵢ the sample weights and real parameters θ:
//! - S_kl = Re ⟨(O_k − ⟨O_k⟩)* (O_l − ⟨O_l⟩)⟩  (overlap matrix)
//! - f_k = Re ⟨(O_k − ⟨O_k⟩)* (E_L − ⟨E_L⟩)⟩  (energy-parameter covariance)
//! - O_k = ∂ ln Ψ / ∂θ_k                      (log-derivatives)

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::accumulator::{AccumulationMode, GradientAccumulator};
use super::validation::Validation;
use crate::error::{Result, VmcError};
use crate::estimation::EnergyAccumulator;
use crate::evaluation::{Metrics, MetricsSink, ENERGY, LOCAL_ENERGY_VARIANCE};
use crate::operators::Operator;
use crate::variational::VariationalEstimator;
use crate::wavefunction::OptimizableWavefunction;

/// One sample kept for the SR matrices.
struct SrSample {
    derivatives: Vec<Complex64>,
    weight: f64,
    local_energy: Complex64,
}

/// Configuration for the gradient-descent driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientDescent {
    /// Step size applied to each parameter update
    pub learning_rate: f64,
    /// Number of parameter updates
    pub iterations: usize,
    /// Diagonal shift of the S matrix; plain gradient descent when absent
    #[serde(default)]
    pub sr_epsilon: Option<f64>,
    /// Batches per update; one full estimator cycle when absent
    #[serde(default)]
    pub update_frequency: Option<usize>,
    #[serde(default)]
    pub accumulation: AccumulationMode,
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            iterations: 100,
            sr_epsilon: None,
            update_frequency: None,
            accumulation: AccumulationMode::Sum,
        }
    }
}

/// Results from a training run.
#[derive(Clone, Debug, Default)]
pub struct TrainingHistory {
    /// Energy before each update
    pub energy_history: Vec<f64>,
    /// Local-energy variance before each update
    pub variance_history: Vec<f64>,
    pub final_params: Vec<f64>,
}

impl GradientDescent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    /// Enable stochastic reconfiguration with diagonal shift `eps`.
    pub fn with_sr_epsilon(mut self, eps: f64) -> Self {
        self.sr_epsilon = Some(eps);
        self
    }

    pub fn with_update_frequency(mut self, n: usize) -> Self {
        self.update_frequency = Some(n);
        self
    }

    pub fn with_accumulation(mut self, mode: AccumulationMode) -> Self {
        self.accumulation = mode;
        self
    }

    fn accumulator<O: Operator>(&self, estimator: &VariationalEstimator<O>) -> Result<GradientAccumulator> {
        let accumulator = match self.update_frequency {
            Some(n) => GradientAccumulator::new(n, self.accumulation)?,
            None => GradientAccumulator::for_estimator(estimator, self.accumulation)?,
        };
        accumulator.check(estimator)?;
        Ok(accumulator)
    }

    /// Solve the SR equations for the samples of one update.
    fn compute_sr_update(&self, samples: &[SrSample], n_params: usize, epsilon: f64) -> Vec<f64> {
        let total: f64 = samples.iter().map(|s| s.weight).sum();

        let mut o_mean = vec![Complex64::new(0.0, 0.0); n_params];
        let mut e_mean = Complex64::new(0.0, 0.0);
        for s in samples {
            let p = s.weight / total;
            for (m, o) in o_mean.iter_mut().zip(&s.derivatives) {
                *m += o * p;
            }
            e_mean += s.local_energy * p;
        }

        let mut s_matrix = DMatrix::<f64>::zeros(n_params, n_params);
        let mut force = DVector::<f64>::zeros(n_params);
        for s in samples {
            let p = s.weight / total;
            let centred: Vec<Complex64> = s.derivatives.iter().zip(&o_mean).map(|(o, m)| o - m).collect();
            let de = s.local_energy - e_mean;
            for i in 0..n_params {
                let ci = centred[i].conj();
                for j in 0..n_params {
                    s_matrix[(i, j)] += p * (ci * centred[j]).re;
                }
                force[i] += p * (ci * de).re;
            }
        }

        // Levenberg-Marquardt regularization: S_ii += ε
        for i in 0..n_params {
            s_matrix[(i, i)] += epsilon;
        }

        let neg_force = -&force;
        let delta = s_matrix.lu().solve(&neg_force).unwrap_or_else(|| {
            debug!("singular S matrix, falling back to the plain gradient");
            neg_force.clone()
        });
        delta.iter().copied().collect()
    }

    /// Train `wavefunction` in place, pulling batches from `estimator`.
    pub fn run<O: Operator, W: OptimizableWavefunction>(
        &self,
        estimator: &mut VariationalEstimator<O>,
        wavefunction: &mut W,
        sink: &mut dyn MetricsSink,
    ) -> Result<TrainingHistory> {
        self.run_with_validation(estimator, wavefunction, sink, None::<Validation<'_, O>>)
    }

    /// Like [`GradientDescent::run`], also reporting `validation` into `sink`
    /// before every update it is due for.
    pub fn run_with_validation<O: Operator, V: Operator, W: OptimizableWavefunction>(
        &self,
        estimator: &mut VariationalEstimator<O>,
        wavefunction: &mut W,
        sink: &mut dyn MetricsSink,
        mut validation: Option<Validation<'_, V>>,
    ) -> Result<TrainingHistory> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(VmcError::Config(format!("learning rate must be positive, got {}", self.learning_rate)));
        }
        let mut accumulator = self.accumulator(estimator)?;
        // an exact update must cover one whole cycle from its first batch
        if let VariationalEstimator::Exact(exact) = estimator {
            exact.reset_cycle();
        }
        let n_params = wavefunction.num_params();
        info!(
            params = n_params,
            iterations = self.iterations,
            update_frequency = accumulator.frequency(),
            sr = self.sr_epsilon.is_some(),
            validation_every = validation.as_ref().map(|v| v.every()),
            "gradient descent"
        );

        let mut history = TrainingHistory::default();
        for iteration in 0..self.iterations {
            let mut energy = EnergyAccumulator::default();
            let mut sr_samples = Vec::new();
            if let Some(validation) = validation.as_mut().filter(|v| v.is_due(iteration)) {
                validation.record(iteration, &*wavefunction, sink)?;
            }
            let gradient = loop {
                let batch = estimator.next_batch(&*wavefunction)?;
                for (i, &e) in batch.local_energies.iter().enumerate() {
                    energy.push(e, batch.configurations.weight(i));
                }
                let derivatives = wavefunction.log_derivatives(batch.configurations.configurations());
                let batch_gradient = batch.gradient_from(&derivatives, n_params)?;
                if self.sr_epsilon.is_some() {
                    for (i, row) in derivatives.into_iter().enumerate() {
                        sr_samples.push(SrSample {
                            derivatives: row,
                            weight: batch.configurations.weight(i),
                            local_energy: batch.local_energies[i],
                        });
                    }
                }
                if let Some(combined) = accumulator.push(&batch_gradient)? {
                    break combined;
                }
            };

            let step: Vec<f64> = match self.sr_epsilon {
                Some(eps) => self.compute_sr_update(&sr_samples, n_params, eps),
                None => gradient.iter().map(|g| -g).collect(),
            };
            let mut params = wavefunction.params();
            for (p, dp) in params.iter_mut().zip(&step) {
                *p += self.learning_rate * dp;
            }
            wavefunction.set_params(&params)?;

            let stats = energy.stats();
            history.energy_history.push(stats.energy.re);
            history.variance_history.push(stats.variance);
            let mut metrics = Metrics::new();
            metrics.insert(ENERGY.to_string(), stats.energy.re);
            metrics.insert(LOCAL_ENERGY_VARIANCE.to_string(), stats.variance);
            sink.record(iteration, &metrics);
            debug!(iteration, energy = stats.energy.re, variance = stats.variance, "update");
        }

        history.final_params = wavefunction.params();
        Ok(history)
    }
}
