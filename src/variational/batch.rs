//! Training batches and the energy-gradient loss.

use num_complex::Complex64;

use crate::error::{Result, VmcError};
use crate::estimation::EnergyStats;
use crate::hilbert::ConfigurationBatch;
use crate::wavefunction::OptimizableWavefunction;

/// One step of training signal.
///
/// `configurations` carries the probability weight pᵢ of each sample
/// (1/n for Monte Carlo, |ψ|²/Z for exact enumeration); `weights` holds the
/// gradient weights wᵢ = 2·pᵢ·conj(E_loc(sᵢ) − Ē).
#[derive(Clone, Debug)]
pub struct TrainingBatch {
    pub configurations: ConfigurationBatch,
    pub local_energies: Vec<Complex64>,
    pub log_psi: Vec<Complex64>,
    pub weights: Vec<Complex64>,
    /// Energy statistics reported for this step
    pub stats: EnergyStats,
}

impl TrainingBatch {
    /// Assemble a batch; `center` is the energy the local energies are centred on.
    pub(crate) fn new(
        configurations: ConfigurationBatch,
        local_energies: Vec<Complex64>,
        log_psi: Vec<Complex64>,
        center: Complex64,
        stats: EnergyStats,
    ) -> Self {
        let weights = local_energies
            .iter()
            .enumerate()
            .map(|(i, &e)| 2.0 * configurations.weight(i) * (e - center).conj())
            .collect();
        Self { configurations, local_energies, log_psi, weights, stats }
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Scalar surrogate whose parameter gradient is this batch's energy gradient.
    pub fn loss(&self) -> f64 {
        energy_gradient_loss(&self.weights, &self.log_psi)
    }

    /// Energy gradient Re Σᵢ wᵢ·Oₖ(sᵢ) with respect to the real parameters.
    pub fn gradient<W: OptimizableWavefunction + ?Sized>(&self, wavefunction: &W) -> Result<Vec<f64>> {
        let derivatives = wavefunction.log_derivatives(self.configurations.configurations());
        self.gradient_from(&derivatives, wavefunction.num_params())
    }

    /// Energy gradient from log-derivatives already evaluated on this batch,
    /// one row of `n_params` entries per configuration.
    pub fn gradient_from(&self, derivatives: &[Vec<Complex64>], n_params: usize) -> Result<Vec<f64>> {
        if derivatives.len() != self.len() {
            return Err(VmcError::shape("log-derivative rows", self.len(), derivatives.len()));
        }
        let mut gradient = vec![0.0; n_params];
        for (row, w) in derivatives.iter().zip(&self.weights) {
            if row.len() != n_params {
                return Err(VmcError::shape("log-derivatives per sample", n_params, row.len()));
            }
            for (g, o) in gradient.iter_mut().zip(row) {
                *g += (w * o).re;
            }
        }
        Ok(gradient)
    }
}

/// Σᵢ Re(wᵢ·log ψ(sᵢ)) with the weights held constant.
///
/// Differentiating this through the model (weights detached) yields the
/// gradient of the variational energy.
pub fn energy_gradient_loss(weights: &[Complex64], log_psi: &[Complex64]) -> f64 {
    weights.iter().zip(log_psi).map(|(w, l)| (w * l).re).sum()
}
