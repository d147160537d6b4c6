//! Wavefunction traits for lattice VMC.
//!
//! `Wavefunction` is the batched seam where any trainable model plugs in;
//! `AutoregressiveWavefunction` adds per-site conditionals for direct
//! sampling, and `OptimizableWavefunction` exposes parameter log-derivatives.

use num_complex::Complex64;

use crate::error::{Result, VmcError};
use crate::hilbert::Configuration;

/// Log-probabilities of the two local values, in `LOCAL_VALUES` order.
pub type SiteLogProbs = [f64; 2];

/// A trainable map from configurations to complex log-amplitudes.
///
/// Normalization is not required: estimators only use differences of
/// log-amplitudes (or normalize explicitly over an enumerated space).
pub trait Wavefunction {
    /// Evaluate `log ψ(s)` for every configuration of the batch, in order.
    fn log_amplitudes(&self, batch: &[Configuration]) -> Vec<Complex64>;

    /// Downcast to the autoregressive interface, when the model has one.
    fn as_autoregressive(&self) -> Option<&dyn AutoregressiveWavefunction> {
        None
    }
}

/// A wavefunction factored as `|ψ(s)|² = Π_k p(s_{o_k} | s_{o_1} .. s_{o_{k-1}})`
/// over a declared site order `o`.
pub trait AutoregressiveWavefunction: Wavefunction {
    /// Raster indices of the sites in conditioning order.
    fn site_order(&self) -> Vec<usize>;

    /// For each configuration and each site (raster index), the conditional
    /// log-probabilities of that site given the sites preceding it in
    /// `site_order`. Values of later sites must not influence the result.
    fn conditional_log_probs(&self, batch: &[Configuration]) -> Vec<Vec<SiteLogProbs>>;
}

/// Trait for wavefunctions with real variational parameters.
///
/// Provides the log-derivatives O_k(s) = ∂ log ψ(s) / ∂θ_k needed for
/// gradient descent and Stochastic Reconfiguration.
pub trait OptimizableWavefunction: Wavefunction {
    /// Number of variational parameters.
    fn num_params(&self) -> usize;

    /// Get current parameter values.
    fn params(&self) -> Vec<f64>;

    /// Replace all parameter values.
    fn set_params(&mut self, params: &[f64]) -> Result<()>;

    /// O_k(s) for every configuration of the batch.
    fn log_derivatives(&self, batch: &[Configuration]) -> Vec<Vec<Complex64>>;

    /// Log-derivatives by central difference on each parameter.
    fn numerical_log_derivatives(&self, config: &Configuration, h: f64) -> Result<Vec<Complex64>>
    where
        Self: Clone,
    {
        let params = self.params();
        let mut shifted = self.clone();
        let mut grad = Vec::with_capacity(params.len());
        for k in 0..params.len() {
            let mut fwd = params.clone();
            let mut bwd = params.clone();
            fwd[k] += h;
            bwd[k] -= h;
            shifted.set_params(&fwd)?;
            let up = shifted.log_amplitudes(std::slice::from_ref(config))[0];
            shifted.set_params(&bwd)?;
            let down = shifted.log_amplitudes(std::slice::from_ref(config))[0];
            grad.push((up - down) / (2.0 * h));
        }
        Ok(grad)
    }
}

/// Evaluate a batch, failing on size mismatches and non-finite outputs.
pub fn evaluate_log_amplitudes<W: Wavefunction + ?Sized>(
    wavefunction: &W,
    batch: &[Configuration],
) -> Result<Vec<Complex64>> {
    let values = wavefunction.log_amplitudes(batch);
    if values.len() != batch.len() {
        return Err(VmcError::shape("wavefunction output", batch.len(), values.len()));
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(VmcError::NumericalInstability { context: "log-amplitude", index });
    }
    Ok(values)
}

/// Like [`evaluate_log_amplitudes`] but in model calls of at most `chunk` configurations.
pub fn evaluate_in_chunks<W: Wavefunction + ?Sized>(
    wavefunction: &W,
    batch: &[Configuration],
    chunk: Option<usize>,
) -> Result<Vec<Complex64>> {
    match chunk {
        Some(size) if size > 0 && size < batch.len() => {
            let mut values = Vec::with_capacity(batch.len());
            for (i, part) in batch.chunks(size).enumerate() {
                let part_values = evaluate_log_amplitudes(wavefunction, part).map_err(|err| match err {
                    VmcError::NumericalInstability { context, index } => {
                        VmcError::NumericalInstability { context, index: i * size + index }
                    }
                    other => other,
                })?;
                values.extend(part_values);
            }
            Ok(values)
        }
        _ => evaluate_log_amplitudes(wavefunction, batch),
    }
}

/// Checked conditional log-probabilities: one row per configuration, one entry per site.
pub fn evaluate_conditionals<W: AutoregressiveWavefunction + ?Sized>(
    wavefunction: &W,
    batch: &[Configuration],
    n_sites: usize,
) -> Result<Vec<Vec<SiteLogProbs>>> {
    let rows = wavefunction.conditional_log_probs(batch);
    if rows.len() != batch.len() {
        return Err(VmcError::shape("conditional log-probabilities", batch.len(), rows.len()));
    }
    for (index, row) in rows.iter().enumerate() {
        if row.len() != n_sites {
            return Err(VmcError::shape("conditional log-probabilities per sample", n_sites, row.len()));
        }
        if row.iter().flatten().any(|p| p.is_nan() || *p == f64::INFINITY) {
            return Err(VmcError::NumericalInstability { context: "conditional log-probability", index });
        }
    }
    Ok(rows)
}
