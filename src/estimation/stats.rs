//! Energy statistics: weighted moments, autocorrelation time, blocking error.

use num_complex::Complex64;

/// Mean and spread of the local energy over a batch, cycle or evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnergyStats {
    /// ⟨E_loc⟩ (imaginary part vanishes in expectation for Hermitian operators)
    pub energy: Complex64,
    /// ⟨|E_loc|²⟩ - |⟨E_loc⟩|²
    pub variance: f64,
    /// sqrt(variance / effective sample count)
    pub std_error: f64,
    /// Number of samples aggregated
    pub n_samples: usize,
}

impl EnergyStats {
    /// Statistics of uniformly weighted samples.
    pub fn from_samples(local_energies: &[Complex64]) -> Self {
        let mut acc = EnergyAccumulator::default();
        for &e in local_energies {
            acc.push(e, 1.0);
        }
        acc.stats()
    }

    /// Statistics with explicit (not necessarily normalized) sample weights.
    pub fn from_weighted(local_energies: &[Complex64], weights: &[f64]) -> Self {
        let mut acc = EnergyAccumulator::default();
        for (&e, &w) in local_energies.iter().zip(weights) {
            acc.push(e, w);
        }
        acc.stats()
    }
}

/// Running weighted first and second moments of the local energy.
///
/// The exact and Monte Carlo paths aggregate through this same type; only
/// the weights differ (|ψ|²/Z versus uniform).
#[derive(Clone, Copy, Debug, Default)]
pub struct EnergyAccumulator {
    n: usize,
    weight_sum: f64,
    weight_sq_sum: f64,
    first: Complex64,
    second: f64,
}

impl EnergyAccumulator {
    pub fn push(&mut self, local_energy: Complex64, weight: f64) {
        self.n += 1;
        self.weight_sum += weight;
        self.weight_sq_sum += weight * weight;
        self.first += local_energy * weight;
        self.second += local_energy.norm_sqr() * weight;
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn stats(&self) -> EnergyStats {
        if self.weight_sum <= 0.0 {
            return EnergyStats {
                energy: Complex64::new(0.0, 0.0),
                variance: 0.0,
                std_error: 0.0,
                n_samples: self.n,
            };
        }
        let energy = self.first / self.weight_sum;
        let variance = (self.second / self.weight_sum - energy.norm_sqr()).max(0.0);
        // Kish effective sample size; equals n for uniform weights
        let n_eff = self.weight_sum * self.weight_sum / self.weight_sq_sum;
        EnergyStats {
            energy,
            variance,
            std_error: (variance / n_eff).sqrt(),
            n_samples: self.n,
        }
    }
}

/// Estimate autocorrelation time using initial positive sequence.
pub fn autocorrelation_time(series: &[f64]) -> f64 {
    let n = series.len();
    if n < 2 {
        return 1.0;
    }
    let mean = series.iter().sum::<f64>() / n as f64;
    let var = series.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n as f64;

    if var == 0.0 {
        return 1.0;
    }

    let mut autocorr = 1.0;
    for t in 1..n / 2 {
        let auto_t: f64 = series[..n - t].iter()
            .zip(series[t..].iter())
            .map(|(&x, &y)| (x - mean) * (y - mean))
            .sum::<f64>() / ((n - t) as f64 * var);

        if auto_t < 0.0 {
            break;
        }
        autocorr += 2.0 * auto_t;
    }
    autocorr
}

/// Standard error of the mean of a correlated series by blocking.
pub fn blocking_error(series: &[f64], autocorrelation_time: f64) -> f64 {
    let block_size = ((2.0 * autocorrelation_time).ceil() as usize).max(1);
    let n_blocks = series.len() / block_size;

    if n_blocks < 2 {
        return 0.0;
    }

    let block_means: Vec<f64> = (0..n_blocks)
        .map(|i| {
            let start = i * block_size;
            let end = start + block_size;
            series[start..end].iter().sum::<f64>() / block_size as f64
        })
        .collect();

    let mean = block_means.iter().sum::<f64>() / n_blocks as f64;
    let variance = block_means.iter()
        .map(|&x| (x - mean).powi(2))
        .sum::<f64>() / (n_blocks - 1) as f64;

    (variance / n_blocks as f64).sqrt()
}
