//! Estimation module - local energies and their statistics.

mod exact;
mod local_energy;
mod stats;

pub use exact::{normalized_probabilities, ExactDistribution};
pub use local_energy::{LocalEnergies, LocalEnergyEstimator};
pub use stats::{autocorrelation_time, blocking_error, EnergyAccumulator, EnergyStats};
