//! vmc_kit - Variational Monte Carlo for spin lattices in Rust
//!
//! This crate provides the sampling and estimation engine of lattice VMC:
//! exact enumeration, Metropolis and autoregressive sampling of |ψ|², local
//! energies of lattice Hamiltonians, and the exact / Monte Carlo variational
//! estimators feeding a gradient-descent training loop. Wavefunctions plug in
//! through the traits in [`wavefunction`].

pub mod error;
pub mod estimation;
pub mod evaluation;
pub mod hilbert;
pub mod io;
pub mod models;
pub mod operators;
pub mod sampling;
pub mod training;
pub mod variational;
pub mod wavefunction;

// Re-export commonly used types at crate root
pub use error::{Result, VmcError};
pub use estimation::{EnergyStats, LocalEnergyEstimator};
pub use evaluation::{evaluate, exact_evaluate, Evaluator, Metrics, MetricsSink};
pub use hilbert::{Configuration, ConfigurationBatch, HilbertSpace};
pub use io::{read_config, RunConfig};
pub use operators::{Heisenberg, Ising, LatticeHamiltonian, Operator, OperatorWrapper};
pub use sampling::{AutoregressiveSampler, ExactSampler, MetropolisParams, MetropolisSampler, Proposal, Sampler};
pub use training::{GradientAccumulator, GradientDescent, Validation};
pub use variational::{
    energy_gradient_loss, ExactVariational, TrainingBatch, VariationalEstimator, VariationalMonteCarlo,
};
pub use wavefunction::{AutoregressiveWavefunction, OptimizableWavefunction, Wavefunction};
