//! Wavefunction module - the model seam and checked batch evaluation.

mod traits;

pub use traits::{
    evaluate_conditionals, evaluate_in_chunks, evaluate_log_amplitudes, AutoregressiveWavefunction,
    OptimizableWavefunction, SiteLogProbs, Wavefunction,
};
