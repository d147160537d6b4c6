//! Error types for the sampling and estimation engine.
//!
//! Every error is local to a single batch or step; nothing here is retried.
//! The caller (usually an external training loop) decides whether to abort
//! or skip the step.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, VmcError>;

#[derive(Error, Debug)]
pub enum VmcError {
    // ==========================================================================
    // Shape errors
    // ==========================================================================
    /// A configuration does not belong to the declared Hilbert space.
    #[error("invalid configuration shape: expected {expected}, found {found}")]
    InvalidConfigurationShape { expected: String, found: String },

    /// Two sizes that must agree do not (batch sizes, model output, parameters).
    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    // ==========================================================================
    // Numerical errors
    // ==========================================================================
    /// A NaN or infinite value showed up while computing a batch.
    #[error("numerical instability in {context} at sample {index}")]
    NumericalInstability { context: &'static str, index: usize },

    // ==========================================================================
    // Sampler errors
    // ==========================================================================
    #[error("invalid sampler configuration: {0}")]
    InvalidSamplerConfig(String),

    /// Autoregressive sampling needs conditional probabilities from the model.
    #[error("wavefunction does not expose conditional log-probabilities")]
    NotAutoregressive,

    #[error("autoregressive site order mismatch: sampler uses {expected:?}, model declares {found:?}")]
    SamplingOrderMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Exact enumeration is limited to spaces that fit in memory.
    #[error("Hilbert space with {sites} sites is too large to enumerate")]
    HilbertSpaceTooLarge { sites: usize },

    // ==========================================================================
    // Training errors
    // ==========================================================================
    /// Gradient accumulation frequency does not cover a full exact cycle.
    #[error("gradient accumulation must update every {required} batches, configured {configured}")]
    GradientAccumulationMismatch { required: usize, configured: usize },

    // ==========================================================================
    // Configuration errors
    // ==========================================================================
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl VmcError {
    pub(crate) fn shape(context: &'static str, expected: usize, found: usize) -> Self {
        VmcError::ShapeMismatch { context, expected, found }
    }
}
