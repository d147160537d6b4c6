//! Models module - small reference wavefunctions.
//!
//! These stand in for trained networks in tests and in the command-line
//! driver; any other model only has to implement the traits in
//! [`crate::wavefunction`].

mod autoregressive;
mod jastrow;

pub use autoregressive::LinearAutoregressive;
pub use jastrow::Jastrow;

use num_complex::Complex64;

use crate::hilbert::Configuration;
use crate::wavefunction::{AutoregressiveWavefunction, Wavefunction};

/// Any of the reference models, as built from a run configuration.
#[derive(Clone, Debug)]
pub enum Model {
    Jastrow(Jastrow),
    Autoregressive(LinearAutoregressive),
}

impl Wavefunction for Model {
    fn log_amplitudes(&self, batch: &[Configuration]) -> Vec<Complex64> {
        match self {
            Model::Jastrow(m) => m.log_amplitudes(batch),
            Model::Autoregressive(m) => m.log_amplitudes(batch),
        }
    }

    fn as_autoregressive(&self) -> Option<&dyn AutoregressiveWavefunction> {
        match self {
            Model::Jastrow(_) => None,
            Model::Autoregressive(m) => Some(m),
        }
    }
}
