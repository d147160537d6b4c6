//! The operator contract shared by built-in and wrapped Hamiltonians.

use num_complex::Complex64;

use crate::error::Result;
use crate::hilbert::{Configuration, HilbertSpace};

/// A connected configuration and its matrix element `O(s, s')`.
pub type Connection = (Configuration, Complex64);

/// A Hamiltonian acting on a discrete Hilbert space.
pub trait Operator {
    /// The space the operator acts on.
    fn hilbert(&self) -> &HilbertSpace;

    /// All configurations `s'` with `O(s, s') != 0`, with their matrix elements.
    ///
    /// Must be a pure function of `config`, linear in the number of terms, and
    /// fail with `InvalidConfigurationShape` for configurations outside the
    /// declared space.
    fn connected_configurations(&self, config: &Configuration) -> Result<Vec<Connection>>;
}

impl<T: Operator + ?Sized> Operator for Box<T> {
    fn hilbert(&self) -> &HilbertSpace {
        (**self).hilbert()
    }

    fn connected_configurations(&self, config: &Configuration) -> Result<Vec<Connection>> {
        (**self).connected_configurations(config)
    }
}

impl<T: Operator + ?Sized> Operator for &T {
    fn hilbert(&self) -> &HilbertSpace {
        (**self).hilbert()
    }

    fn connected_configurations(&self, config: &Configuration) -> Result<Vec<Connection>> {
        (**self).connected_configurations(config)
    }
}
