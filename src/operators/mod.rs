//! Operators module - Hamiltonians as sums of local terms.

mod traits;
mod hamiltonian;
mod spin_models;
mod wrapper;

pub use traits::{Connection, Operator};
pub use hamiltonian::{LatticeHamiltonian, OperatorTerm};
pub use spin_models::{Heisenberg, Ising};
pub use wrapper::{ExternalOperator, OperatorWrapper};
