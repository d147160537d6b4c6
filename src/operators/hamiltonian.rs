//! Lattice Hamiltonians written as sums of local Pauli terms.

use num_complex::Complex64;

use super::traits::{Connection, Operator};
use crate::error::Result;
use crate::hilbert::{Bond, Configuration, HilbertSpace};

/// One local term of a lattice Hamiltonian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperatorTerm {
    /// `c · σᶻᵢ σᶻⱼ`
    ZZ { bond: Bond, coefficient: f64 },
    /// `c · σᶻᵢ`
    Z { site: usize, coefficient: f64 },
    /// `c · σˣᵢ`
    X { site: usize, coefficient: f64 },
    /// Spin exchange on a bond: antiparallel pairs are flipped with matrix
    /// element `element` (`2J` for `J(σˣσˣ + σʸσʸ)`).
    Exchange { bond: Bond, element: f64 },
}

impl OperatorTerm {
    pub fn bond(&self) -> Option<Bond> {
        match self {
            OperatorTerm::ZZ { bond, .. } | OperatorTerm::Exchange { bond, .. } => Some(*bond),
            OperatorTerm::Z { .. } | OperatorTerm::X { .. } => None,
        }
    }

    /// True for terms living on a periodic wrap-around bond.
    pub fn wraps(&self) -> bool {
        self.bond().map_or(false, |b| b.wraps)
    }

    fn diagonal(&self, s: &[i8]) -> f64 {
        match *self {
            OperatorTerm::ZZ { bond, coefficient } => {
                coefficient * (s[bond.first] * s[bond.second]) as f64
            }
            OperatorTerm::Z { site, coefficient } => coefficient * s[site] as f64,
            OperatorTerm::X { .. } | OperatorTerm::Exchange { .. } => 0.0,
        }
    }

    fn off_diagonal(&self, config: &Configuration) -> Option<Connection> {
        match *self {
            OperatorTerm::X { site, coefficient } if coefficient != 0.0 => {
                Some((config.flipped(&[site]), Complex64::new(coefficient, 0.0)))
            }
            OperatorTerm::Exchange { bond, element }
                if element != 0.0 && config[bond.first] != config[bond.second] =>
            {
                Some((
                    config.flipped(&[bond.first, bond.second]),
                    Complex64::new(element, 0.0),
                ))
            }
            _ => None,
        }
    }
}

/// A Hamiltonian given as an explicit list of local terms.
#[derive(Clone, Debug)]
pub struct LatticeHamiltonian {
    hilbert: HilbertSpace,
    terms: Vec<OperatorTerm>,
}

impl LatticeHamiltonian {
    pub fn new(hilbert: HilbertSpace, terms: Vec<OperatorTerm>) -> Self {
        Self { hilbert, terms }
    }

    pub fn terms(&self) -> &[OperatorTerm] {
        &self.terms
    }
}

impl Operator for LatticeHamiltonian {
    fn hilbert(&self) -> &HilbertSpace {
        &self.hilbert
    }

    /// The diagonal element is always first, followed by one entry per
    /// non-vanishing off-diagonal term in term order.
    fn connected_configurations(&self, config: &Configuration) -> Result<Vec<Connection>> {
        self.hilbert.validate(config)?;

        let diagonal: f64 = self.terms.iter().map(|t| t.diagonal(config)).sum();
        let mut connections = Vec::with_capacity(1 + self.terms.len());
        connections.push((config.clone(), Complex64::new(diagonal, 0.0)));
        connections.extend(self.terms.iter().filter_map(|t| t.off_diagonal(config)));
        Ok(connections)
    }
}
