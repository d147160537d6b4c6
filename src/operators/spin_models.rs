//! Transverse-field Ising and Heisenberg models on hypercubic lattices.

use serde::{Deserialize, Serialize};

use super::hamiltonian::{LatticeHamiltonian, OperatorTerm};
use crate::hilbert::HilbertSpace;

/// `H = -J Σ⟨ij⟩ σᶻᵢσᶻⱼ - h Σᵢ σˣᵢ`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ising {
    pub h: f64,
    #[serde(default = "unit_coupling")]
    pub j: f64,
}

/// `H = J Σ⟨ij⟩ (σˣᵢσˣⱼ + σʸᵢσʸⱼ + σᶻᵢσᶻⱼ)`
///
/// With `sign_rule` the off-diagonal elements carry the Marshall sign
/// (`-2J`), which leaves the spectrum of bipartite lattices unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Heisenberg {
    #[serde(default = "unit_coupling")]
    pub j: f64,
    #[serde(default)]
    pub sign_rule: bool,
}

fn unit_coupling() -> f64 {
    1.0
}

impl Ising {
    pub fn new(h: f64) -> Self {
        Self { h, j: 1.0 }
    }

    pub fn build(&self, hilbert: HilbertSpace) -> LatticeHamiltonian {
        let mut terms: Vec<OperatorTerm> = hilbert
            .bonds()
            .into_iter()
            .map(|bond| OperatorTerm::ZZ { bond, coefficient: -self.j })
            .collect();
        terms.extend(
            (0..hilbert.n_sites()).map(|site| OperatorTerm::X { site, coefficient: -self.h }),
        );
        LatticeHamiltonian::new(hilbert, terms)
    }
}

impl Default for Heisenberg {
    fn default() -> Self {
        Self { j: 1.0, sign_rule: false }
    }
}

impl Heisenberg {
    pub fn build(&self, hilbert: HilbertSpace) -> LatticeHamiltonian {
        let element = if self.sign_rule { -2.0 * self.j } else { 2.0 * self.j };
        let terms = hilbert
            .bonds()
            .into_iter()
            .flat_map(|bond| {
                [
                    OperatorTerm::ZZ { bond, coefficient: self.j },
                    OperatorTerm::Exchange { bond, element },
                ]
            })
            .collect();
        LatticeHamiltonian::new(hilbert, terms)
    }
}
