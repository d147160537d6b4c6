//! Hilbert space module - the discrete spin-1/2 configuration space.

mod configuration;
mod lattice;

pub use configuration::{Configuration, ConfigurationBatch};
pub use lattice::{coordinates, nearest_neighbour_bonds, strides, Bond};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VmcError};

/// Allowed site values, in enumeration order.
pub const LOCAL_VALUES: [i8; 2] = [-1, 1];

/// Largest number of sites for which full enumeration is allowed.
pub const MAX_ENUMERABLE_SITES: usize = 30;

/// Spin-1/2 configuration space on a hypercubic lattice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HilbertSpace {
    shape: Vec<usize>,
    pbc: bool,
}

impl HilbertSpace {
    pub fn new(shape: Vec<usize>, pbc: bool) -> Result<Self> {
        if shape.is_empty() || shape.iter().any(|&len| len == 0) {
            return Err(VmcError::Config(format!(
                "Hilbert space shape must be non-empty with positive axes, got {:?}",
                shape
            )));
        }
        if shape.iter().try_fold(1usize, |acc, &len| acc.checked_mul(len)).is_none() {
            return Err(VmcError::Config(format!("Hilbert space shape {:?} has too many sites", shape)));
        }
        Ok(Self { shape, pbc })
    }

    /// One-dimensional chain of `n` sites.
    pub fn chain(n: usize, pbc: bool) -> Result<Self> {
        Self::new(vec![n], pbc)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn pbc(&self) -> bool {
        self.pbc
    }

    pub fn n_sites(&self) -> usize {
        self.shape.iter().product()
    }

    /// Number of basis states, `2^N`.
    pub fn size(&self) -> Result<usize> {
        let sites = self.n_sites();
        if sites > MAX_ENUMERABLE_SITES {
            return Err(VmcError::HilbertSpaceTooLarge { sites });
        }
        Ok(1usize << sites)
    }

    pub fn bonds(&self) -> Vec<Bond> {
        nearest_neighbour_bonds(&self.shape, self.pbc)
    }

    /// Check that `config` has one ±1 value per site.
    pub fn validate(&self, config: &[i8]) -> Result<()> {
        if config.len() != self.n_sites() {
            return Err(VmcError::InvalidConfigurationShape {
                expected: format!("{:?} ({} sites)", self.shape, self.n_sites()),
                found: format!("{} sites", config.len()),
            });
        }
        if let Some(bad) = config.iter().find(|&&v| !LOCAL_VALUES.contains(&v)) {
            return Err(VmcError::InvalidConfigurationShape {
                expected: format!("site values in {:?}", LOCAL_VALUES),
                found: format!("value {}", bad),
            });
        }
        Ok(())
    }

    /// Basis state number `index`; site 0 is the most significant bit and a set
    /// bit means +1, so enumeration is lexicographic in site values.
    pub fn index_to_configuration(&self, index: usize) -> Configuration {
        let n = self.n_sites();
        let values = (0..n)
            .map(|site| LOCAL_VALUES[(index >> (n - 1 - site)) & 1])
            .collect();
        Configuration::new(values)
    }

    pub fn configuration_to_index(&self, config: &[i8]) -> usize {
        config
            .iter()
            .fold(0usize, |acc, &v| (acc << 1) | usize::from(v > 0))
    }

    /// Every basis state exactly once, in index order.
    pub fn all_configurations(&self) -> Result<impl Iterator<Item = Configuration> + '_> {
        let size = self.size()?;
        Ok((0..size).map(move |index| self.index_to_configuration(index)))
    }

    pub fn random_configuration<R: Rng + ?Sized>(&self, rng: &mut R) -> Configuration {
        let values = (0..self.n_sites())
            .map(|_| LOCAL_VALUES[rng.gen_range(0..2)])
            .collect();
        Configuration::new(values)
    }

    /// Random state with magnetization 0 (or 1 for odd site counts).
    pub fn random_balanced_configuration<R: Rng + ?Sized>(&self, rng: &mut R) -> Configuration {
        let n = self.n_sites();
        let mut values: Vec<i8> = (0..n).map(|site| if site < n / 2 { -1 } else { 1 }).collect();
        values.shuffle(rng);
        Configuration::new(values)
    }
}
