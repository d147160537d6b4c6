//! Local moves for the Metropolis sampler.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::hilbert::{Bond, Configuration};

/// Symmetric proposal kernels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proposal {
    /// Flip one uniformly chosen site.
    #[default]
    SingleFlip,
    /// Flip `n` distinct uniformly chosen sites.
    MultiFlip { n: usize },
    /// Swap the two ends of a random lattice bond; conserves total Sz.
    Exchange,
}

impl Proposal {
    pub fn propose<R: Rng + ?Sized>(&self, config: &Configuration, bonds: &[Bond], rng: &mut R) -> Configuration {
        match *self {
            Proposal::SingleFlip => {
                let site = rng.gen_range(0..config.len());
                config.flipped(&[site])
            }
            Proposal::MultiFlip { n } => {
                let sites = rand::seq::index::sample(rng, config.len(), n).into_vec();
                config.flipped(&sites)
            }
            Proposal::Exchange => {
                let bond = bonds[rng.gen_range(0..bonds.len())];
                config.swapped(bond.first, bond.second)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilbert::HilbertSpace;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_moves() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let hilbert = HilbertSpace::chain(6, true).unwrap();
        let bonds = hilbert.bonds();
        let config = hilbert.random_balanced_configuration(&mut rng);
        for _ in 0..50 {
            let single = Proposal::SingleFlip.propose(&config, &bonds, &mut rng);
            assert_eq!(single.iter().zip(config.iter()).filter(|(a, b)| a != b).count(), 1);

            let multi = Proposal::MultiFlip { n: 3 }.propose(&config, &bonds, &mut rng);
            assert_eq!(multi.iter().zip(config.iter()).filter(|(a, b)| a != b).count(), 3);

            let exchanged = Proposal::Exchange.propose(&config, &bonds, &mut rng);
            assert_eq!(exchanged.magnetization(), config.magnetization());
        }
    }
}
