//! YAML run configuration and the builders turning it into engine objects.
//!
//! ```yaml
//! hilbert: { shape: [7], pbc: true }
//! operator: { kind: heisenberg, j: 1.0 }
//! model: { kind: jastrow, seed: 3, scale: 0.1 }
//! sampler: { kind: metropolis, n_chains: 16, burn_in: 200, decorrelation: 4, seed: 7 }
//! batch_size: 1024
//! steps: 200
//! train: { learning_rate: 0.01, iterations: 100 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VmcError};
use crate::hilbert::HilbertSpace;
use crate::models::{Jastrow, LinearAutoregressive, Model};
use crate::operators::{Heisenberg, Ising, LatticeHamiltonian};
use crate::sampling::{
    seeded_rng, AutoregressiveSampler, ExactSampler, MetropolisParams, MetropolisSampler, Proposal, Sampler,
};
use crate::training::GradientDescent;
use crate::variational::{ExactVariational, VariationalEstimator, VariationalMonteCarlo};
use crate::wavefunction::Wavefunction;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HilbertConfig {
    pub shape: Vec<usize>,
    #[serde(default = "default_pbc")]
    pub pbc: bool,
}

fn default_pbc() -> bool {
    true
}

impl HilbertConfig {
    pub fn build(&self) -> Result<HilbertSpace> {
        HilbertSpace::new(self.shape.clone(), self.pbc)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperatorConfig {
    Ising(Ising),
    Heisenberg(Heisenberg),
}

impl OperatorConfig {
    pub fn build(&self, hilbert: HilbertSpace) -> LatticeHamiltonian {
        match self {
            OperatorConfig::Ising(ising) => ising.build(hilbert),
            OperatorConfig::Heisenberg(heisenberg) => heisenberg.build(hilbert),
        }
    }
}

fn default_scale() -> f64 {
    0.1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelConfig {
    /// Complex product state exp(Σ aᵢsᵢ)
    LogLinear {
        #[serde(default)]
        seed: Option<u64>,
        #[serde(default = "default_scale")]
        scale: f64,
    },
    Jastrow {
        #[serde(default)]
        seed: Option<u64>,
        #[serde(default = "default_scale")]
        scale: f64,
        #[serde(default)]
        complex: bool,
    },
    Autoregressive {
        #[serde(default)]
        seed: Option<u64>,
        #[serde(default = "default_scale")]
        scale: f64,
        /// Conditioning order; raster order when absent
        #[serde(default)]
        order: Option<Vec<usize>>,
    },
}

impl ModelConfig {
    pub fn build(&self, n_sites: usize) -> Result<Model> {
        match self {
            ModelConfig::LogLinear { seed, scale } => {
                let mut rng = seeded_rng(*seed);
                Ok(Model::Jastrow(Jastrow::random(n_sites, false, true, *scale, &mut rng)?))
            }
            ModelConfig::Jastrow { seed, scale, complex } => {
                let mut rng = seeded_rng(*seed);
                Ok(Model::Jastrow(Jastrow::random(n_sites, true, *complex, *scale, &mut rng)?))
            }
            ModelConfig::Autoregressive { seed, scale, order } => {
                let mut rng = seeded_rng(*seed);
                let order = order.clone().unwrap_or_else(|| (0..n_sites).collect());
                if order.len() != n_sites {
                    return Err(VmcError::Config(format!(
                        "autoregressive order has {} sites, lattice has {}",
                        order.len(),
                        n_sites
                    )));
                }
                Ok(Model::Autoregressive(LinearAutoregressive::random_with_order(order, *scale, &mut rng)?))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplerConfig {
    Exact {
        #[serde(default)]
        seed: Option<u64>,
    },
    Metropolis {
        #[serde(default = "default_chains")]
        n_chains: usize,
        #[serde(default = "default_burn_in")]
        burn_in: usize,
        #[serde(default = "default_decorrelation")]
        decorrelation: usize,
        #[serde(default)]
        proposal: Proposal,
        #[serde(default)]
        seed: Option<u64>,
    },
    Autoregressive {
        #[serde(default)]
        seed: Option<u64>,
    },
}

fn default_chains() -> usize {
    MetropolisParams::default().n_chains
}

fn default_burn_in() -> usize {
    MetropolisParams::default().burn_in
}

fn default_decorrelation() -> usize {
    MetropolisParams::default().decorrelation
}

impl SamplerConfig {
    pub fn build<W: Wavefunction + ?Sized>(
        &self,
        hilbert: HilbertSpace,
        batch_size: usize,
        wavefunction: &W,
    ) -> Result<Sampler> {
        Ok(match self {
            SamplerConfig::Exact { seed } => ExactSampler::new(hilbert, batch_size, *seed)?.into(),
            SamplerConfig::Metropolis { n_chains, burn_in, decorrelation, proposal, seed } => {
                let params = MetropolisParams {
                    batch_size,
                    n_chains: *n_chains,
                    burn_in: *burn_in,
                    decorrelation: *decorrelation,
                    proposal: *proposal,
                    seed: *seed,
                };
                MetropolisSampler::new(hilbert, params)?.into()
            }
            SamplerConfig::Autoregressive { seed } => {
                AutoregressiveSampler::for_wavefunction(hilbert, batch_size, wavefunction, *seed)?.into()
            }
        })
    }
}

/// Which variational estimator drives training and evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    #[default]
    MonteCarlo,
    Exact,
}

/// A complete run: system, model, sampling and optional training.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub hilbert: HilbertConfig,
    pub operator: OperatorConfig,
    pub model: ModelConfig,
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub estimator: EstimatorKind,
    pub batch_size: usize,
    /// Monte Carlo evaluation steps
    pub steps: usize,
    #[serde(default)]
    pub train: Option<GradientDescent>,
    #[serde(default)]
    pub true_ground_state_energy: Option<f64>,
}

impl RunConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn hilbert_space(&self) -> Result<HilbertSpace> {
        self.hilbert.build()
    }

    pub fn build_operator(&self) -> Result<LatticeHamiltonian> {
        Ok(self.operator.build(self.hilbert_space()?))
    }

    pub fn build_model(&self) -> Result<Model> {
        self.model.build(self.hilbert_space()?.n_sites())
    }

    /// Estimator of the configured kind; the sampler is only built for Monte Carlo.
    pub fn build_estimator<W: Wavefunction + ?Sized>(
        &self,
        wavefunction: &W,
    ) -> Result<VariationalEstimator<LatticeHamiltonian>> {
        let operator = self.build_operator()?;
        Ok(match self.estimator {
            EstimatorKind::Exact => ExactVariational::new(operator, self.batch_size)?.into(),
            EstimatorKind::MonteCarlo => {
                let sampler = self.sampler.build(self.hilbert_space()?, self.batch_size, wavefunction)?;
                VariationalMonteCarlo::new(operator, sampler).into()
            }
        })
    }

    /// Exact estimator over the same system, for reference evaluations.
    pub fn build_exact_estimator(&self) -> Result<VariationalEstimator<LatticeHamiltonian>> {
        Ok(ExactVariational::new(self.build_operator()?, self.batch_size)?.into())
    }
}

/// Read a run configuration from a YAML file.
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    Ok(serde_yaml::from_reader(reader)?)
}
