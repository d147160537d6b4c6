//! IO module - run configuration files.

mod config;

pub use config::{
    read_config, EstimatorKind, HilbertConfig, ModelConfig, OperatorConfig, RunConfig, SamplerConfig,
};
