//! Configurations and batches of configurations.

use std::ops::Deref;

use crate::error::{Result, VmcError};

/// A basis state: one discrete value (±1) per site, in raster order.
///
/// Configurations are immutable; moves produce new values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Configuration(Box<[i8]>);

impl Configuration {
    pub fn new(values: Vec<i8>) -> Self {
        Self(values.into_boxed_slice())
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.0
    }

    /// Copy with the given sites flipped.
    pub fn flipped(&self, sites: &[usize]) -> Self {
        let mut values = self.0.to_vec();
        for &site in sites {
            values[site] = -values[site];
        }
        Self::new(values)
    }

    /// Copy with the values at `i` and `j` exchanged.
    pub fn swapped(&self, i: usize, j: usize) -> Self {
        let mut values = self.0.to_vec();
        values.swap(i, j);
        Self::new(values)
    }

    /// Sum of site values (twice the total Sz for spin-1/2).
    pub fn magnetization(&self) -> i64 {
        self.0.iter().map(|&v| v as i64).sum()
    }
}

impl Deref for Configuration {
    type Target = [i8];

    fn deref(&self) -> &[i8] {
        &self.0
    }
}

impl From<Vec<i8>> for Configuration {
    fn from(values: Vec<i8>) -> Self {
        Self::new(values)
    }
}

/// An ordered batch of configurations with optional per-sample weights.
///
/// Order is significant: per-sample local energies and training weights are
/// aligned with it. Without explicit weights every sample weighs `1/len`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigurationBatch {
    configurations: Vec<Configuration>,
    weights: Option<Vec<f64>>,
}

impl ConfigurationBatch {
    pub fn new(configurations: Vec<Configuration>) -> Self {
        Self { configurations, weights: None }
    }

    pub fn with_weights(configurations: Vec<Configuration>, weights: Vec<f64>) -> Result<Self> {
        if weights.len() != configurations.len() {
            return Err(VmcError::shape("batch weights", configurations.len(), weights.len()));
        }
        Ok(Self { configurations, weights: Some(weights) })
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Weight of sample `i`, uniform when no weights were attached.
    pub fn weight(&self, i: usize) -> f64 {
        match &self.weights {
            Some(w) => w[i],
            None => 1.0 / self.configurations.len() as f64,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Configuration> {
        self.configurations.iter()
    }
}

impl<'a> IntoIterator for &'a ConfigurationBatch {
    type Item = &'a Configuration;
    type IntoIter = std::slice::Iter<'a, Configuration>;

    fn into_iter(self) -> Self::IntoIter {
        self.configurations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_and_swap_leave_original_untouched() {
        let c = Configuration::new(vec![1, -1, 1, 1]);
        let f = c.flipped(&[0, 3]);
        let s = c.swapped(0, 1);
        assert_eq!(c.as_slice(), &[1, -1, 1, 1]);
        assert_eq!(f.as_slice(), &[-1, -1, 1, -1]);
        assert_eq!(s.as_slice(), &[-1, 1, 1, 1]);
        assert_eq!(c.magnetization(), 2);
        assert_eq!(s.magnetization(), c.magnetization());
    }

    #[test]
    fn test_batch_weights() {
        let configs = vec![Configuration::new(vec![1]), Configuration::new(vec![-1])];
        let batch = ConfigurationBatch::new(configs.clone());
        assert_eq!(batch.weight(1), 0.5);

        let weighted = ConfigurationBatch::with_weights(configs.clone(), vec![0.25, 0.75]).unwrap();
        assert_eq!(weighted.weight(1), 0.75);

        assert!(ConfigurationBatch::with_weights(configs, vec![1.0]).is_err());
    }
}
