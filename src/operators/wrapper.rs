//! Adapter for operators defined outside this crate.

use num_complex::Complex64;

use super::traits::{Connection, Operator};
use crate::error::{Result, VmcError};
use crate::hilbert::{Configuration, HilbertSpace};

/// A third-party operator exposing a `find_conn`-style interface on raw states.
pub trait ExternalOperator {
    /// Connected states and matrix elements, as two parallel vectors.
    fn find_conn(&self, state: &[i8]) -> (Vec<Vec<i8>>, Vec<Complex64>);
}

impl<F> ExternalOperator for F
where
    F: Fn(&[i8]) -> (Vec<Vec<i8>>, Vec<Complex64>),
{
    fn find_conn(&self, state: &[i8]) -> (Vec<Vec<i8>>, Vec<Complex64>) {
        self(state)
    }
}

/// Wraps an [`ExternalOperator`], validating everything crossing the seam.
pub struct OperatorWrapper<T> {
    inner: T,
    hilbert: HilbertSpace,
}

impl<T: ExternalOperator> OperatorWrapper<T> {
    pub fn new(inner: T, hilbert: HilbertSpace) -> Self {
        Self { inner, hilbert }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: ExternalOperator> Operator for OperatorWrapper<T> {
    fn hilbert(&self) -> &HilbertSpace {
        &self.hilbert
    }

    fn connected_configurations(&self, config: &Configuration) -> Result<Vec<Connection>> {
        self.hilbert.validate(config)?;
        let (states, elements) = self.inner.find_conn(config);
        if states.len() != elements.len() {
            return Err(VmcError::shape("external operator elements", states.len(), elements.len()));
        }
        states
            .into_iter()
            .zip(elements)
            .map(|(state, element)| {
                self.hilbert.validate(&state)?;
                Ok((Configuration::new(state), element))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Ising;

    #[test]
    fn test_wrapped_closure_matches_builtin() {
        let hilbert = HilbertSpace::chain(5, true).unwrap();
        let builtin = Ising::new(0.5).build(hilbert.clone());
        let reference = Ising::new(0.5).build(hilbert.clone());
        let wrapped = OperatorWrapper::new(
            move |state: &[i8]| {
                let connections = reference
                    .connected_configurations(&Configuration::new(state.to_vec()))
                    .unwrap_or_default();
                let (states, elements): (Vec<Vec<i8>>, Vec<Complex64>) = connections
                    .into_iter()
                    .map(|(c, e)| (c.as_slice().to_vec(), e))
                    .unzip();
                (states, elements)
            },
            hilbert.clone(),
        );

        for config in hilbert.all_configurations().unwrap() {
            assert_eq!(
                wrapped.connected_configurations(&config).unwrap(),
                builtin.connected_configurations(&config).unwrap()
            );
        }
    }

    #[test]
    fn test_rejects_malformed_output() {
        let hilbert = HilbertSpace::chain(3, true).unwrap();
        let short = OperatorWrapper::new(
            |_: &[i8]| (vec![vec![1, 1]], vec![Complex64::new(1.0, 0.0)]),
            hilbert.clone(),
        );
        let config = Configuration::new(vec![1, 1, 1]);
        assert!(matches!(
            short.connected_configurations(&config),
            Err(VmcError::InvalidConfigurationShape { .. })
        ));

        let unpaired = OperatorWrapper::new(|s: &[i8]| (vec![s.to_vec()], Vec::<Complex64>::new()), hilbert);
        assert!(matches!(
            unpaired.connected_configurations(&config),
            Err(VmcError::ShapeMismatch { .. })
        ));
    }
}
