//! In-process numeric provider backed by the complex arithmetic library

use super::scratch::ComplexBuf;
use super::{BackendError, NumericProvider, ProviderLoader};
use crate::complex::{self, Complex};
use std::future::Future;

/// Provider that runs every entry point on the local arithmetic library
#[derive(Debug, Default)]
pub struct NativeProvider;

impl NumericProvider for NativeProvider {
    fn complex_pow(&self, lhs: &ComplexBuf, rhs: &ComplexBuf, out: &mut ComplexBuf) -> Result<(), BackendError> {
        let z = complex::power(Complex::new(lhs[0], lhs[1]), Complex::new(rhs[0], rhs[1]));
        *out = [z.re, z.im];
        Ok(())
    }

    fn complex_sub(&self, lhs: &ComplexBuf, rhs: &ComplexBuf, out: &mut ComplexBuf) -> Result<(), BackendError> {
        *out = [lhs[0] - rhs[0], lhs[1] - rhs[1]];
        Ok(())
    }

    fn complex_abs(&self, z: &ComplexBuf) -> Result<f64, BackendError> {
        Ok(complex::magnitude(Complex::new(z[0], z[1])))
    }

    fn random_int(&self, min: f64, max: f64) -> Result<f64, BackendError> {
        complex::random_int(min, max)
            .map(|v| v as f64)
            .map_err(|e| BackendError::call("random_int", e))
    }
}

/// Loader for [`NativeProvider`]; never fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl ProviderLoader for NativeLoader {
    type Provider = NativeProvider;

    fn load(&self) -> impl Future<Output = Result<NativeProvider, BackendError>> + Send {
        async {
            tracing::debug!("Loading native numeric provider");
            Ok(NativeProvider)
        }
    }
}
