//! Numeric Backend Adapter - complex arithmetic through an external provider
//!
//! Exposes the same operations as [`crate::complex`], but asynchronously and
//! delegated to a [`NumericProvider`] that is loaded once on first use.
//!
//! - Provider initialization is cached in a `tokio::sync::OnceCell`, so
//!   concurrent first callers await one load. A failed load is cached too;
//!   the adapter does not retry.
//! - Operands travel through a single [`ScratchPool`] guarded by a
//!   `tokio::sync::Mutex`. Calls are serialized on that lock, so callers may
//!   issue overlapping requests without corrupting each other's buffers.

pub mod native;
pub mod scratch;

pub use native::{NativeLoader, NativeProvider};
pub use scratch::{ComplexBuf, ScratchPool};

use crate::complex::{self, Complex, RangeError};
use std::future::Future;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Numeric provider failed to initialize: {0}")]
    Init(String),
    #[error("Provider call '{op}' failed: {reason}")]
    Call { op: &'static str, reason: String },
    #[error(transparent)]
    Range(#[from] RangeError),
}

impl BackendError {
    pub fn call(op: &'static str, reason: impl std::fmt::Display) -> Self {
        BackendError::Call { op, reason: reason.to_string() }
    }
}

/// Entry points of a compiled numeric provider
///
/// Buffers hold one complex number each as `[re, im]`.
pub trait NumericProvider: Send + Sync {
    fn complex_pow(&self, lhs: &ComplexBuf, rhs: &ComplexBuf, out: &mut ComplexBuf) -> Result<(), BackendError>;
    fn complex_sub(&self, lhs: &ComplexBuf, rhs: &ComplexBuf, out: &mut ComplexBuf) -> Result<(), BackendError>;
    fn complex_abs(&self, z: &ComplexBuf) -> Result<f64, BackendError>;
    fn random_int(&self, min: f64, max: f64) -> Result<f64, BackendError>;
}

/// Produces a ready provider; called at most once per [`Backend`]
pub trait ProviderLoader: Send + Sync {
    type Provider: NumericProvider;

    fn load(&self) -> impl Future<Output = Result<Self::Provider, BackendError>> + Send;
}

pub struct Backend<L: ProviderLoader> {
    loader: L,
    provider: OnceCell<Result<Arc<L::Provider>, BackendError>>,
    scratch: Mutex<ScratchPool>,
}

impl<L: ProviderLoader> Backend<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            provider: OnceCell::new(),
            scratch: Mutex::new(ScratchPool::new()),
        }
    }

    /// Load the provider on first call; later calls get the cached outcome
    pub async fn ensure_provider(&self) -> Result<Arc<L::Provider>, BackendError> {
        self.provider
            .get_or_init(|| async {
                tracing::info!("Initializing numeric provider");
                match self.loader.load().await {
                    Ok(provider) => {
                        tracing::info!("Numeric provider ready");
                        Ok(Arc::new(provider))
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Numeric provider failed to load");
                        Err(e)
                    }
                }
            })
            .await
            .clone()
    }

    /// Whether initialization has finished, successfully or not
    pub fn is_initialized(&self) -> bool {
        self.provider.initialized()
    }

    pub async fn power(&self, base: Complex, exponent: Complex) -> Result<Complex, BackendError> {
        let provider = self.ensure_provider().await?;
        let mut scratch = self.scratch.lock().await;
        scratch.binary(base, exponent, |lhs, rhs, out| provider.complex_pow(lhs, rhs, out))
    }

    pub async fn subtract(&self, a: Complex, b: Complex) -> Result<Complex, BackendError> {
        let provider = self.ensure_provider().await?;
        let mut scratch = self.scratch.lock().await;
        scratch.binary(a, b, |lhs, rhs, out| provider.complex_sub(lhs, rhs, out))
    }

    pub async fn magnitude(&self, z: Complex) -> Result<f64, BackendError> {
        let provider = self.ensure_provider().await?;
        let mut scratch = self.scratch.lock().await;
        scratch.unary(z, |buf| provider.complex_abs(buf))
    }

    /// Run `power` for each `(base, exponent)` in order
    ///
    /// The first failure aborts the batch; no partial results are returned.
    pub async fn batch_power(&self, requests: &[(Complex, Complex)]) -> Result<Vec<Complex>, BackendError> {
        let mut results = Vec::with_capacity(requests.len());
        for (i, &(base, exponent)) in requests.iter().enumerate() {
            match self.power(base, exponent).await {
                Ok(z) => results.push(z),
                Err(e) => {
                    tracing::warn!(index = i, total = requests.len(), error = %e, "Batch power aborted");
                    return Err(e);
                }
            }
        }
        Ok(results)
    }

    /// Uniform integer in [ceil(min), floor(max)], delegated to the provider
    ///
    /// Falls back to the local generator when the provider call fails or
    /// answers outside the range.
    pub async fn random_int(&self, min: f64, max: f64) -> Result<i64, BackendError> {
        let (lo, hi) = complex::int_range(min, max)?;
        let provider = self.ensure_provider().await?;

        match provider.random_int(min, max) {
            Ok(v) if v.fract() == 0.0 && v >= lo as f64 && v <= hi as f64 => Ok(v as i64),
            Ok(v) => {
                tracing::warn!(value = v, lo, hi, "Provider random_int out of range, using local generator");
                Ok(complex::random_int(min, max)?)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Provider random_int failed, using local generator");
                Ok(complex::random_int(min, max)?)
            }
        }
    }
}

static SHARED: OnceLock<Backend<NativeLoader>> = OnceLock::new();

/// Process-wide adapter over the native provider
pub fn shared() -> &'static Backend<NativeLoader> {
    SHARED.get_or_init(|| Backend::new(NativeLoader))
}
