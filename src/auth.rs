//! Bearer token gate.
//!
//! Runs as a tonic interceptor in front of every RPC, so unary and streaming
//! calls are checked exactly once, at call setup, before any lookup work.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tonic::metadata::MetadataMap;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing::warn;

use crate::error::LookupError;
use crate::observability::LookupMetrics;

/// Metadata key carrying the credential.
pub const AUTHORIZATION: &str = "authorization";

/// Scheme prefix stripped before comparison.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Validates the shared bearer token on inbound calls.
#[derive(Clone)]
pub struct AuthGate {
    expected: Arc<str>,
    metrics: Option<LookupMetrics>,
}

impl AuthGate {
    /// Creates a gate accepting exactly `token`.
    pub fn new(token: impl Into<String>) -> Self {
        let token: String = token.into();
        Self {
            expected: Arc::from(token),
            metrics: None,
        }
    }

    /// Counts rejections into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: LookupMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Checks the `authorization` entry of `metadata`.
    ///
    /// # Errors
    ///
    /// - [`LookupError::MissingCredential`] if the entry is absent
    /// - [`LookupError::InvalidCredential`] if the token does not match
    pub fn validate(&self, metadata: &MetadataMap) -> Result<(), LookupError> {
        let value = metadata
            .get(AUTHORIZATION)
            .ok_or(LookupError::MissingCredential)?;
        let value = value.to_str().map_err(|_| LookupError::InvalidCredential)?;
        let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value);

        if bool::from(token.as_bytes().ct_eq(self.expected.as_bytes())) {
            Ok(())
        } else {
            Err(LookupError::InvalidCredential)
        }
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

impl Interceptor for AuthGate {
    fn call(&mut self, request: Request<()>) -> Result<Request<()>, Status> {
        match self.validate(request.metadata()) {
            Ok(()) => Ok(request),
            Err(err) => {
                warn!(error_code = err.code().as_str(), "Call rejected by credential check");
                if let Some(metrics) = &self.metrics {
                    metrics.record_auth_rejection(&err);
                }
                Err(err.to_status())
            }
        }
    }
}
