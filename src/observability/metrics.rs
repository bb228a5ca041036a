//! Lookup Metrics
//!
//! Prometheus counters for lookup outcomes and credential rejections, and a
//! gauge of open streaming calls. Metrics are registered into a registry
//! owned by the caller, so independent server instances never collide.

use prometheus::{IntCounterVec, IntGauge, Opts, Registry};

use crate::error::LookupError;

const NAMESPACE: &str = "mccmnc_lookup";

/// Lookup service metrics
#[derive(Clone)]
pub struct LookupMetrics {
    /// Resolutions by method and outcome
    pub lookups: IntCounterVec,
    /// Calls rejected by the credential check, by reason
    pub auth_rejections: IntCounterVec,
    /// Streaming calls currently open
    pub active_streams: IntGauge,
}

impl LookupMetrics {
    /// Creates and registers the metrics
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let lookups = IntCounterVec::new(
            Opts::new("lookups_total", "Total resolutions").namespace(NAMESPACE),
            &["method", "outcome"],
        )?;
        registry.register(Box::new(lookups.clone()))?;

        let auth_rejections = IntCounterVec::new(
            Opts::new("auth_rejections_total", "Total calls rejected by the credential check")
                .namespace(NAMESPACE),
            &["reason"],
        )?;
        registry.register(Box::new(auth_rejections.clone()))?;

        let active_streams = IntGauge::with_opts(
            Opts::new("active_streams", "Streaming calls currently open").namespace(NAMESPACE),
        )?;
        registry.register(Box::new(active_streams.clone()))?;

        Ok(Self {
            lookups,
            auth_rejections,
            active_streams,
        })
    }

    /// Records one resolution
    pub fn record_lookup(&self, method: &str, found: bool) {
        let outcome = if found { "found" } else { "not_found" };
        self.lookups.with_label_values(&[method, outcome]).inc();
    }

    /// Records a credential rejection
    pub fn record_auth_rejection(&self, err: &LookupError) {
        self.auth_rejections
            .with_label_values(&[err.code().as_str()])
            .inc();
    }

    /// Marks a streaming call as open until the guard is dropped
    pub fn stream_opened(&self) -> StreamGuard {
        self.active_streams.inc();
        StreamGuard {
            gauge: self.active_streams.clone(),
        }
    }
}

/// Decrements the active stream gauge on drop
pub struct StreamGuard {
    gauge: IntGauge,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
