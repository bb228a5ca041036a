//! Observability Module
//!
//! Structured logging setup and Prometheus metrics for lookups.

pub mod metrics;
pub mod telemetry;

pub use metrics::{LookupMetrics, StreamGuard};
pub use telemetry::{init_tracing, TracingConfig};
