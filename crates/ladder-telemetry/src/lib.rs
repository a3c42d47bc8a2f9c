//! Prometheus metrics and structured logging for the ladder gatekeeper.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters for gate blocks, admitted entries and lookup timeouts

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
