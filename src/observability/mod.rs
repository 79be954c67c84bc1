//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stderr/stdout)
//!     → Metrics endpoint on the telemetry listener (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
