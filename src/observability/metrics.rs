//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (request count, size, latency)
//! - Install the Prometheus recorder once per process
//! - Expose the scrape endpoint router
//!
//! # Metrics
//! - `hellosvc_request_count` (counter): requests received by method, error
//! - `hellosvc_request_size` (counter): request body bytes by method, error
//! - `hellosvc_request_latency_microseconds` (histogram): handling time
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Explicit histogram buckets so latency renders as a histogram, not a summary

use std::sync::OnceLock;
use std::time::Duration;

use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

pub const REQUEST_COUNT: &str = "hellosvc_request_count";
pub const REQUEST_SIZE: &str = "hellosvc_request_size";
pub const REQUEST_LATENCY: &str = "hellosvc_request_latency_microseconds";

const LATENCY_MICROSECONDS: &[f64] = &[
    50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0, 25_000.0, 50_000.0,
    100_000.0, 250_000.0, 500_000.0, 1_000_000.0,
];

static RECORDER: OnceLock<Result<PrometheusHandle, String>> = OnceLock::new();

#[derive(Debug, Error)]
#[error("failed to install metrics recorder: {0}")]
pub struct TelemetryError(String);

/// Install the global Prometheus recorder.
///
/// Calling this again returns a handle to the already installed recorder.
pub fn install_recorder() -> Result<PrometheusHandle, TelemetryError> {
    RECORDER
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .set_buckets_for_metric(
                    Matcher::Full(REQUEST_LATENCY.to_string()),
                    LATENCY_MICROSECONDS,
                )
                .and_then(|builder| builder.install_recorder())
                .map_err(|e| e.to_string())?;
            describe_metrics();
            Ok(handle)
        })
        .clone()
        .map_err(TelemetryError)
}

fn describe_metrics() {
    describe_counter!(REQUEST_COUNT, "Total number of requests received.");
    describe_counter!(REQUEST_SIZE, "Size of requests received.");
    describe_histogram!(REQUEST_LATENCY, "Total duration of requests in microseconds.");
}

/// Record one handled request.
pub fn record_request(method: &'static str, failed: bool, size: u64, latency: Duration) {
    let labels = [("method", method.to_string()), ("error", failed.to_string())];

    counter!(REQUEST_COUNT, &labels).increment(1);
    counter!(REQUEST_SIZE, &labels).increment(size);
    histogram!(REQUEST_LATENCY, &labels).record(latency.as_micros() as f64);
}

/// Router serving the Prometheus exposition at `path`.
pub fn router(handle: PrometheusHandle, path: &str) -> Router {
    Router::new().route(path, get(move || std::future::ready(handle.render())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent() {
        let first = install_recorder().unwrap();
        let second = install_recorder().unwrap();

        record_request("unit_test", true, 7, Duration::from_micros(120));

        for handle in [first, second] {
            let rendered = handle.render();
            assert!(rendered.contains(REQUEST_COUNT));
            assert!(rendered.contains(REQUEST_LATENCY));
        }
    }
}
