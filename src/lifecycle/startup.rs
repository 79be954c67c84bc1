//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the service and telemetry listeners
//! - Subscribe to OS signals
//! - Assemble the run group
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Everything that can fail happens here, before the group runs

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;

use crate::config::HelloConfig;
use crate::http::{hello, HttpServer};
use crate::lifecycle::group::{ActorError, Group};
use crate::lifecycle::signals::SignalActor;
use crate::net::{self, ListenerError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{transport} listener: {source}")]
    Listen {
        transport: &'static str,
        #[source]
        source: ListenerError,
    },

    #[error(transparent)]
    Signals(#[from] ActorError),

    #[error("failed to read bound address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// A group ready to run, with the addresses its listeners are bound to.
pub struct Startup {
    pub group: Group,
    pub service_addr: SocketAddr,
    pub telemetry_addr: SocketAddr,
}

/// Bind both listeners and build the service, telemetry, and signal actors.
pub async fn prepare(
    config: &HelloConfig,
    telemetry: PrometheusHandle,
) -> Result<Startup, StartupError> {
    let service = bind_server(
        "service",
        &config.service.bind_address,
        hello::router(&config.limits),
    )
    .await?;
    let telemetry = bind_server(
        "telemetry",
        &config.telemetry.bind_address,
        metrics::router(telemetry, &config.telemetry.path),
    )
    .await?;
    let signals = SignalActor::new()?;

    let drain_timeout = Duration::from_secs(config.limits.shutdown_timeout_secs);
    let service = service.with_drain_timeout(drain_timeout);
    let telemetry = telemetry.with_drain_timeout(drain_timeout);

    let service_addr = service.local_addr().map_err(StartupError::LocalAddr)?;
    let telemetry_addr = telemetry.local_addr().map_err(StartupError::LocalAddr)?;

    let mut group = Group::new();
    group.add_actor(service);
    group.add_actor(telemetry);
    group.add_actor(signals);

    Ok(Startup {
        group,
        service_addr,
        telemetry_addr,
    })
}

async fn bind_server(
    transport: &'static str,
    address: &str,
    router: axum::Router,
) -> Result<HttpServer, StartupError> {
    let listener = net::bind(address)
        .await
        .map_err(|source| StartupError::Listen { transport, source })?;
    Ok(HttpServer::new(transport, listener, router))
}
