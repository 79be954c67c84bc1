//! Hello service
//!
//! Echoes every HTTP request back to the caller and exposes request
//! telemetry for Prometheus on a separate port.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────── run group ────────────────────────────┐
//!                    │                                                                   │
//!   Client ─────────▶│  service actor    :8080   say_hello → dump request → 200 OK       │
//!                    │                                  │                                │
//!                    │                                  ▼ count / size / latency         │
//!   Prometheus ─────▶│  telemetry actor  :9100   /metrics                                │
//!                    │                                                                   │
//!   SIGINT/SIGTERM ─▶│  signal actor                                                     │
//!                    │                                                                   │
//!                    │  first actor to return → interrupt all → wait for all → exit     │
//!                    └───────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use hellosvc::config::{self, ConfigError, HelloConfig};
use hellosvc::lifecycle::{self, StartupError};
use hellosvc::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "hellosvc")]
#[command(about = "HTTP echo service with a Prometheus telemetry endpoint", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Application listener address, overrides `service.bind_address`
    #[arg(long)]
    http_addr: Option<String>,

    /// Telemetry listener address, overrides `telemetry.bind_address`
    #[arg(long)]
    metrics_addr: Option<String>,

    /// Log level, overrides `observability.log_level`
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    fn load_config(self) -> Result<HelloConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => HelloConfig::default(),
        };

        if let Some(addr) = self.http_addr {
            config.service.bind_address = addr;
        }
        if let Some(addr) = self.metrics_addr {
            config.telemetry.bind_address = addr;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        config::validated(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().load_config()?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!("hellosvc v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        service_address = %config.service.bind_address,
        telemetry_address = %config.telemetry.bind_address,
        telemetry_path = %config.telemetry.path,
        "Configuration loaded"
    );

    let telemetry = metrics::install_recorder()?;

    let startup = match lifecycle::prepare(&config, telemetry).await {
        Ok(startup) => startup,
        Err(e) => {
            match &e {
                StartupError::Listen { .. } => {
                    tracing::error!(transport = "HTTP", during = "Listen", err = %e, "Startup failed")
                }
                _ => tracing::error!(err = %e, "Startup failed"),
            }
            return Err(e.into());
        }
    };

    match startup.group.run().await {
        Ok(()) => tracing::info!(exit = "nil", "Shutdown complete"),
        Err(e) => tracing::info!(exit = %e, "Shutdown complete"),
    }

    Ok(())
}
