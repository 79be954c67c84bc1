//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, paths, and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HelloConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::HelloConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("service and telemetry cannot both bind {0}")]
    SharedAddress(String),

    #[error("telemetry.path must start with '/', got {0:?}")]
    InvalidPath(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("observability.log_level: unknown level {0:?}")]
    UnknownLogLevel(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &HelloConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let service = parse_address(
        "service.bind_address",
        &config.service.bind_address,
        &mut errors,
    );
    let telemetry = parse_address(
        "telemetry.bind_address",
        &config.telemetry.bind_address,
        &mut errors,
    );

    if let (Some(service), Some(telemetry)) = (service, telemetry) {
        // port 0 asks the OS for a fresh port, so it never collides
        if service == telemetry && service.port() != 0 {
            errors.push(ValidationError::SharedAddress(service.to_string()));
        }
    }

    if !config.telemetry.path.starts_with('/') {
        errors.push(ValidationError::InvalidPath(config.telemetry.path.clone()));
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero("limits.max_body_size"));
    }
    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("limits.request_timeout_secs"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn parse_address(
    field: &'static str,
    value: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<SocketAddr> {
    match value.parse() {
        Ok(addr) => Some(addr),
        Err(_) => {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}
