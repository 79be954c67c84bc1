//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use hellosvc::config::HelloConfig;
use tokio::net::{TcpListener, TcpStream};

/// Default configuration with both listeners on ephemeral loopback ports.
pub fn local_config() -> HelloConfig {
    let mut config = HelloConfig::default();
    config.service.bind_address = "127.0.0.1:0".into();
    config.telemetry.bind_address = "127.0.0.1:0".into();
    config
}

pub async fn bind_local() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").await.unwrap()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll until something accepts connections on `addr`.
pub async fn wait_until_serving(addr: SocketAddr) {
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nothing is serving on {addr}");
}

pub async fn is_closed(addr: SocketAddr) -> bool {
    TcpStream::connect(addr).await.is_err()
}

/// Value of the sample of `name` carrying every label in `labels`.
/// Counters may be exposed with a `_total` suffix.
pub fn sample_value(exposition: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    let plain = format!("{name}{{");
    let total = format!("{name}_total{{");
    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| line.starts_with(&plain) || line.starts_with(&total))
        .find(|line| {
            labels
                .iter()
                .all(|(key, value)| line.contains(&format!("{key}=\"{value}\"")))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}
