//! Hello service library: an HTTP echo service and its telemetry endpoint,
//! run as a group of actors that start together and stop together.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::HelloConfig;
pub use http::HttpServer;
pub use lifecycle::{Actor, ActorError, Group, Shutdown, SignalActor};
