//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Bound listener
//!     → server.rs (service actor, axum serve loop)
//!     → request.rs (request ID)
//!     → hello.rs (dump the request, record metrics)
//!     → Send to client
//! ```

pub mod hello;
pub mod request;
pub mod server;

pub use hello::{dump_request, DumpError};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
