//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured bind address
//!     → listener.rs (parse, bind)
//!     → TcpListener owned by exactly one service actor
//! ```
//!
//! # Design Decisions
//! - Binding happens before the run group starts; a failure is fatal
//! - Listeners are released when their actor stops serving

pub mod listener;

pub use listener::{bind, ListenerError};
