//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Bind listeners → Build actors → Group
//!
//! Run (group.rs):
//!     Spawn every actor → first to return wins → interrupt all → wait for all
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → signal actor returns → group shuts down
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, the group never runs
//! - Termination is total: one actor stopping stops every actor
//! - Only the first outcome is reported

pub mod group;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use group::{Actor, ActorError, Group, Interrupt};
pub use shutdown::Shutdown;
pub use signals::{Signal, SignalActor};
pub use startup::{prepare, Startup, StartupError};
