//! OS signal handling.
//!
//! SIGINT and SIGTERM take part in the run group like any other actor: the
//! signal actor "finishes first" when one arrives, which stops the group.
//! On non-Unix platforms only Ctrl-C is observed.

use std::fmt;
use std::future::Future;

use crate::lifecycle::group::{Actor, ActorError};
use crate::lifecycle::shutdown::Shutdown;

/// Termination signals the service reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => write!(f, "SIGINT"),
            Signal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

#[cfg(unix)]
struct Subscription {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Subscription {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> std::io::Result<Signal> {
        tokio::select! {
            _ = self.interrupt.recv() => Ok(Signal::Interrupt),
            _ = self.terminate.recv() => Ok(Signal::Terminate),
        }
    }
}

#[cfg(not(unix))]
struct Subscription;

#[cfg(not(unix))]
impl Subscription {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> std::io::Result<Signal> {
        tokio::signal::ctrl_c().await?;
        Ok(Signal::Interrupt)
    }
}

/// Actor that returns an error when a termination signal arrives and
/// returns cleanly when interrupted.
///
/// The OS subscription is taken in [`SignalActor::new`] so that signals sent
/// right after construction are never missed, and released when `execute`
/// returns. Must be created inside a Tokio runtime.
pub struct SignalActor {
    subscription: Subscription,
    shutdown: Shutdown,
}

impl SignalActor {
    pub fn new() -> Result<Self, ActorError> {
        let subscription = Subscription::new().map_err(ActorError::SignalSetup)?;
        Ok(Self {
            subscription,
            shutdown: Shutdown::new(),
        })
    }
}

impl Actor for SignalActor {
    type Interrupter = Shutdown;

    fn name(&self) -> &'static str {
        "signals"
    }

    fn interrupter(&self) -> Shutdown {
        self.shutdown.clone()
    }

    fn execute(mut self) -> impl Future<Output = Result<(), ActorError>> + Send + 'static {
        async move {
            tokio::select! {
                signal = self.subscription.recv() => {
                    let signal = signal.map_err(ActorError::SignalSetup)?;
                    tracing::info!(signal = %signal, "Shutdown signal received");
                    Err(ActorError::Signal(signal))
                }
                _ = self.shutdown.triggered() => Ok(()),
            }
        }
    }
}
