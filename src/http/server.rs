//! Listener-bound HTTP service actor.
//!
//! # Responsibilities
//! - Own one bound listener and the router served on it
//! - Serve until interrupted, then stop accepting and release the listener
//! - Bound the drain of open connections once interrupted
//! - Take part in the run group as an [`Actor`]

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::lifecycle::{Actor, ActorError, Shutdown};

/// Drain deadline used unless [`HttpServer::with_drain_timeout`] says otherwise.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP server bound to a single listener.
pub struct HttpServer {
    name: &'static str,
    listener: TcpListener,
    router: Router,
    shutdown: Shutdown,
    drain_timeout: Duration,
}

impl HttpServer {
    /// Wrap an already bound listener. Nothing is served until `execute`.
    pub fn new(name: &'static str, listener: TcpListener, router: Router) -> Self {
        Self {
            name,
            listener,
            router,
            shutdown: Shutdown::new(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// How long open connections may keep `execute` running after an interrupt.
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }
}

impl Actor for HttpServer {
    type Interrupter = Shutdown;

    fn name(&self) -> &'static str {
        self.name
    }

    fn interrupter(&self) -> Shutdown {
        self.shutdown.clone()
    }

    fn execute(self) -> impl Future<Output = Result<(), ActorError>> + Send + 'static {
        let HttpServer {
            name,
            listener,
            router,
            shutdown,
            drain_timeout,
        } = self;

        async move {
            let addr = listener
                .local_addr()
                .map_err(|source| ActorError::Serve { actor: name, source })?;
            tracing::info!(transport = "HTTP", actor = name, addr = %addr, "Serving");

            let notice = shutdown.clone();
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { notice.triggered().await })
                .into_future();
            let deadline = async move {
                shutdown.triggered().await;
                tokio::time::sleep(drain_timeout).await;
            };

            // axum retries accept errors on its own, so serve only returns once
            // the graceful shutdown has closed the listener and drained.
            tokio::select! {
                _ = serve => {
                    tracing::info!(transport = "HTTP", actor = name, addr = %addr, "Stopped serving");
                }
                _ = deadline => {
                    tracing::warn!(
                        transport = "HTTP",
                        actor = name,
                        addr = %addr,
                        drain_timeout = ?drain_timeout,
                        "Connection drain timed out, abandoning open connections"
                    );
                }
            }
            Ok(())
        }
    }
}
