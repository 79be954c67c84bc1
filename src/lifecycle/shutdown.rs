//! One-shot cancellation notice shared between an actor and the group.

use std::sync::Arc;
use tokio::sync::watch;

use crate::lifecycle::group::{ActorError, Interrupt};

/// A one-shot notice that any number of tasks can wait on.
///
/// Backed by a watch channel so that tasks which start waiting after the
/// notice has fired still observe it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create a notice that has not fired yet.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the notice.
    ///
    /// Returns `true` only for the call that actually fired it; every later
    /// (or racing) call is a no-op returning `false`.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    /// Whether the notice has fired.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the notice fires.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns once fired.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt for Shutdown {
    fn interrupt(&self, _cause: Option<&ActorError>) {
        self.trigger();
    }
}
