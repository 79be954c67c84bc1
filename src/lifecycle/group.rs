//! Run group coordinator.
//!
//! Every registered actor runs concurrently. The first one to return, with
//! or without an error, decides the outcome of the whole group: all actors
//! are interrupted and the group waits for every one of them to finish
//! before handing that first outcome back.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::task::{Id, JoinError, JoinSet};

use crate::lifecycle::signals::Signal;

/// The `execute` half of an actor, boxed so heterogeneous actors share a queue.
pub type Execute = Pin<Box<dyn Future<Output = Result<(), ActorError>> + Send>>;

type InterruptFn = Box<dyn Fn(Option<&ActorError>) + Send + Sync>;

/// Reasons an actor stopped.
#[derive(Debug, Error)]
pub enum ActorError {
    /// A service actor could not use its listener. Accept errors are retried
    /// by axum and never end up here.
    #[error("{actor} stopped serving: {source}")]
    Serve {
        actor: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("received signal {0}")]
    Signal(Signal),

    #[error("failed to subscribe to OS signals: {0}")]
    SignalSetup(#[source] std::io::Error),

    #[error("actor {actor} panicked")]
    Panicked { actor: &'static str },

    /// The actor's task was cancelled from outside. The group never aborts
    /// its tasks, so this only happens while the runtime itself shuts down.
    #[error("actor {actor} was aborted")]
    Aborted { actor: &'static str },

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Stops a running actor. Must be safe to call any number of times,
/// including after the actor has already returned.
pub trait Interrupt: Send + Sync + 'static {
    fn interrupt(&self, cause: Option<&ActorError>);
}

/// A long running unit of work that can be told to stop.
pub trait Actor: Send + 'static {
    type Interrupter: Interrupt;

    /// Name used in logs and in panic reports.
    fn name(&self) -> &'static str;

    /// Handle that interrupts this actor once `execute` has taken ownership of it.
    fn interrupter(&self) -> Self::Interrupter;

    /// Run until finished, failed, or interrupted.
    fn execute(self) -> impl Future<Output = Result<(), ActorError>> + Send + 'static;
}

struct Member {
    name: &'static str,
    execute: Execute,
    interrupt: InterruptFn,
}

/// A set of actors that live and die together.
#[derive(Default)]
pub struct Group {
    members: Vec<Member>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor from its two halves. Nothing runs until [`Group::run`].
    pub fn add<F, I>(&mut self, name: &'static str, execute: F, interrupt: I)
    where
        F: Future<Output = Result<(), ActorError>> + Send + 'static,
        I: Fn(Option<&ActorError>) + Send + Sync + 'static,
    {
        self.members.push(Member {
            name,
            execute: Box::pin(execute),
            interrupt: Box::new(interrupt),
        });
    }

    /// Register an [`Actor`].
    pub fn add_actor<A: Actor>(&mut self, actor: A) {
        let name = actor.name();
        let interrupter = actor.interrupter();
        self.add(name, actor.execute(), move |cause| {
            interrupter.interrupt(cause)
        });
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Run every actor and return the outcome of whichever finishes first.
    ///
    /// Returns only after all actors have returned. Outcomes of actors that
    /// stop after the first one are discarded. An empty group returns `Ok(())`.
    pub async fn run(self) -> Result<(), ActorError> {
        let total = self.members.len();
        if total == 0 {
            tracing::debug!("Run group has no actors");
            return Ok(());
        }

        let mut names = HashMap::with_capacity(total);
        let mut interrupts = Vec::with_capacity(total);
        let mut running = JoinSet::new();

        for Member { name, execute, interrupt } in self.members {
            let handle = running.spawn(execute);
            names.insert(handle.id(), name);
            interrupts.push(interrupt);
        }

        tracing::debug!(actors = total, "Run group started");

        let outcome = match running.join_next_with_id().await {
            Some(completion) => {
                let (name, outcome) = settle(completion, &names);
                match &outcome {
                    Ok(()) => tracing::info!(actor = name, "Actor finished, interrupting group"),
                    Err(e) => tracing::info!(actor = name, err = %e, "Actor failed, interrupting group"),
                }
                outcome
            }
            None => Ok(()),
        };

        for interrupt in &interrupts {
            interrupt(outcome.as_ref().err());
        }

        while let Some(completion) = running.join_next_with_id().await {
            let (name, discarded) = settle(completion, &names);
            tracing::debug!(
                actor = name,
                discarded = ?discarded.err(),
                "Actor stopped ({}/{})",
                total - running.len(),
                total
            );
        }

        outcome
    }
}

fn settle(
    completion: Result<(Id, Result<(), ActorError>), JoinError>,
    names: &HashMap<Id, &'static str>,
) -> (&'static str, Result<(), ActorError>) {
    let name_of = |id: Id| names.get(&id).copied().unwrap_or("unknown");

    match completion {
        Ok((id, result)) => (name_of(id), result),
        Err(err) => {
            let actor = name_of(err.id());
            if err.is_panic() {
                (actor, Err(ActorError::Panicked { actor }))
            } else {
                (actor, Err(ActorError::Aborted { actor }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn other(msg: &str) -> ActorError {
        ActorError::Other(msg.into())
    }

    /// Adds an actor that blocks until interrupted, then returns `on_stop`.
    fn add_waiting(
        group: &mut Group,
        name: &'static str,
        interrupted: Arc<AtomicUsize>,
        completed: Arc<AtomicUsize>,
        on_stop: fn() -> Result<(), ActorError>,
    ) {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();
        group.add(
            name,
            async move {
                waiter.triggered().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
                completed.fetch_add(1, Ordering::SeqCst);
                on_stop()
            },
            move |_| {
                interrupted.fetch_add(1, Ordering::SeqCst);
                shutdown.trigger();
            },
        );
    }

    #[tokio::test]
    async fn empty_group_returns_ok() {
        let group = Group::new();
        assert!(group.is_empty());
        assert!(group.run().await.is_ok());
    }

    #[tokio::test]
    async fn first_error_interrupts_everyone() {
        let interrupted = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut group = Group::new();
        for name in ["a", "b", "c"] {
            add_waiting(&mut group, name, interrupted.clone(), completed.clone(), || Ok(()));
        }
        let failing_interrupted = interrupted.clone();
        group.add("failing", async { Err(other("boom")) }, move |_| {
            failing_interrupted.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(group.len(), 4);

        let outcome = tokio::time::timeout(Duration::from_secs(2), group.run())
            .await
            .expect("group did not shut down");

        assert_eq!(outcome.unwrap_err().to_string(), "boom");
        assert_eq!(interrupted.load(Ordering::SeqCst), 4);
        assert_eq!(completed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_only_after_every_actor_completed() {
        let interrupted = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut group = Group::new();
        for name in ["a", "b", "c", "d", "e"] {
            add_waiting(&mut group, name, interrupted.clone(), completed.clone(), || Ok(()));
        }
        let done = completed.clone();
        group.add(
            "finisher",
            async move {
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            |_| {},
        );

        assert!(group.run().await.is_ok());
        assert_eq!(completed.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn later_errors_are_discarded() {
        let interrupted = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut group = Group::new();
        for name in ["a", "b"] {
            add_waiting(&mut group, name, interrupted.clone(), completed.clone(), || {
                Err(ActorError::Other("late".into()))
            });
        }
        group.add("first", async { Err(other("first")) }, |_| {});

        let err = group.run().await.unwrap_err();
        assert_eq!(err.to_string(), "first");
        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn successful_first_actor_wins_over_late_errors() {
        let interrupted = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut group = Group::new();
        add_waiting(&mut group, "a", interrupted.clone(), completed.clone(), || {
            Err(ActorError::Other("late".into()))
        });
        group.add("done", async { Ok(()) }, |_| {});

        assert!(group.run().await.is_ok());
        assert_eq!(interrupted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn interrupt_receives_outcome() {
        let causes = Arc::new(Mutex::new(Vec::new()));

        let mut group = Group::new();
        for name in ["a", "b"] {
            let shutdown = Shutdown::new();
            let waiter = shutdown.clone();
            let causes = causes.clone();
            group.add(
                name,
                async move {
                    waiter.triggered().await;
                    Ok(())
                },
                move |cause| {
                    causes.lock().unwrap().push(cause.map(|e| e.to_string()));
                    shutdown.trigger();
                },
            );
        }
        group.add("failing", async { Err(other("kaput")) }, |_| {});

        let _ = group.run().await;
        let causes = causes.lock().unwrap();
        assert_eq!(causes.len(), 2);
        assert!(causes.iter().all(|c| c.as_deref() == Some("kaput")));
    }

    #[tokio::test]
    async fn panicking_actor_shuts_the_group_down() {
        let interrupted = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut group = Group::new();
        add_waiting(&mut group, "a", interrupted.clone(), completed.clone(), || Ok(()));
        group.add("panicky", async { panic!("panic") }, |_| {});

        let err = group.run().await.unwrap_err();
        assert!(matches!(err, ActorError::Panicked { actor: "panicky" }));
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_task_settles_as_aborted() {
        let mut running = JoinSet::new();
        let handle = running.spawn(async {
            std::future::pending::<()>().await;
            Ok(())
        });
        let names = HashMap::from([(handle.id(), "cancelled")]);
        handle.abort();

        let completion = running.join_next_with_id().await.unwrap();
        let (name, outcome) = settle(completion, &names);

        assert_eq!(name, "cancelled");
        assert!(matches!(
            outcome,
            Err(ActorError::Aborted { actor: "cancelled" })
        ));
    }

    struct Sleeper {
        shutdown: Shutdown,
    }

    impl Actor for Sleeper {
        type Interrupter = Shutdown;

        fn name(&self) -> &'static str {
            "sleeper"
        }

        fn interrupter(&self) -> Shutdown {
            self.shutdown.clone()
        }

        fn execute(self) -> impl Future<Output = Result<(), ActorError>> + Send + 'static {
            async move {
                self.shutdown.triggered().await;
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn add_actor_wires_the_interrupter() {
        let shutdown = Shutdown::new();
        let mut group = Group::new();
        group.add_actor(Sleeper {
            shutdown: shutdown.clone(),
        });
        group.add("failing", async { Err(other("stop")) }, |_| {});

        let outcome = tokio::time::timeout(Duration::from_secs(1), group.run())
            .await
            .expect("sleeper was not interrupted");
        assert!(outcome.is_err());
        assert!(shutdown.is_triggered());
    }
}
