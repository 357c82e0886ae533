//! Single-consumer task that gives every state mutation one total order.

use tokio::sync::{mpsc, oneshot};

use crate::engine::{RoutingState, SyncEngine, SyncOutcome};
use crate::{CommSyncError, DomainEvent};

/// Message accepted by the serializer task.
pub(crate) enum Command {
    /// Apply one event through the engine.
    Event(DomainEvent),
    /// Apply one event and report what the engine did with it.
    Apply(DomainEvent, oneshot::Sender<SyncOutcome>),
    /// Report the routing state after every earlier command has been applied.
    Snapshot(oneshot::Sender<RoutingState>),
    /// Refuse new commands, finish the ones already accepted, then exit.
    Stop,
}

/// Clonable handle for submitting events from any thread.
///
/// Submission never blocks, so it is safe to call from OS callback threads
/// and UI threads alike. Events are applied strictly in arrival order, one at
/// a time; nothing is coalesced or dropped. Once the serializer starts
/// stopping, submission fails with `ServiceStopped` instead.
///
/// # Example
///
/// ```ignore
/// let commands = service.commands();
/// std::thread::spawn(move || {
///     commands.toggle_sync().ok();
/// });
/// ```
#[derive(Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Queues `event` for the engine.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` once the serializer has exited.
    pub fn submit(&self, event: DomainEvent) -> Result<(), CommSyncError> {
        self.send(Command::Event(event))
    }

    /// Queues a [`DomainEvent::ToggleSync`].
    pub fn toggle_sync(&self) -> Result<(), CommSyncError> {
        self.submit(DomainEvent::ToggleSync)
    }

    /// Queues a [`DomainEvent::ManualSetCommDevice`] for `device_id`.
    pub fn set_comm_device(&self, device_id: impl Into<String>) -> Result<(), CommSyncError> {
        self.submit(DomainEvent::manual_set(device_id))
    }

    /// Queues `event` and waits for the engine to apply it.
    ///
    /// Use this where the caller needs the result, such as a UI reporting a
    /// failed manual pick. Ordering is the same as [`submit`](Self::submit).
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the serializer exits before applying it.
    pub async fn apply(&self, event: DomainEvent) -> Result<SyncOutcome, CommSyncError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Apply(event, tx))?;
        rx.await.map_err(|_| CommSyncError::ServiceStopped)
    }

    /// Returns `true` once the serializer no longer accepts events.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn send(&self, command: Command) -> Result<(), CommSyncError> {
        self.tx
            .send(command)
            .map_err(|_| CommSyncError::ServiceStopped)
    }
}

impl std::fmt::Debug for CommandSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSender")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Owns the engine and applies queued commands one at a time.
pub(crate) struct CommandSerializer {
    engine: SyncEngine,
}

impl CommandSerializer {
    pub fn new(engine: SyncEngine) -> Self {
        Self { engine }
    }

    /// Runs until every sender is dropped, or `Stop` is received and the
    /// commands accepted before it are done.
    ///
    /// Endpoint calls block, so each event runs on the blocking pool; the
    /// engine moves into that call and back, and the next command is not
    /// received until it returns.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Command>) {
        let mut engine = self.engine;

        while let Some(command) = rx.recv().await {
            match command {
                Command::Event(event) => match Self::apply(engine, event).await {
                    Some((returned, outcome)) => {
                        engine = returned;
                        tracing::debug!(?outcome, "event applied");
                    }
                    None => return,
                },
                Command::Apply(event, reply) => match Self::apply(engine, event).await {
                    Some((returned, outcome)) => {
                        engine = returned;
                        tracing::debug!(?outcome, "event applied");
                        let _ = reply.send(outcome);
                    }
                    None => return,
                },
                Command::Snapshot(reply) => {
                    let _ = reply.send(engine.state().clone());
                }
                // Senders now get ServiceStopped; recv() drains what was
                // already accepted and then yields None
                Command::Stop => rx.close(),
            }
        }

        tracing::debug!("command serializer stopped");
    }

    async fn apply(mut engine: SyncEngine, event: DomainEvent) -> Option<(SyncEngine, SyncOutcome)> {
        let task = tokio::task::spawn_blocking(move || {
            let outcome = engine.handle(event);
            (engine, outcome)
        });
        match task.await {
            Ok(applied) => Some(applied),
            Err(e) => {
                tracing::error!(error = %e, "sync engine task failed, serializer exiting");
                None
            }
        }
    }
}
