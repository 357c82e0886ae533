//! Sync service: the process-scoped context object.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::directory::{DeviceDirectory, Role};
use crate::engine::{RoutingState, SyncOutcome};
use crate::menu::MenuSnapshot;
use crate::pipeline::{Command, CommandSender};
use crate::sink::LogSinks;
use crate::subscriber::NotificationSubscriber;
use crate::{CommSyncError, DomainEvent};

/// Handle to a running sync service.
///
/// The `SyncService` is returned by [`SyncServiceBuilder::start()`] and owns
/// every piece of the running core: the notification subscription, the
/// serializer task and the device directory.
///
/// # Lifecycle
///
/// 1. Created by [`SyncServiceBuilder::start()`]
/// 2. OS notifications and operator commands flow through one queue
/// 3. Call [`stop()`](SyncService::stop) for graceful shutdown
/// 4. Dropping the `SyncService` still unregisters and stops the serializer
///    (but prefer explicit `stop()`)
///
/// # Example
///
/// ```ignore
/// let service = SyncService::builder()
///     .backend(comm_sync::default_backend()?)
///     .start()
///     .await?;
///
/// // From a tray click handler:
/// service.toggle_sync()?;
///
/// service.stop().await?;
/// ```
///
/// [`SyncServiceBuilder::start()`]: crate::SyncServiceBuilder::start
pub struct SyncService {
    commands: CommandSender,
    serializer: Option<JoinHandle<()>>,
    subscriber: Option<NotificationSubscriber>,
    directory: DeviceDirectory,
    log: LogSinks,
}

impl SyncService {
    pub(crate) fn new(
        commands: CommandSender,
        serializer: JoinHandle<()>,
        subscriber: Option<NotificationSubscriber>,
        directory: DeviceDirectory,
        log: LogSinks,
    ) -> Self {
        Self {
            commands,
            serializer: Some(serializer),
            subscriber,
            directory,
            log,
        }
    }

    /// Returns a clonable handle for submitting events from any thread.
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Queues a toggle of automatic synchronization.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the serializer has exited.
    pub fn toggle_sync(&self) -> Result<(), CommSyncError> {
        self.commands.toggle_sync()
    }

    /// Queues a manual communications-device pick.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the serializer has exited.
    pub fn set_comm_device(&self, device_id: impl Into<String>) -> Result<(), CommSyncError> {
        self.commands.set_comm_device(device_id)
    }

    /// Queues an arbitrary event.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the serializer has exited.
    pub fn submit(&self, event: DomainEvent) -> Result<(), CommSyncError> {
        self.commands.submit(event)
    }

    /// Queues an event and waits for its outcome.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the serializer has exited.
    pub async fn apply(&self, event: DomainEvent) -> Result<SyncOutcome, CommSyncError> {
        self.commands.apply(event).await
    }

    /// Returns the routing state after every previously submitted event has
    /// been applied.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the serializer has exited.
    pub async fn routing_state(&self) -> Result<RoutingState, CommSyncError> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| CommSyncError::ServiceStopped)
    }

    /// Returns the device directory.
    pub fn directory(&self) -> &DeviceDirectory {
        &self.directory
    }

    /// Enumerates devices and captures everything a menu render needs.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the serializer has exited.
    pub async fn menu_snapshot(&self) -> Result<MenuSnapshot, CommSyncError> {
        let state = self.routing_state().await?;
        let directory = self.directory.clone();
        let (comm_device_id, endpoints) = tokio::task::spawn_blocking(move || {
            (
                directory.default_endpoint(Role::Communications),
                directory.list_active_render_endpoints(),
            )
        })
        .await
        .map_err(|e| CommSyncError::backend_unavailable(format!("device query task failed: {e}")))?;

        Ok(MenuSnapshot::new(state.sync_enabled, comm_device_id, endpoints))
    }

    /// Returns `true` if OS notifications are being received.
    ///
    /// `false` means the service runs degraded: operator commands still work,
    /// but console changes are not picked up automatically.
    pub fn is_live(&self) -> bool {
        self.subscriber
            .as_ref()
            .is_some_and(NotificationSubscriber::is_registered)
    }

    /// Gracefully stops the service.
    ///
    /// This will:
    /// 1. Unregister from OS notifications
    /// 2. Apply every event already queued
    /// 3. Stop the serializer task and wait for it
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown fails.
    pub async fn stop(mut self) -> Result<(), CommSyncError> {
        self.stop_internal().await
    }

    async fn stop_internal(&mut self) -> Result<(), CommSyncError> {
        self.unregister();

        let Some(handle) = self.serializer.take() else {
            // Already stopped
            return Ok(());
        };

        let _ = self.commands.send(Command::Stop);
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "serializer task ended abnormally");
        }

        self.log.log("AudioSync stopped");
        Ok(())
    }

    fn unregister(&mut self) {
        if let Some(mut subscriber) = self.subscriber.take() {
            if let Err(e) = subscriber.unregister() {
                self.log
                    .log(&format!("Failed to unregister device notifications: {e}"));
            }
        }
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        if self.serializer.is_some() {
            // Dropped without explicit stop() - unregister first, then let the
            // serializer drain in the background
            self.unregister();
            let _ = self.commands.send(Command::Stop);
        }
    }
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("live", &self.is_live())
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}
