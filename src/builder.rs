//! Builder pattern for `SyncService`.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::directory::{DeviceDirectory, EndpointBackend, Role};
use crate::engine::SyncEngine;
use crate::pipeline::{CommandSender, CommandSerializer};
use crate::service::SyncService;
use crate::sink::{LogSink, LogSinks};
use crate::subscriber::NotificationSubscriber;
use crate::{CommSyncError, DomainEvent, SyncConfig};

impl SyncService {
    /// Creates a new builder.
    pub fn builder() -> SyncServiceBuilder {
        SyncServiceBuilder::new()
    }
}

/// Builder for configuring and starting the sync service.
///
/// # Example
///
/// ```ignore
/// use comm_sync::{default_backend, FileLogSink, SyncService, TracingLogSink};
///
/// let service = SyncService::builder()
///     .backend(default_backend()?)
///     .add_log_sink(TracingLogSink)
///     .add_log_sink(FileLogSink::open("audio-sync.log")?)
///     .start()
///     .await?;
/// ```
#[must_use]
pub struct SyncServiceBuilder {
    backend: Option<Arc<dyn EndpointBackend>>,
    log_sinks: Vec<Arc<dyn LogSink>>,
    config: SyncConfig,
}

impl Default for SyncServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            backend: None,
            log_sinks: Vec::new(),
            config: SyncConfig::default(),
        }
    }

    /// Sets the endpoint backend.
    ///
    /// Default: [`default_backend()`](crate::default_backend)
    pub fn backend(mut self, backend: Arc<dyn EndpointBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Adds a sink for activity log lines.
    ///
    /// With no sink configured, lines go to [`TracingLogSink`](crate::TracingLogSink).
    pub fn add_log_sink<S: LogSink + 'static>(mut self, sink: S) -> Self {
        self.log_sinks.push(Arc::new(sink));
        self
    }

    /// Adds an already shared log sink.
    pub fn add_shared_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sinks.push(sink);
        self
    }

    /// Set custom service configuration.
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the service.
    ///
    /// Registration failure for OS notifications is not fatal: it is logged
    /// and the service runs without live synchronization (see
    /// [`SyncService::is_live`]).
    ///
    /// # Errors
    ///
    /// Returns an error if no backend was set and none exists for this
    /// platform.
    pub async fn start(self) -> Result<SyncService, CommSyncError> {
        let backend = match self.backend {
            Some(backend) => backend,
            None => crate::platform::default_backend()?,
        };
        let log = LogSinks::new(self.log_sinks);

        let engine = SyncEngine::new(Arc::clone(&backend), log.clone(), &self.config);
        let (tx, rx) = mpsc::unbounded_channel();
        let commands = CommandSender::new(tx);
        let serializer = tokio::spawn(CommandSerializer::new(engine).run(rx));

        // Before registering, so no device change can be logged ahead of it
        log.log("AudioSync started");

        let subscriber = match NotificationSubscriber::subscribe(backend.as_ref(), commands.clone()) {
            Ok(subscriber) => Some(subscriber),
            Err(e) => {
                tracing::warn!(backend = backend.name(), error = %e, "running without live synchronization");
                log.log(&format!(
                    "Failed to register for device notifications ({e}), continuing without live sync"
                ));
                None
            }
        };

        let directory = DeviceDirectory::new(Arc::clone(&backend));
        if self.config.sync_on_start {
            let lookup = directory.clone();
            let current = tokio::task::spawn_blocking(move || lookup.default_endpoint(Role::Console))
                .await
                .ok()
                .flatten();
            match current {
                Some(device_id) => commands.submit(DomainEvent::console_changed(device_id))?,
                None => tracing::info!("no console default at startup, nothing to align"),
            }
        }

        Ok(SyncService::new(commands, serializer, subscriber, directory, log))
    }
}
