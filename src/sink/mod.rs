//! Log sink trait and implementations for the operator-facing activity log.
//!
//! A [`LogSink`] receives one human-readable line per decision the engine
//! makes ("Synced communication device → Headset"). The crate provides three
//! built-in sinks:
//!
//! - [`TracingLogSink`]: Forwards lines to `tracing` at info level
//! - [`ChannelLogSink`]: Sends lines to a tokio mpsc channel
//! - [`FileLogSink`]: Appends timestamped lines to a size-rotated file
//!
//! Logging is fire-and-forget: sinks swallow their own failures.

mod channel;
mod file;

pub use channel::ChannelLogSink;
pub use file::{default_log_path, FileLogSink};

use std::sync::Arc;

/// A destination for activity log lines.
///
/// # Implementation Notes
///
/// - `log` takes `&self`; use interior mutability if needed
/// - `log` is called from the serializer's blocking context and must not panic
/// - Failures must be handled inside the sink, never reported to the caller
///
/// # Example
///
/// ```
/// use comm_sync::LogSink;
///
/// struct StderrSink;
///
/// impl LogSink for StderrSink {
///     fn name(&self) -> &str {
///         "stderr"
///     }
///
///     fn log(&self, message: &str) {
///         eprintln!("{message}");
///     }
/// }
/// ```
pub trait LogSink: Send + Sync {
    /// Human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Appends one line to the log.
    fn log(&self, message: &str);
}

/// Forwards every line to `tracing::info!`.
///
/// This is the sink used when none is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn log(&self, message: &str) {
        tracing::info!(target: "comm_sync::activity", "{message}");
    }
}

/// Fan-out over every configured sink.
#[derive(Clone, Default)]
pub(crate) struct LogSinks {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl LogSinks {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        if sinks.is_empty() {
            return Self {
                sinks: vec![Arc::new(TracingLogSink)],
            };
        }
        Self { sinks }
    }

    pub fn log(&self, message: &str) {
        for sink in &self.sinks {
            sink.log(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<String>>,
    }

    impl LogSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn log(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(RecordingSink::default());
        let b = Arc::new(RecordingSink::default());
        let sinks = LogSinks::new(vec![a.clone(), b.clone()]);

        sinks.log("hello");

        assert_eq!(*a.lines.lock(), vec!["hello"]);
        assert_eq!(*b.lines.lock(), vec!["hello"]);
    }

    #[test]
    fn test_empty_fanout_defaults_to_tracing() {
        let sinks = LogSinks::new(Vec::new());
        assert_eq!(sinks.sinks.len(), 1);
        assert_eq!(sinks.sinks[0].name(), "tracing");
        sinks.log("does not panic");
    }

    #[test]
    fn test_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Arc<dyn LogSink>>();
    }
}
