//! Tokio mpsc channel log sink implementation.

use tokio::sync::mpsc;

use crate::sink::LogSink;

/// A sink that sends each log line to a tokio unbounded channel.
///
/// Useful for UI surfaces that display recent activity, and for tests.
/// Lines are dropped silently once the receiver is gone.
///
/// # Example
///
/// ```
/// use comm_sync::{ChannelLogSink, LogSink};
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::unbounded_channel::<String>();
/// let sink = ChannelLogSink::new(tx);
///
/// sink.log("Sync enabled");
/// assert_eq!(rx.try_recv().unwrap(), "Sync enabled");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelLogSink {
    name: String,
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelLogSink {
    /// Creates a new channel sink with the given sender.
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            name: "channel".to_string(),
            sender,
        }
    }

    /// Creates a new channel sink with a custom name.
    pub fn with_name(name: impl Into<String>, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }
}

impl LogSink for ChannelLogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&self, message: &str) {
        let _ = self.sender.send(message.to_string());
    }
}
