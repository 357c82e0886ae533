//! # comm-sync
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Keeps the communications default audio output mirrored to the console default.
//!
//! Windows tracks a separate default output per role. Voice apps follow the
//! *communications* default, everything else follows the *console* default,
//! and the two drift apart whenever a headset is plugged in. `comm-sync`
//! listens for console-default changes and applies the same device to the
//! communications role, with an operator toggle and manual overrides.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use comm_sync::{default_backend, default_log_path, FileLogSink, SyncService};
//!
//! let log_path = default_log_path().unwrap_or_else(|| "audio-sync.log".into());
//!
//! let service = SyncService::builder()
//!     .backend(default_backend()?)
//!     .add_log_sink(FileLogSink::open(log_path)?)
//!     .start()
//!     .await?;
//!
//! // Tray handlers
//! let menu = service.menu_snapshot().await?;
//! if let Some(pick) = menu.select(0) {
//!     service.submit(pick)?;
//! }
//! service.toggle_sync()?;
//!
//! service.stop().await?;
//! ```
//!
//! ## Architecture
//!
//! The crate maintains a strict thread boundary:
//!
//! - **OS notification thread**: translates the callback and enqueues, never blocks
//! - **Command queue**: one unbounded channel shared by notifications and operator commands
//! - **Serializer task**: applies events one at a time, in arrival order, on the blocking pool
//!
//! Every change to routing state and every call that sets a default happens
//! inside the serializer, so no two of them ever overlap.

// unsafe_code lint is configured in Cargo.toml as "deny" so the Windows backend can override it
#![warn(missing_docs)]
// HRESULTs travel as i32 and are printed as u32 hex
#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod config;
pub mod directory;
mod engine;
mod error;
mod event;
mod menu;
mod pipeline;
pub mod platform;
mod service;
mod sink;
mod subscriber;

pub use builder::SyncServiceBuilder;
pub use config::{FileLogConfig, SyncConfig};
pub use directory::{
    DataFlow, DefaultDeviceNotification, DeviceDirectory, DeviceEndpoint, EndpointBackend,
    EndpointInfo, MockBackend, NotificationCallback, NotificationRegistration, Role,
};
pub use engine::{RoutingState, SyncOutcome};
pub use error::{CommSyncError, EndpointError};
pub use event::DomainEvent;
pub use menu::{MenuDevice, MenuSnapshot};
pub use pipeline::CommandSender;
pub use platform::{default_backend, CpalBackend};
pub use service::SyncService;
pub use sink::{default_log_path, ChannelLogSink, FileLogSink, LogSink, TracingLogSink};
pub use subscriber::{translate_notification, NotificationSubscriber};

#[cfg(windows)]
pub use platform::wasapi::WasapiBackend;
