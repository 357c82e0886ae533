//! Event pipeline.
//!
//! Every event reaches the engine through one queue:
//!
//! ```text
//! OS callback thread ─┐
//!                      ├→ CommandSender → Serializer Task → SyncEngine → OS / log
//! UI thread(s) ───────┘
//! ```
//!
//! - **CommandSender**: Non-blocking, clonable, usable from any thread
//! - **Serializer**: Single consumer; applies one event at a time in arrival order
//!
//! Because only the serializer holds the engine, routing state has exactly one
//! writer no matter which thread an event came from.

mod serializer;

pub use serializer::CommandSender;
pub(crate) use serializer::{Command, CommandSerializer};
