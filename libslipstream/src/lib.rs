//! Slipstream - offline resilience for social clients
//!
//! This library provides the durable action queue and optimistic mutation
//! engine that keep a social client responsive when the network is not.

pub mod config;
pub mod error;
pub mod logging;
pub mod remote;
pub mod replay;
pub mod service;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{RemoteError, Result, SlipstreamError};
pub use replay::ActionReplayer;
pub use storage::{MemoryStorage, SqliteStorage, StorageBackend};
pub use types::{ActionKind, QueuedAction, ToggleState};
