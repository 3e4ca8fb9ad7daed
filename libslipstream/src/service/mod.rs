//! Service layer for Slipstream
//!
//! A clean, testable API for the resilience core that can be consumed by
//! multiple interfaces (mobile shells, TUIs, CLIs) without duplication.
//!
//! # Architecture
//!
//! The layer follows a facade pattern with `SlipstreamService` as the entry
//! point, coordinating specialized sub-services over explicitly injected
//! dependencies:
//!
//! - `QueueService`: the durable action queue (enqueue, drain, clear)
//! - `MutationService`: the optimistic toggle engine
//! - `EventBus`: progress event and notice distribution
//!
//! Construction is the init half of the lifecycle; [`SlipstreamService::dispose`]
//! is the teardown half and releases the storage backend.
//!
//! # Example
//!
//! ```no_run
//! use libslipstream::service::SlipstreamService;
//!
//! # async fn example() -> libslipstream::Result<()> {
//! let service = SlipstreamService::new().await?;
//!
//! let pending = service.queue().pending().await?;
//! println!("{} actions waiting", pending.len());
//!
//! service.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod mutations;
pub mod queue;

// Re-export commonly used types
pub use events::{Notice, NoticeKind};
pub use queue::DrainReport;

use self::events::EventBus;
use self::mutations::MutationService;
use self::queue::QueueService;
use crate::storage::{SqliteStorage, StorageBackend};
use crate::{Config, Result};
use std::sync::Arc;

/// Main service facade coordinating the queue and mutation sub-services.
///
/// All sub-services share one `Arc<dyn StorageBackend>` and one `EventBus`,
/// injected at construction. Nothing reaches for ambient globals.
pub struct SlipstreamService {
    storage: Arc<dyn StorageBackend>,
    queue: QueueService,
    mutations: MutationService,
    event_bus: EventBus,
}

impl SlipstreamService {
    /// Create a service with configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the
    /// database cannot be opened and migrated.
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    /// Create a service from a pre-built configuration, opening the SQLite
    /// backend at the configured path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn from_config(config: Config) -> Result<Self> {
        let db_path = crate::config::resolve_db_path(Some(&config.database.path))?;
        let db_path_str = db_path.to_str().ok_or_else(|| {
            crate::error::SlipstreamError::Config(crate::error::ConfigError::MissingField(
                "Invalid database path".to_string(),
            ))
        })?;
        let storage = SqliteStorage::new(db_path_str).await?;

        Ok(Self::with_storage(&config, Arc::new(storage)))
    }

    /// Create a service over an already-built storage backend.
    ///
    /// This is the seam for embedders bringing their own persistence and
    /// for tests running on [`crate::storage::MemoryStorage`].
    pub fn with_storage(config: &Config, storage: Arc<dyn StorageBackend>) -> Self {
        let event_bus = EventBus::new(100);

        let queue = QueueService::new(
            Arc::clone(&storage),
            &config.queue.namespace,
            event_bus.clone(),
        );
        let mutations = MutationService::new(queue.clone(), event_bus.clone());

        Self {
            storage,
            queue,
            mutations,
            event_bus,
        }
    }

    /// Access the durable action queue.
    pub fn queue(&self) -> &QueueService {
        &self.queue
    }

    /// Access the optimistic mutation engine.
    pub fn mutations(&self) -> &MutationService {
        &self.mutations
    }

    /// Access the storage backend directly.
    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    /// Subscribe to progress events and notices.
    pub fn subscribe(&self) -> events::EventReceiver {
        self.event_bus.subscribe()
    }

    /// Tear the service down, releasing the storage backend.
    ///
    /// Queue operations invoked after disposal fail storage-side and are
    /// swallowed per the usual policy; nothing panics.
    pub async fn dispose(&self) {
        self.storage.close().await;
    }
}
