//! Durable FIFO queue of user actions awaiting replay
//!
//! Actions are persisted as one JSON snapshot under a single namespaced key;
//! every change rewrites the whole snapshot. The queue is a single-writer
//! structure: `drain` is not reentrant, and concurrent `enqueue`/`drain`
//! calls race on the snapshot write with the last writer winning. Callers
//! are expected to serialize access.
//!
//! Storage trouble never propagates out of `enqueue`, `drain`, or `clear`;
//! these run on paths that are already failing or shutting down, so they log
//! and keep going.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, StorageError};
use crate::replay::ActionReplayer;
use crate::service::events::{Event, EventBus};
use crate::storage::StorageBackend;
use crate::types::{ActionKind, QueuedAction};

/// Replay attempts an action is given before being discarded.
pub const MAX_REPLAY_ATTEMPTS: u32 = 3;

/// Outcome counts for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Actions that replayed successfully and left the queue
    pub replayed: usize,
    /// Actions that failed and stay for a later pass
    pub retained: usize,
    /// Actions discarded after exhausting their attempts
    pub dropped: usize,
}

/// The durable action queue.
#[derive(Clone)]
pub struct QueueService {
    storage: Arc<dyn StorageBackend>,
    key: String,
    event_bus: EventBus,
}

impl QueueService {
    pub fn new(storage: Arc<dyn StorageBackend>, namespace: &str, event_bus: EventBus) -> Self {
        Self {
            storage,
            key: format!("{}:actions:v1", namespace),
            event_bus,
        }
    }

    /// The storage key this queue persists under.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Append an action to the queue.
    ///
    /// Never fails: an unreadable snapshot is treated as empty and a failed
    /// write is logged and swallowed. The constructed action is returned
    /// either way so callers can reference its id.
    pub async fn enqueue(&self, kind: ActionKind, payload: serde_json::Value) -> QueuedAction {
        let action = QueuedAction::new(kind, payload);

        let mut actions = match self.load_actions().await {
            Ok(actions) => actions,
            Err(e) => {
                warn!("Failed to load queue snapshot, starting fresh: {}", e);
                Vec::new()
            }
        };
        actions.push(action.clone());

        if let Err(e) = self.persist(&actions).await {
            warn!("Failed to persist enqueued {} action {}: {}", kind, action.id, e);
        }

        info!("Enqueued {} action {} ({} pending)", kind, action.id, actions.len());
        self.event_bus.emit(Event::ActionEnqueued {
            action_id: action.id.clone(),
            kind,
        });

        action
    }

    /// Replay pending actions in FIFO order, one attempt per action.
    ///
    /// Successful replays leave the queue. A failure or replayer error
    /// increments the action's attempt count; the action stays while the
    /// count is below [`MAX_REPLAY_ATTEMPTS`] and is discarded once it
    /// reaches it. Survivors are written back in a single snapshot write at
    /// the end of the pass. An empty or unreadable queue returns an all-zero
    /// report without writing.
    pub async fn drain(&self, replayer: &dyn ActionReplayer) -> DrainReport {
        let actions = match self.load_actions().await {
            Ok(actions) => actions,
            Err(e) => {
                warn!("Failed to load queue snapshot, skipping drain: {}", e);
                return DrainReport::default();
            }
        };

        if actions.is_empty() {
            return DrainReport::default();
        }

        self.event_bus.emit(Event::DrainStarted {
            pending: actions.len(),
        });

        let mut report = DrainReport::default();
        let mut survivors = Vec::new();

        for mut action in actions {
            let replayed = match replayer.replay(&action).await {
                Ok(replayed) => replayed,
                Err(e) => {
                    warn!("Replay of action {} errored: {}", action.id, e);
                    false
                }
            };

            if replayed {
                info!("Replayed {} action {}", action.kind, action.id);
                self.event_bus.emit(Event::ActionReplayed {
                    action_id: action.id.clone(),
                    kind: action.kind,
                });
                report.replayed += 1;
                continue;
            }

            action.attempts += 1;
            if action.attempts < MAX_REPLAY_ATTEMPTS {
                self.event_bus.emit(Event::ActionRetained {
                    action_id: action.id.clone(),
                    kind: action.kind,
                    attempts: action.attempts,
                });
                report.retained += 1;
                survivors.push(action);
            } else {
                warn!(
                    "Dropping {} action {} after {} failed attempts",
                    action.kind, action.id, action.attempts
                );
                self.event_bus.emit(Event::ActionDropped {
                    action_id: action.id.clone(),
                    kind: action.kind,
                    attempts: action.attempts,
                });
                report.dropped += 1;
            }
        }

        if let Err(e) = self.persist(&survivors).await {
            warn!("Failed to persist queue snapshot after drain: {}", e);
        }

        info!(
            "Drain complete: {} replayed, {} retained, {} dropped",
            report.replayed, report.retained, report.dropped
        );
        self.event_bus.emit(Event::DrainCompleted {
            replayed: report.replayed,
            retained: report.retained,
            dropped: report.dropped,
        });

        report
    }

    /// Discard all pending actions (sign-out and reset flows).
    ///
    /// Best-effort: storage failures are logged, never surfaced.
    pub async fn clear(&self) {
        let discarded = match self.load_actions().await {
            Ok(actions) => actions.len(),
            Err(_) => 0,
        };

        if let Err(e) = self.storage.remove(&self.key).await {
            warn!("Failed to clear queue: {}", e);
            return;
        }

        info!("Cleared queue ({} actions discarded)", discarded);
        self.event_bus.emit(Event::QueueCleared { discarded });
    }

    /// Current snapshot of pending actions, in FIFO order.
    ///
    /// Unlike the mutating operations this surfaces storage errors, since
    /// inspectors want to know the difference between an empty queue and a
    /// broken one.
    pub async fn pending(&self) -> Result<Vec<QueuedAction>> {
        self.load_actions().await
    }

    async fn load_actions(&self) -> Result<Vec<QueuedAction>> {
        match self.storage.read(&self.key).await? {
            Some(raw) => {
                let actions =
                    serde_json::from_str(&raw).map_err(StorageError::SerializationError)?;
                Ok(actions)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, actions: &[QueuedAction]) -> Result<()> {
        let raw = serde_json::to_string(actions).map_err(StorageError::SerializationError)?;
        self.storage.write(&self.key, &raw).await
    }
}
