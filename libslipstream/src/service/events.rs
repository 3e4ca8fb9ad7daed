//! Event system for progress tracking and user-facing notices
//!
//! An in-process broadcast bus distributes queue and mutation progress to
//! subscribers (UI layers, loggers) without blocking the emitting service.
//! If no subscribers exist events are dropped immediately; lagging
//! subscribers miss oldest events first.
//!
//! # Example
//!
//! ```no_run
//! use libslipstream::service::events::{Event, EventBus};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::DrainStarted { pending: 3 });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::ActionKind;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<Event>;

/// Broadcast bus for progress events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus. `capacity` is the per-subscriber buffer;
    /// 100 is plenty for UI consumption.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events emitted after this call.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers without blocking.
    pub fn emit(&self, event: Event) {
        // send() returns Err if no receivers exist, which is fine
        // We don't want to block or fail if nobody is listening
        let _ = self.sender.send(event);
    }

    /// Number of active subscribers. Debugging aid, not for control flow.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Events emitted by the queue and mutation services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An action was appended to the durable queue
    ActionEnqueued { action_id: String, kind: ActionKind },

    /// A drain pass began with this many pending actions
    DrainStarted { pending: usize },

    /// A queued action replayed successfully and left the queue
    ActionReplayed { action_id: String, kind: ActionKind },

    /// A queued action failed replay and stays for a later pass
    ActionRetained {
        action_id: String,
        kind: ActionKind,
        attempts: u32,
    },

    /// A queued action exhausted its attempts and was discarded
    ActionDropped {
        action_id: String,
        kind: ActionKind,
        attempts: u32,
    },

    /// A drain pass finished
    DrainCompleted {
        replayed: usize,
        retained: usize,
        dropped: usize,
    },

    /// The queue was discarded wholesale
    QueueCleared { discarded: usize },

    /// An optimistic projection was applied locally
    MutationApplied { kind: ActionKind },

    /// A mutation resolved as committed (accepted or already applied)
    MutationCommitted { kind: ActionKind },

    /// A mutation was deferred onto the durable queue
    MutationQueued { action_id: String, kind: ActionKind },

    /// A mutation was rolled back to its pre-trigger state
    MutationRolledBack { kind: ActionKind },

    /// Something the user should see briefly
    NoticeRaised { notice: Notice },
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    /// How long a UI should keep this notice on screen.
    pub fn default_duration_ms(&self) -> u64 {
        match self {
            NoticeKind::Info => 3000,
            NoticeKind::Success => 2000,
            NoticeKind::Warning => 4000,
            NoticeKind::Error => 5000,
        }
    }
}

/// A transient, user-visible notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub duration_ms: u64,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
            duration_ms: kind.default_duration_ms(),
        }
    }

    pub fn info(message: &str) -> Self {
        Self::new(NoticeKind::Info, message)
    }

    pub fn success(message: &str) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn warning(message: &str) -> Self {
        Self::new(NoticeKind::Warning, message)
    }

    pub fn error(message: &str) -> Self {
        Self::new(NoticeKind::Error, message)
    }
}
