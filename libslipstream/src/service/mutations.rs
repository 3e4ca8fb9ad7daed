//! Optimistic mutation protocol for toggle-style actions
//!
//! One reusable engine instead of a per-screen copy of the pattern. The
//! contract for a single trigger:
//!
//! 1. Capture the current state as the rollback target.
//! 2. Apply the toggled projection synchronously, before any network wait.
//! 3. Attempt the remote write.
//! 4. Resolve: commit (a server-confirmed canonical state wins over the
//!    local projection), defer onto the durable queue, or roll back and
//!    raise a user-facing notice.
//!
//! The rollback target is captured at the trigger moment and never
//! re-derived. A rapid re-toggle while a write is in flight therefore
//! captures the first trigger's optimistic value as its target; the last
//! resolution to land wins the cell.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{classify_remote_error, FailureKind};
use crate::remote::RemoteTarget;
use crate::service::events::{Event, EventBus, Notice};
use crate::service::queue::QueueService;
use crate::types::{ActionKind, ToggleState};

/// Watchable holder of one toggle target's observable state.
///
/// A screen owns one cell per visible toggle and renders from its
/// subscription; the mutation engine writes through it.
pub struct StateCell {
    tx: watch::Sender<ToggleState>,
}

impl StateCell {
    pub fn new(initial: ToggleState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> ToggleState {
        *self.tx.borrow()
    }

    pub fn set(&self, state: ToggleState) {
        self.tx.send_replace(state);
    }

    /// Subscribe to state changes (UI binding).
    pub fn subscribe(&self) -> watch::Receiver<ToggleState> {
        self.tx.subscribe()
    }
}

/// Terminal resolution of one toggle trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The remote write landed, or had already landed.
    Committed,
    /// Connectivity failed; the action waits on the durable queue.
    Queued,
    /// The backend rejected the write; the pre-trigger state was restored.
    RolledBack,
}

/// What a toggle call resolved to, plus the state the cell ended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOutcome {
    pub resolution: Resolution,
    pub state: ToggleState,
}

/// The optimistic mutation engine.
#[derive(Clone)]
pub struct MutationService {
    queue: QueueService,
    event_bus: EventBus,
}

impl MutationService {
    pub fn new(queue: QueueService, event_bus: EventBus) -> Self {
        Self { queue, event_bus }
    }

    /// Run one optimistic toggle against `cell`, writing through `remote`.
    ///
    /// Never returns an error: every failure mode resolves to one of the
    /// three terminal resolutions, and the caller's screen state is always
    /// left coherent (committed projection, kept projection with a queued
    /// action, or the restored pre-trigger state).
    pub async fn toggle(
        &self,
        kind: ActionKind,
        payload: serde_json::Value,
        cell: &StateCell,
        remote: &dyn RemoteTarget,
    ) -> MutationOutcome {
        // Rollback target, captured before anything else happens
        let before = cell.get();
        let after = before.toggled();

        cell.set(after);
        self.event_bus.emit(Event::MutationApplied { kind });

        match remote.execute(kind, &payload).await {
            Ok(ack) => {
                if let Some(canonical) = ack.canonical {
                    // The server-confirmed value beats the local projection
                    cell.set(canonical);
                }
                info!("Committed {} mutation", kind);
                self.event_bus.emit(Event::MutationCommitted { kind });
                MutationOutcome {
                    resolution: Resolution::Committed,
                    state: cell.get(),
                }
            }
            Err(error) => match classify_remote_error(&error) {
                FailureKind::AlreadyApplied => {
                    info!(
                        "{} mutation was already applied remotely, keeping local state",
                        kind
                    );
                    self.event_bus.emit(Event::MutationCommitted { kind });
                    MutationOutcome {
                        resolution: Resolution::Committed,
                        state: cell.get(),
                    }
                }
                FailureKind::Recoverable => {
                    warn!("{} mutation deferred to the queue: {}", kind, error);
                    let action = self.queue.enqueue(kind, payload).await;
                    self.event_bus.emit(Event::MutationQueued {
                        action_id: action.id,
                        kind,
                    });
                    MutationOutcome {
                        resolution: Resolution::Queued,
                        state: cell.get(),
                    }
                }
                FailureKind::Fatal => {
                    warn!("{} mutation rejected, rolling back: {}", kind, error);
                    cell.set(before);
                    self.event_bus.emit(Event::MutationRolledBack { kind });
                    self.event_bus.emit(Event::NoticeRaised {
                        notice: Notice::error(&format!(
                            "Couldn't complete your {}. Please try again.",
                            kind
                        )),
                    });
                    MutationOutcome {
                        resolution: Resolution::RolledBack,
                        state: cell.get(),
                    }
                }
            },
        }
    }
}
