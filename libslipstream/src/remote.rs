//! Remote write seam for optimistic mutations
//!
//! The mutation engine hands the actual network call to a [`RemoteTarget`]
//! supplied by the embedder. Failures come back as [`RemoteError`] so the
//! centralized classifier can decide how to resolve them.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::RemoteError;
use crate::types::{ActionKind, ToggleState};

/// Acknowledgement of a successful remote write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAck {
    /// Server-confirmed toggle state, when the backend reports one. A
    /// canonical value always replaces the local projection.
    pub canonical: Option<ToggleState>,
}

impl RemoteAck {
    /// The write landed; the local projection stands.
    pub fn accepted() -> Self {
        Self { canonical: None }
    }

    /// The write landed and the backend reported the resulting state.
    pub fn confirmed(state: ToggleState) -> Self {
        Self {
            canonical: Some(state),
        }
    }
}

/// Performs the remote write for one toggle trigger.
#[async_trait]
pub trait RemoteTarget: Send + Sync {
    async fn execute(
        &self,
        kind: ActionKind,
        payload: &serde_json::Value,
    ) -> std::result::Result<RemoteAck, RemoteError>;
}

#[derive(Debug, Clone)]
enum RemoteScript {
    Accept,
    Confirm(ToggleState),
    Fail(RemoteError),
}

/// Scriptable remote for tests. Records every call with its kind and payload.
pub struct MockRemote {
    script: RemoteScript,
    calls: Arc<Mutex<Vec<(ActionKind, serde_json::Value)>>>,
}

impl MockRemote {
    fn with_script(script: RemoteScript) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every write is accepted without a canonical state.
    pub fn success() -> Self {
        Self::with_script(RemoteScript::Accept)
    }

    /// Every write is accepted and the backend reports `state`.
    pub fn confirming(state: ToggleState) -> Self {
        Self::with_script(RemoteScript::Confirm(state))
    }

    /// Every write fails with the unique-constraint conflict.
    pub fn conflicting() -> Self {
        Self::with_script(RemoteScript::Fail(RemoteError::conflict()))
    }

    /// Every write fails with a codeless connectivity error.
    pub fn network_failure() -> Self {
        Self::with_script(RemoteScript::Fail(RemoteError::network(
            "Network request failed",
        )))
    }

    /// Every write fails with the given error.
    pub fn failing(error: RemoteError) -> Self {
        Self::with_script(RemoteScript::Fail(error))
    }

    /// Number of `execute` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Recorded `(kind, payload)` pairs, in call order.
    pub fn calls(&self) -> Vec<(ActionKind, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteTarget for MockRemote {
    async fn execute(
        &self,
        kind: ActionKind,
        payload: &serde_json::Value,
    ) -> std::result::Result<RemoteAck, RemoteError> {
        self.calls.lock().unwrap().push((kind, payload.clone()));

        match &self.script {
            RemoteScript::Accept => Ok(RemoteAck::accepted()),
            RemoteScript::Confirm(state) => Ok(RemoteAck::confirmed(*state)),
            RemoteScript::Fail(error) => Err(error.clone()),
        }
    }
}
