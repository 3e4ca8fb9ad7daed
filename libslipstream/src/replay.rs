//! Replay seam for the durable action queue
//!
//! A drain pass hands each surviving action to an [`ActionReplayer`] supplied
//! by the embedder, which re-executes it against the backend according to its
//! kind. The queue itself never talks to the network.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{RemoteError, Result};
use crate::types::QueuedAction;

/// Re-executes queued actions during a drain pass.
#[async_trait]
pub trait ActionReplayer: Send + Sync {
    /// Replay one queued action.
    ///
    /// # Returns
    ///
    /// `Ok(true)` when the action committed remotely and can leave the
    /// queue, `Ok(false)` when it should stay for a later pass.
    ///
    /// # Errors
    ///
    /// Errors are tolerated: the queue logs them and counts the attempt as
    /// failed, exactly like `Ok(false)`.
    async fn replay(&self, action: &QueuedAction) -> Result<bool>;
}

#[derive(Debug, Clone)]
enum ReplayScript {
    Succeed,
    Fail,
    Error(String),
    SucceedFor(HashSet<String>),
}

/// Scriptable replayer for tests.
///
/// Records every action id it is handed, in call order, so tests can verify
/// both ordering and per-action attempt counts.
pub struct MockReplayer {
    script: ReplayScript,
    replayed_ids: Arc<Mutex<Vec<String>>>,
}

impl MockReplayer {
    fn with_script(script: ReplayScript) -> Self {
        Self {
            script,
            replayed_ids: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every replay commits.
    pub fn success() -> Self {
        Self::with_script(ReplayScript::Succeed)
    }

    /// Every replay reports failure without erroring.
    pub fn failure() -> Self {
        Self::with_script(ReplayScript::Fail)
    }

    /// Every replay errors with a connectivity-shaped failure.
    pub fn erroring(message: &str) -> Self {
        Self::with_script(ReplayScript::Error(message.to_string()))
    }

    /// Replays commit only for the given action ids; the rest fail.
    pub fn success_for(ids: &[&str]) -> Self {
        let ids = ids.iter().map(|id| id.to_string()).collect();
        Self::with_script(ReplayScript::SucceedFor(ids))
    }

    /// Action ids handed to `replay`, in call order.
    pub fn replayed_ids(&self) -> Vec<String> {
        self.replayed_ids.lock().unwrap().clone()
    }

    /// Total number of `replay` calls.
    pub fn call_count(&self) -> usize {
        self.replayed_ids.lock().unwrap().len()
    }

    /// Number of `replay` calls for one action id.
    pub fn calls_for(&self, id: &str) -> usize {
        self.replayed_ids
            .lock()
            .unwrap()
            .iter()
            .filter(|seen| seen.as_str() == id)
            .count()
    }
}

#[async_trait]
impl ActionReplayer for MockReplayer {
    async fn replay(&self, action: &QueuedAction) -> Result<bool> {
        self.replayed_ids.lock().unwrap().push(action.id.clone());

        match &self.script {
            ReplayScript::Succeed => Ok(true),
            ReplayScript::Fail => Ok(false),
            ReplayScript::Error(message) => Err(RemoteError::network(message).into()),
            ReplayScript::SucceedFor(ids) => Ok(ids.contains(&action.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_success_replayer_commits_and_records() {
        let replayer = MockReplayer::success();
        let action = QueuedAction::new(ActionKind::Like, json!({"thread_id": "t1"}));

        let result = replayer.replay(&action).await.unwrap();

        assert!(result);
        assert_eq!(replayer.replayed_ids(), vec![action.id.clone()]);
        assert_eq!(replayer.calls_for(&action.id), 1);
    }

    #[tokio::test]
    async fn test_failure_replayer_reports_false() {
        let replayer = MockReplayer::failure();
        let action = QueuedAction::new(ActionKind::Comment, json!({}));

        assert!(!replayer.replay(&action).await.unwrap());
    }

    #[tokio::test]
    async fn test_erroring_replayer_returns_error() {
        let replayer = MockReplayer::erroring("Network request failed");
        let action = QueuedAction::new(ActionKind::Post, json!({}));

        assert!(replayer.replay(&action).await.is_err());
        assert_eq!(replayer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_selective_replayer_commits_only_listed_ids() {
        let keep = QueuedAction::new(ActionKind::Like, json!({}));
        let commit = QueuedAction::new(ActionKind::Like, json!({}));
        let replayer = MockReplayer::success_for(&[commit.id.as_str()]);

        assert!(!replayer.replay(&keep).await.unwrap());
        assert!(replayer.replay(&commit).await.unwrap());
        assert_eq!(replayer.replayed_ids(), vec![keep.id, commit.id]);
    }
}
