//! Core types for Slipstream

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SlipstreamError;

/// The closed set of user actions the queue knows how to carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Like,
    Comment,
    Post,
    Bookmark,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Post => "post",
            Self::Bookmark => "bookmark",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = SlipstreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "like" => Ok(Self::Like),
            "comment" => Ok(Self::Comment),
            "post" => Ok(Self::Post),
            "bookmark" => Ok(Self::Bookmark),
            _ => Err(SlipstreamError::InvalidInput(format!(
                "Unknown action kind: {} (expected like, comment, post, or bookmark)",
                s
            ))),
        }
    }
}

/// A deferred user action awaiting replay against the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedAction {
    /// Unique identifier (UUID v4), generated at enqueue time
    pub id: String,
    /// What the user did
    pub kind: ActionKind,
    /// Kind-specific data, opaque to the queue (thread id, direction, ...)
    pub payload: serde_json::Value,
    /// When the action was enqueued (Unix timestamp)
    pub enqueued_at: i64,
    /// Replay attempts so far; starts at 0
    pub attempts: u32,
}

impl QueuedAction {
    pub fn new(kind: ActionKind, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            payload,
            enqueued_at: chrono::Utc::now().timestamp(),
            attempts: 0,
        }
    }
}

/// Observable state of a toggle target: the user's flag plus the aggregate
/// counter shown next to it (liked + like count, bookmarked + save count).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleState {
    pub active: bool,
    pub count: u64,
}

impl ToggleState {
    pub fn new(active: bool, count: u64) -> Self {
        Self { active, count }
    }

    /// The optimistic projection of flipping this toggle: the flag inverts
    /// and the counter moves by exactly one, never below zero.
    pub fn toggled(&self) -> ToggleState {
        if self.active {
            ToggleState {
                active: false,
                count: self.count.saturating_sub(1),
            }
        } else {
            ToggleState {
                active: true,
                count: self.count.saturating_add(1),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_queued_action_new_generates_valid_uuid() {
        let action = QueuedAction::new(ActionKind::Like, json!({"thread_id": "t1"}));
        let parsed = Uuid::parse_str(&action.id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn test_queued_action_ids_are_unique() {
        let a = QueuedAction::new(ActionKind::Like, json!({}));
        let b = QueuedAction::new(ActionKind::Like, json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_queued_action_starts_with_zero_attempts() {
        let action = QueuedAction::new(ActionKind::Bookmark, json!({"thread_id": "t9"}));
        assert_eq!(action.attempts, 0);
    }

    #[test]
    fn test_queued_action_timestamp_is_reasonable() {
        let action = QueuedAction::new(ActionKind::Post, json!({}));
        // Between 2020 and 2033
        assert!(action.enqueued_at > 1_600_000_000);
        assert!(action.enqueued_at < 2_000_000_000);
    }

    #[test]
    fn test_queued_action_serde_round_trip() {
        let action = QueuedAction::new(
            ActionKind::Comment,
            json!({"thread_id": "t3", "body": "hello"}),
        );
        let encoded = serde_json::to_string(&action).unwrap();
        assert!(encoded.contains("\"kind\":\"comment\""));

        let decoded: QueuedAction = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, action);
    }

    #[test]
    fn test_action_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ActionKind::Like).unwrap(), "\"like\"");
        assert_eq!(
            serde_json::to_string(&ActionKind::Comment).unwrap(),
            "\"comment\""
        );
        assert_eq!(serde_json::to_string(&ActionKind::Post).unwrap(), "\"post\"");
        assert_eq!(
            serde_json::to_string(&ActionKind::Bookmark).unwrap(),
            "\"bookmark\""
        );
    }

    #[test]
    fn test_action_kind_from_str() {
        assert_eq!("like".parse::<ActionKind>().unwrap(), ActionKind::Like);
        assert_eq!("Bookmark".parse::<ActionKind>().unwrap(), ActionKind::Bookmark);
    }

    #[test]
    fn test_action_kind_from_str_rejects_unknown() {
        let result = "repost".parse::<ActionKind>();
        assert!(result.is_err());
        let message = format!("{}", result.unwrap_err());
        assert!(message.contains("Unknown action kind"));
    }

    #[test]
    fn test_action_kind_display_round_trip() {
        for kind in [
            ActionKind::Like,
            ActionKind::Comment,
            ActionKind::Post,
            ActionKind::Bookmark,
        ] {
            let parsed: ActionKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_toggle_on_increments_count() {
        let state = ToggleState::new(false, 3);
        assert_eq!(state.toggled(), ToggleState::new(true, 4));
    }

    #[test]
    fn test_toggle_off_decrements_count() {
        let state = ToggleState::new(true, 4);
        assert_eq!(state.toggled(), ToggleState::new(false, 3));
    }

    #[test]
    fn test_toggle_off_clamps_count_at_zero() {
        // A zero counter with the flag set can happen when server state and
        // local state drift; untoggling must not underflow.
        let state = ToggleState::new(true, 0);
        assert_eq!(state.toggled(), ToggleState::new(false, 0));
    }

    #[test]
    fn test_toggle_twice_restores_original() {
        let state = ToggleState::new(false, 7);
        assert_eq!(state.toggled().toggled(), state);
    }
}
