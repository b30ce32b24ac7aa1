use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::firestore::{Document, PathPattern};

/// The three event handlers and the collections they watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotKind {
    /// `broadcasts/{broadcastId}` → topic message to everyone
    Broadcast,
    /// `chats/{chatId}/messages/{msgId}` → the message recipient
    ChatMessage,
    /// `interactions/{intId}` → the owner of the post
    Interaction,
}

impl RobotKind {
    pub const ALL: [RobotKind; 3] = [
        RobotKind::Broadcast,
        RobotKind::ChatMessage,
        RobotKind::Interaction,
    ];

    pub fn pattern(&self) -> &'static str {
        match self {
            RobotKind::Broadcast => "broadcasts/{broadcastId}",
            RobotKind::ChatMessage => "chats/{chatId}/messages/{msgId}",
            RobotKind::Interaction => "interactions/{intId}",
        }
    }

    pub fn path_pattern(&self) -> PathPattern {
        PathPattern::parse(self.pattern())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RobotKind::Broadcast => "broadcast",
            RobotKind::ChatMessage => "chat_message",
            RobotKind::Interaction => "interaction",
        }
    }
}

impl std::fmt::Display for RobotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A newly created document, as delivered by the trigger source
#[derive(Debug, Clone)]
pub struct DocumentCreated {
    /// Trigger-assigned event id (CloudEvent `id`)
    pub event_id: String,
    /// Path relative to the database root
    pub path: String,
    /// Document snapshot; `None` when the event carried no payload
    pub document: Option<Document>,
}

impl DocumentCreated {
    pub fn new(event_id: impl Into<String>, document: Document) -> Self {
        Self {
            event_id: event_id.into(),
            path: document.path.clone(),
            document: Some(document),
        }
    }
}

/// Robot input: the created document plus the wildcards bound from its path
#[derive(Debug, Clone)]
pub struct RobotEvent {
    pub event_id: String,
    pub document: Option<Document>,
    pub params: HashMap<String, String>,
}

impl RobotEvent {
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or_default()
    }
}

/// Why a robot decided not to send anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The event carried no document data
    NoPayload,
    /// None of the recipient fields were set
    NoRecipient,
    /// The actor interacted with their own post
    SelfInteraction,
    /// The recipient has no user document
    RecipientNotFound,
    /// The recipient's user document has no device token
    NoDeviceToken,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoPayload => "no_payload",
            SkipReason::NoRecipient => "no_recipient",
            SkipReason::SelfInteraction => "self_interaction",
            SkipReason::RecipientNotFound => "recipient_not_found",
            SkipReason::NoDeviceToken => "no_device_token",
        }
    }
}

/// What a robot did with one event.
///
/// Failures are part of the outcome rather than an `Err`: a failed send is
/// logged and swallowed, never surfaced to the trigger source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandlerOutcome {
    Sent { message_id: String },
    Skipped { reason: SkipReason },
    Failed { kind: String, error: String },
    /// No robot watches this path
    Ignored,
}

impl HandlerOutcome {
    pub fn sent(message_id: impl Into<String>) -> Self {
        HandlerOutcome::Sent {
            message_id: message_id.into(),
        }
    }

    pub fn skipped(reason: SkipReason) -> Self {
        HandlerOutcome::Skipped { reason }
    }

    pub fn failed(kind: impl Into<String>, error: impl std::fmt::Display) -> Self {
        HandlerOutcome::Failed {
            kind: kind.into(),
            error: error.to_string(),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, HandlerOutcome::Sent { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            HandlerOutcome::Sent { .. } => "sent",
            HandlerOutcome::Skipped { .. } => "skipped",
            HandlerOutcome::Failed { .. } => "failed",
            HandlerOutcome::Ignored => "ignored",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_robot_patterns_route_distinct_paths() {
        assert!(RobotKind::Broadcast.path_pattern().matches("broadcasts/b1").is_some());
        assert!(RobotKind::ChatMessage
            .path_pattern()
            .matches("chats/c1/messages/m1")
            .is_some());
        assert!(RobotKind::Interaction.path_pattern().matches("interactions/i1").is_some());
        assert!(RobotKind::Interaction.path_pattern().matches("broadcasts/b1").is_none());
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_value(HandlerOutcome::sent("projects/p/messages/1")).unwrap(),
            json!({"status": "sent", "message_id": "projects/p/messages/1"})
        );
        assert_eq!(
            serde_json::to_value(HandlerOutcome::skipped(SkipReason::NoDeviceToken)).unwrap(),
            json!({"status": "skipped", "reason": "no_device_token"})
        );
        assert_eq!(
            serde_json::to_value(HandlerOutcome::Ignored).unwrap(),
            json!({"status": "ignored"})
        );
    }

    #[test]
    fn test_robot_event_param_defaults_empty() {
        let event = RobotEvent {
            event_id: "e1".to_string(),
            document: None,
            params: HashMap::new(),
        };
        assert_eq!(event.param("chatId"), "");
    }
}
