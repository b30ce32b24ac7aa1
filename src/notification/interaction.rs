//! Interaction robot: likes and comments in `interactions/{intId}` notify
//! the owner of the post.

use std::time::Instant;

use serde_json::{Map, Value};

use crate::fields::{first_text, render_text};
use crate::messaging::{Message, MessageBuilder, MessagingError};
use crate::metrics::NotificationMetrics;

use super::context::{DeviceToken, RobotContext};
use super::types::{HandlerOutcome, RobotEvent, RobotKind, SkipReason};

const DEFAULT_ACTOR: &str = "Someone";

/// Kind of interaction, from the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionType {
    Like,
    Comment,
    Other,
}

impl InteractionType {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        match fields.get("type").and_then(Value::as_str) {
            Some("like") => InteractionType::Like,
            Some("comment") => InteractionType::Comment,
            _ => InteractionType::Other,
        }
    }
}

/// Who should be notified, or why nobody should be.
pub fn interaction_owner(fields: &Map<String, Value>) -> Result<String, SkipReason> {
    let owner = first_text(fields, &["postOwnerId"]).ok_or(SkipReason::NoRecipient)?;

    let actor = fields.get("userId").map(render_text);
    if actor.as_deref() == Some(owner.as_str()) {
        return Err(SkipReason::SelfInteraction);
    }
    Ok(owner)
}

/// Title and body for an interaction document.
pub fn interaction_content(fields: &Map<String, Value>) -> (String, String) {
    let actor = || first_text(fields, &["userName"]).unwrap_or_else(|| DEFAULT_ACTOR.to_string());

    match InteractionType::from_fields(fields) {
        InteractionType::Like => (
            "❤️ New Like".to_string(),
            format!("{} liked your post.", actor()),
        ),
        InteractionType::Comment => {
            let comment = fields.get("commentText").map(render_text).unwrap_or_default();
            (
                "💬 New Comment".to_string(),
                format!("{} commented: {}", actor(), comment),
            )
        }
        InteractionType::Other => (
            "New activity".to_string(),
            "Interaction on your post.".to_string(),
        ),
    }
}

/// Build the device message for an interaction document.
pub fn build_interaction_message(
    fields: &Map<String, Value>,
    token: &str,
) -> Result<Message, MessagingError> {
    let (title, body) = interaction_content(fields);

    MessageBuilder::token(token)
        .notification(title, body)
        .sound("default")
        .badge(1)
        .build()
}

#[tracing::instrument(
    name = "robot.interaction",
    skip(ctx, event),
    fields(event_id = %event.event_id, interaction_id = %event.param("intId"))
)]
pub async fn notify_interaction(ctx: &RobotContext, event: &RobotEvent) -> HandlerOutcome {
    let robot = RobotKind::Interaction.as_str();

    let Some(document) = event.document.as_ref() else {
        NotificationMetrics::record_skipped(robot);
        return HandlerOutcome::skipped(SkipReason::NoPayload);
    };

    let owner = match interaction_owner(&document.fields) {
        Ok(owner) => owner,
        Err(reason) => {
            tracing::debug!(reason = reason.as_str(), "Interaction not notified");
            NotificationMetrics::record_skipped(robot);
            return HandlerOutcome::skipped(reason);
        }
    };

    let token = match ctx.device_token(&owner).await {
        Ok(DeviceToken::Found(token)) => token,
        Ok(DeviceToken::UserNotFound) => {
            NotificationMetrics::record_skipped(robot);
            return HandlerOutcome::skipped(SkipReason::RecipientNotFound);
        }
        Ok(DeviceToken::Missing) => {
            NotificationMetrics::record_skipped(robot);
            return HandlerOutcome::skipped(SkipReason::NoDeviceToken);
        }
        Err(e) => {
            tracing::warn!(owner = %owner, error = %e, "Device token lookup failed");
            NotificationMetrics::record_failed(robot, "lookup");
            return HandlerOutcome::failed("lookup", e);
        }
    };

    let message = match build_interaction_message(&document.fields, &token) {
        Ok(message) => message,
        Err(e) => {
            NotificationMetrics::record_failed(robot, e.kind());
            return HandlerOutcome::failed(e.kind(), e);
        }
    };

    let started = Instant::now();
    match ctx.sender.send(&message).await {
        Ok(message_id) => {
            NotificationMetrics::record_sent(robot, started.elapsed());
            tracing::info!(owner = %owner, message_id = %message_id, "Interaction notification sent");
            HandlerOutcome::sent(message_id)
        }
        Err(e) => {
            NotificationMetrics::record_failed(robot, e.kind());
            tracing::warn!(owner = %owner, error = %e, "Interaction notification failed");
            HandlerOutcome::failed(e.kind(), e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_owner_required() {
        assert_eq!(
            interaction_owner(&fields(json!({"userId": "u2"}))),
            Err(SkipReason::NoRecipient)
        );
        assert_eq!(
            interaction_owner(&fields(json!({"postOwnerId": "", "userId": "u2"}))),
            Err(SkipReason::NoRecipient)
        );
    }

    #[test]
    fn test_self_interaction_skipped() {
        assert_eq!(
            interaction_owner(&fields(json!({"postOwnerId": "u1", "userId": "u1"}))),
            Err(SkipReason::SelfInteraction)
        );
        assert_eq!(
            interaction_owner(&fields(json!({"postOwnerId": "u1", "userId": "u2"}))),
            Ok("u1".to_string())
        );
    }

    #[test]
    fn test_like_content() {
        let (title, body) = interaction_content(&fields(json!({"type": "like", "userName": "Leo"})));
        assert_eq!(title, "❤️ New Like");
        assert_eq!(body, "Leo liked your post.");

        let (_, body) = interaction_content(&fields(json!({"type": "like"})));
        assert_eq!(body, "Someone liked your post.");
    }

    #[test]
    fn test_comment_content() {
        let (title, body) = interaction_content(&fields(json!({
            "type": "comment",
            "userName": "Mia",
            "commentText": "Great shot!"
        })));
        assert_eq!(title, "💬 New Comment");
        assert_eq!(body, "Mia commented: Great shot!");

        let (_, body) = interaction_content(&fields(json!({"type": "comment"})));
        assert_eq!(body, "Someone commented: ");
    }

    #[test]
    fn test_other_content() {
        let (title, body) = interaction_content(&fields(json!({"type": "share"})));
        assert_eq!(title, "New activity");
        assert_eq!(body, "Interaction on your post.");
    }

    #[test]
    fn test_message_has_no_content_available_or_data() {
        let message =
            build_interaction_message(&fields(json!({"type": "like"})), "tok-1").unwrap();

        let aps = message.aps().unwrap();
        assert_eq!(aps.sound.as_deref(), Some("default"));
        assert_eq!(aps.badge, Some(1));
        assert_eq!(aps.content_available, None);
        assert!(message.data.is_empty());
    }

    #[tokio::test]
    async fn test_event_without_document_skipped() {
        let store = std::sync::Arc::new(crate::firestore::MemoryDocumentStore::new());
        store.insert("users", "u1", json!({"fcmToken": "tok-1"}));
        let sender = std::sync::Arc::new(crate::messaging::MemoryMessageSender::new());
        let ctx = RobotContext::new(
            store,
            sender.clone(),
            crate::notification::RobotOptions::default(),
        );

        let mut event = RobotEvent {
            event_id: "evt-empty".to_string(),
            document: None,
            params: std::collections::HashMap::new(),
        };
        event.params.insert("intId".to_string(), "i1".to_string());

        let outcome = notify_interaction(&ctx, &event).await;

        assert_eq!(outcome, HandlerOutcome::skipped(SkipReason::NoPayload));
        assert_eq!(sender.sent_count(), 0);
    }
}
