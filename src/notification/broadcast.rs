//! Broadcast robot: every new `broadcasts/{broadcastId}` document goes to
//! the shared topic.

use std::time::Instant;

use serde_json::{Map, Value};

use crate::fields::{first_present, first_text};
use crate::messaging::{Message, MessageBuilder, MessagingError};
use crate::metrics::NotificationMetrics;

use super::context::RobotContext;
use super::types::{HandlerOutcome, RobotEvent, RobotKind, SkipReason};

const TEXT_FIELDS: &[&str] = &["text", "mensaje"];
const IMAGE_FIELDS: &[&str] = &["imageUrl", "image", "url", "foto"];
const TITLE_FIELDS: &[&str] = &["senderName", "titulo"];

const DEFAULT_TITLE: &str = "Atlas News";
const IMAGE_ONLY_BODY: &str = "📷 New image published.";
const EMPTY_BODY: &str = "New announcement on Atlerts.";
const NO_IMAGE: &str = "none";
const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// Title, body and image of a broadcast after field normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastContent {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
}

impl BroadcastContent {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        // The first present text field wins even when it is not a string;
        // only a non-empty string becomes the body.
        let text = first_present(fields, TEXT_FIELDS)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let image = first_text(fields, IMAGE_FIELDS);

        let body = if !text.is_empty() {
            text
        } else if image.is_some() {
            IMAGE_ONLY_BODY.to_string()
        } else {
            EMPTY_BODY.to_string()
        };

        let title = first_text(fields, TITLE_FIELDS).unwrap_or_else(|| DEFAULT_TITLE.to_string());

        Self { title, body, image }
    }
}

/// Build the topic message for a broadcast document.
pub fn build_broadcast_message(
    fields: &Map<String, Value>,
    topic: &str,
) -> Result<Message, MessagingError> {
    let content = BroadcastContent::from_fields(fields);

    MessageBuilder::topic(topic)
        .notification(content.title, content.body)
        .sound("default")
        .badge(1)
        .content_available()
        .data("image", content.image.unwrap_or_else(|| NO_IMAGE.to_string()))
        .data("click_action", CLICK_ACTION)
        .build()
}

#[tracing::instrument(
    name = "robot.broadcast",
    skip(ctx, event),
    fields(event_id = %event.event_id, broadcast_id = %event.param("broadcastId"))
)]
pub async fn notify_broadcast(ctx: &RobotContext, event: &RobotEvent) -> HandlerOutcome {
    let robot = RobotKind::Broadcast.as_str();

    let Some(document) = event.document.as_ref() else {
        tracing::debug!("Broadcast event without document data");
        NotificationMetrics::record_skipped(robot);
        return HandlerOutcome::skipped(SkipReason::NoPayload);
    };

    tracing::info!(data = %serde_json::Value::Object(document.fields.clone()), "New broadcast");

    let message = match build_broadcast_message(&document.fields, &ctx.options.broadcast_topic) {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build broadcast message");
            NotificationMetrics::record_failed(robot, e.kind());
            return HandlerOutcome::failed(e.kind(), e);
        }
    };

    let started = Instant::now();
    match ctx.sender.send(&message).await {
        Ok(message_id) => {
            NotificationMetrics::record_sent(robot, started.elapsed());
            tracing::info!(message_id = %message_id, topic = %ctx.options.broadcast_topic, "Broadcast sent");
            HandlerOutcome::sent(message_id)
        }
        Err(e) => {
            NotificationMetrics::record_failed(robot, e.kind());
            tracing::error!(error = %e, "Broadcast send failed");
            HandlerOutcome::failed(e.kind(), e)
        }
    }
}
