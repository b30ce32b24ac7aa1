//! Chat robot: a new `chats/{chatId}/messages/{msgId}` document notifies
//! the recipient's device.

use std::time::Instant;

use serde_json::{Map, Value};

use crate::fields::first_text;
use crate::messaging::{Message, MessageBuilder, MessagingError};
use crate::metrics::NotificationMetrics;

use super::context::{DeviceToken, RobotContext};
use super::types::{HandlerOutcome, RobotEvent, RobotKind, SkipReason};

/// Every name client versions have used for the recipient
const RECIPIENT_FIELDS: &[&str] = &["recipientId", "toId", "receiverId", "userTo", "toUser"];
const BODY_FIELDS: &[&str] = &["text", "message", "content"];
const TITLE_FIELDS: &[&str] = &["senderName"];

const DEFAULT_TITLE: &str = "New Message";
const DEFAULT_BODY: &str = "You have received a message.";

pub fn chat_recipient(fields: &Map<String, Value>) -> Option<String> {
    first_text(fields, RECIPIENT_FIELDS)
}

/// Build the device message for a chat message document.
pub fn build_chat_message(
    fields: &Map<String, Value>,
    token: &str,
    chat_id: &str,
    msg_id: &str,
) -> Result<Message, MessagingError> {
    let title = first_text(fields, TITLE_FIELDS).unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let body = first_text(fields, BODY_FIELDS).unwrap_or_else(|| DEFAULT_BODY.to_string());

    MessageBuilder::token(token)
        .notification(title, body)
        .sound("default")
        .badge(1)
        .content_available()
        .data("type", "chat")
        .data("chatId", chat_id)
        .data("msgId", msg_id)
        .build()
}

#[tracing::instrument(
    name = "robot.chat_message",
    skip(ctx, event),
    fields(event_id = %event.event_id, chat_id = %event.param("chatId"), msg_id = %event.param("msgId"))
)]
pub async fn notify_chat_message(ctx: &RobotContext, event: &RobotEvent) -> HandlerOutcome {
    let robot = RobotKind::ChatMessage.as_str();

    let Some(document) = event.document.as_ref() else {
        NotificationMetrics::record_skipped(robot);
        return HandlerOutcome::skipped(SkipReason::NoPayload);
    };

    tracing::info!("Chat message detected");

    let Some(recipient) = chat_recipient(&document.fields) else {
        tracing::warn!(
            data = %serde_json::Value::Object(document.fields.clone()),
            "Chat message has no recipient field"
        );
        NotificationMetrics::record_skipped(robot);
        return HandlerOutcome::skipped(SkipReason::NoRecipient);
    };

    let token = match ctx.device_token(&recipient).await {
        Ok(DeviceToken::Found(token)) => token,
        Ok(DeviceToken::UserNotFound) => {
            tracing::info!(recipient = %recipient, "Recipient has no user document");
            NotificationMetrics::record_skipped(robot);
            return HandlerOutcome::skipped(SkipReason::RecipientNotFound);
        }
        Ok(DeviceToken::Missing) => {
            tracing::info!(recipient = %recipient, "Recipient has no device token stored");
            NotificationMetrics::record_skipped(robot);
            return HandlerOutcome::skipped(SkipReason::NoDeviceToken);
        }
        Err(e) => {
            tracing::error!(recipient = %recipient, error = %e, "Device token lookup failed");
            NotificationMetrics::record_failed(robot, "lookup");
            return HandlerOutcome::failed("lookup", e);
        }
    };

    let message = match build_chat_message(
        &document.fields,
        &token,
        event.param("chatId"),
        event.param("msgId"),
    ) {
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
            tracing::info!(recipient = %recipient, message_id = %message_id, "Chat notification sent");
            HandlerOutcome::sent(message_id)
        }
        Err(e) => {
            NotificationMetrics::record_failed(robot, e.kind());
            tracing::error!(recipient = %recipient, error = %e, "Chat notification failed");
            HandlerOutcome::failed(e.kind(), e)
        }
    }
}
