//! Push message construction and delivery.
//!
//! # Sender Backends
//!
//! - `FcmBackend`: Firebase Cloud Messaging HTTP v1 (default)
//! - `MemoryMessageSender`: records messages without delivering them
//!
//! Use `create_message_sender()` to pick one from configuration.

mod backend;
mod fcm_backend;
mod memory_backend;
mod message;

use std::sync::Arc;

use crate::auth::TokenProvider;
use crate::config::Settings;

pub use backend::{MessageSender, MessagingError};
pub use fcm_backend::FcmBackend;
pub use memory_backend::MemoryMessageSender;
pub use message::{ApnsConfig, ApnsPayload, Aps, Message, MessageBuilder, Notification, Target};

/// Create a message sender based on configuration.
///
/// - `"memory"`: Returns a `MemoryMessageSender`
/// - `"fcm"` (default): Returns an `FcmBackend`
pub fn create_message_sender(
    settings: &Settings,
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
) -> Arc<dyn MessageSender> {
    match settings.fcm.backend.as_str() {
        "memory" => {
            tracing::info!(backend = "memory", "Creating memory message sender");
            Arc::new(MemoryMessageSender::new())
        }
        _ => {
            tracing::info!(
                backend = "fcm",
                project_id = %settings.firebase.project_id,
                dry_run = settings.fcm.dry_run,
                "Creating FCM message sender"
            );
            Arc::new(FcmBackend::new(
                &settings.fcm,
                &settings.firebase.project_id,
                http,
                tokens,
            ))
        }
    }
}
