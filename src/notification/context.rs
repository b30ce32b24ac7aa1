use std::sync::Arc;

use crate::config::Settings;
use crate::fields::first_text;
use crate::firestore::{DocumentStore, FirestoreError};
use crate::messaging::MessageSender;
use crate::metrics::TokenLookupMetrics;

/// Knobs the robots read at send time
#[derive(Debug, Clone)]
pub struct RobotOptions {
    /// Topic every broadcast goes to
    pub broadcast_topic: String,
    /// Collection holding one document per user
    pub users_collection: String,
    /// Field on the user document with the device registration token
    pub token_field: String,
}

impl Default for RobotOptions {
    fn default() -> Self {
        Self {
            broadcast_topic: "general".to_string(),
            users_collection: "users".to_string(),
            token_field: "fcmToken".to_string(),
        }
    }
}

impl From<&Settings> for RobotOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            broadcast_topic: settings.fcm.broadcast_topic.clone(),
            users_collection: settings.firestore.users_collection.clone(),
            token_field: settings.firestore.token_field.clone(),
        }
    }
}

/// Result of resolving a user's device token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceToken {
    Found(String),
    /// No user document with that id
    UserNotFound,
    /// The user exists but has no usable token
    Missing,
}

/// Shared collaborators of every robot
#[derive(Clone)]
pub struct RobotContext {
    pub documents: Arc<dyn DocumentStore>,
    pub sender: Arc<dyn MessageSender>,
    pub options: RobotOptions,
}

impl RobotContext {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        sender: Arc<dyn MessageSender>,
        options: RobotOptions,
    ) -> Self {
        Self {
            documents,
            sender,
            options,
        }
    }

    /// Look up the device token of `user_id`.
    ///
    /// Whitespace-only tokens count as missing; a message is never built
    /// for an empty token.
    pub async fn device_token(&self, user_id: &str) -> Result<DeviceToken, FirestoreError> {
        let lookup = self
            .documents
            .get_document(&self.options.users_collection, user_id)
            .await;

        let user = match lookup {
            Ok(Some(user)) => user,
            Ok(None) => {
                TokenLookupMetrics::record("missing_user");
                return Ok(DeviceToken::UserNotFound);
            }
            Err(e) => {
                TokenLookupMetrics::record("error");
                return Err(e);
            }
        };

        match first_text(&user.fields, &[self.options.token_field.as_str()]) {
            Some(token) if !token.trim().is_empty() => {
                TokenLookupMetrics::record("found");
                Ok(DeviceToken::Found(token))
            }
            _ => {
                TokenLookupMetrics::record("missing_token");
                Ok(DeviceToken::Missing)
            }
        }
    }
}
