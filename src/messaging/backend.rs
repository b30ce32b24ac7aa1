//! Backend trait for push message delivery.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthError;

use super::Message;

#[derive(Debug, Error)]
pub enum MessagingError {
    /// A message must name a non-empty token or topic
    #[error("Message {0} must not be empty")]
    EmptyTarget(&'static str),

    #[error("Credential error: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The device token is stale or was never valid for this project
    #[error("Registration token is not registered: {0}")]
    Unregistered(String),

    #[error("Invalid message: {0}")]
    InvalidArgument(String),

    #[error("Sending quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Messaging service unavailable: {0}")]
    Unavailable(String),

    #[error("FCM returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Configured failure of the in-memory sender
    #[error("Send rejected: {0}")]
    Rejected(String),
}

impl MessagingError {
    /// Classify an FCM error by its most specific code.
    pub fn from_fcm(status: u16, code: &str, message: String) -> Self {
        match code {
            "UNREGISTERED" | "NOT_FOUND" => MessagingError::Unregistered(message),
            "INVALID_ARGUMENT" | "SENDER_ID_MISMATCH" => MessagingError::InvalidArgument(message),
            "QUOTA_EXCEEDED" | "RESOURCE_EXHAUSTED" => MessagingError::QuotaExceeded(message),
            "UNAVAILABLE" | "INTERNAL" => MessagingError::Unavailable(message),
            _ => MessagingError::Api {
                status,
                code: code.to_string(),
                message,
            },
        }
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            MessagingError::EmptyTarget(_) => "empty_target",
            MessagingError::Auth(_) => "auth",
            MessagingError::Http(_) => "http",
            MessagingError::Unregistered(_) => "unregistered",
            MessagingError::InvalidArgument(_) => "invalid_argument",
            MessagingError::QuotaExceeded(_) => "quota_exceeded",
            MessagingError::Unavailable(_) => "unavailable",
            MessagingError::Api { .. } => "api",
            MessagingError::Rejected(_) => "rejected",
        }
    }
}

/// Sends a single push message
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `message`, returning the provider's message name
    /// (`projects/{p}/messages/{id}`).
    async fn send(&self, message: &Message) -> Result<String, MessagingError>;

    /// Backend type identifier
    fn backend_type(&self) -> &'static str;
}
