use std::sync::Arc;
use std::time::Instant;

use crate::auth::create_token_provider;
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::firestore::{create_document_store, DocumentStore};
use crate::messaging::{create_message_sender, MessageSender};
use crate::notification::{NotificationDispatcher, RobotContext, RobotOptions};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub start_time: Instant,
}

impl AppState {
    /// Build the state from configuration: credentials, document store and
    /// message sender all come from their factories.
    pub fn new(settings: Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("atlas-push-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let tokens = create_token_provider(&settings.firebase, http.clone())?;
        let documents = create_document_store(&settings, http.clone(), tokens.clone());
        let sender = create_message_sender(&settings, http, tokens);

        Ok(Self::with_components(settings, documents, sender))
    }

    /// Build the state around existing backends.
    pub fn with_components(
        settings: Settings,
        documents: Arc<dyn DocumentStore>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        let context = RobotContext::new(documents, sender, RobotOptions::from(&settings));
        let dispatcher = Arc::new(NotificationDispatcher::new(context));

        Self {
            settings: Arc::new(settings),
            dispatcher,
            start_time: Instant::now(),
        }
    }
}
