//! In-memory message sender.
//!
//! Records every message instead of delivering it. Used by tests and by
//! local runs with `fcm.backend = "memory"`, where the log line is the
//! only output.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::backend::{MessageSender, MessagingError};
use super::Message;

#[derive(Default)]
pub struct MemoryMessageSender {
    sent: Mutex<Vec<Message>>,
    counter: AtomicU64,
    fail_sends: AtomicBool,
}

impl MemoryMessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with `MessagingError::Rejected`
    pub fn set_failing(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::SeqCst);
    }

    /// Messages accepted so far, oldest first
    pub fn sent(&self) -> Vec<Message> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }
}

#[async_trait]
impl MessageSender for MemoryMessageSender {
    async fn send(&self, message: &Message) -> Result<String, MessagingError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(MessagingError::Rejected(
                "memory sender configured to fail".to_string(),
            ));
        }

        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let name = format!("projects/memory/messages/{}", id);

        tracing::info!(
            message_name = %name,
            target = message.target.kind(),
            title = ?message.notification.as_ref().map(|n| n.title.as_str()),
            "Push message recorded"
        );

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(name)
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::MessageBuilder;

    fn message() -> Message {
        MessageBuilder::token("device-1")
            .notification("t", "b")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_records_messages() {
        let sender = MemoryMessageSender::new();

        let first = sender.send(&message()).await.unwrap();
        let second = sender.send(&message()).await.unwrap();

        assert_eq!(first, "projects/memory/messages/1");
        assert_eq!(second, "projects/memory/messages/2");
        assert_eq!(sender.sent_count(), 2);
        assert_eq!(sender.sent()[0], message());
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let sender = MemoryMessageSender::new();
        sender.set_failing(true);

        let result = sender.send(&message()).await;
        assert!(matches!(result, Err(MessagingError::Rejected(_))));
        assert_eq!(sender.sent_count(), 0);
    }
}
