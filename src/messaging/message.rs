use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::MessagingError;

/// A push message in FCM HTTP v1 shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Exactly one delivery target
    #[serde(flatten)]
    pub target: Target,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,
    /// Custom key/value data delivered to the app
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

/// Where a message is delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// A single device registration token
    Token(String),
    /// Every device subscribed to a topic
    Topic(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Apple-specific delivery options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    /// Wakes the app in the background
    #[serde(
        rename = "content-available",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_available: Option<u8>,
}

impl Target {
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Token(_) => "token",
            Target::Topic(_) => "topic",
        }
    }
}

impl Message {
    pub fn builder(target: Target) -> MessageBuilder {
        MessageBuilder::new(target)
    }

    pub fn aps(&self) -> Option<&Aps> {
        self.apns.as_ref().map(|apns| &apns.payload.aps)
    }
}

/// Builder for push messages
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    target: Target,
    notification: Option<Notification>,
    aps: Option<Aps>,
    data: BTreeMap<String, String>,
}

impl MessageBuilder {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            notification: None,
            aps: None,
            data: BTreeMap::new(),
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::new(Target::Token(token.into()))
    }

    pub fn topic(topic: impl Into<String>) -> Self {
        Self::new(Target::Topic(topic.into()))
    }

    /// Set the visible title and body
    pub fn notification(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.notification = Some(Notification {
            title: title.into(),
            body: body.into(),
        });
        self
    }

    /// Play a sound on iOS
    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.aps.get_or_insert_with(Aps::default).sound = Some(sound.into());
        self
    }

    /// Set the iOS app icon badge
    pub fn badge(mut self, badge: u32) -> Self {
        self.aps.get_or_insert_with(Aps::default).badge = Some(badge);
        self
    }

    /// Mark the message as background-refresh capable on iOS
    pub fn content_available(mut self) -> Self {
        self.aps.get_or_insert_with(Aps::default).content_available = Some(1);
        self
    }

    /// Add a custom data entry
    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Build the message, rejecting empty targets
    pub fn build(self) -> Result<Message, MessagingError> {
        match &self.target {
            Target::Token(token) if token.trim().is_empty() => {
                return Err(MessagingError::EmptyTarget("token"))
            }
            Target::Topic(topic) if topic.trim().is_empty() => {
                return Err(MessagingError::EmptyTarget("topic"))
            }
            _ => {}
        }

        Ok(Message {
            target: self.target,
            notification: self.notification,
            apns: self.aps.map(|aps| ApnsConfig {
                payload: ApnsPayload { aps },
            }),
            data: self.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_message_wire_shape() {
        let message = MessageBuilder::token("device-1")
            .notification("New Message", "hola")
            .sound("default")
            .badge(1)
            .content_available()
            .data("type", "chat")
            .build()
            .unwrap();

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "token": "device-1",
                "notification": {"title": "New Message", "body": "hola"},
                "apns": {"payload": {"aps": {"sound": "default", "badge": 1, "content-available": 1}}},
                "data": {"type": "chat"}
            })
        );
    }

    #[test]
    fn test_topic_message_omits_empty_parts() {
        let message = MessageBuilder::topic("general")
            .notification("t", "b")
            .build()
            .unwrap();

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"topic": "general", "notification": {"title": "t", "body": "b"}})
        );
        assert_eq!(message.target.kind(), "topic");
        assert!(message.aps().is_none());
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = MessageBuilder::token("").notification("t", "b").build();
        assert!(matches!(result, Err(MessagingError::EmptyTarget("token"))));

        let result = MessageBuilder::token("   ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_content_available_omitted_when_unset() {
        let message = MessageBuilder::token("device-1")
            .sound("default")
            .badge(1)
            .build()
            .unwrap();

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["apns"]["payload"]["aps"], json!({"sound": "default", "badge": 1}));
    }
}
