//! CloudEvent models for Firestore document events.
//!
//! Eventarc delivers events over HTTP in one of two CloudEvents modes:
//! 1. Binary: attributes in `ce-*` headers, the event data as the body
//! 2. Structured: `application/cloudevents+json` body carrying attributes and `data`

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::firestore::{relative_path, Document, RawDocument};
use crate::notification::{DispatchResult, DocumentCreated};

pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

/// Event types that mean "a document was created"
pub const CREATED_EVENT_TYPES: &[&str] = &[
    "google.cloud.firestore.document.v1.created",
    "google.cloud.firestore.document.v1.created.withAuthContext",
];

/// Firestore `DocumentEventData` in JSON form
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEventData {
    /// Document after the change (present for creates)
    pub value: Option<RawDocument>,
    /// Document before the change (absent for creates)
    pub old_value: Option<RawDocument>,
}

/// Structured-mode envelope
#[derive(Debug, Deserialize)]
struct StructuredEvent {
    id: Option<String>,
    #[serde(rename = "type")]
    event_type: Option<String>,
    source: Option<String>,
    subject: Option<String>,
    #[serde(default)]
    data: Option<DocumentEventData>,
}

/// A CloudEvent carrying Firestore document data
#[derive(Debug)]
pub struct FirestoreCloudEvent {
    pub id: String,
    pub event_type: String,
    pub source: Option<String>,
    /// `documents/{path}` for Firestore events
    pub subject: Option<String>,
    pub data: DocumentEventData,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_data(body: &[u8]) -> Result<DocumentEventData> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DocumentEventData::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid event data: {}", e)))
}

impl FirestoreCloudEvent {
    /// Parse an incoming request in binary or structured mode.
    ///
    /// Events without an `id` get a generated one so logs can still be
    /// correlated.
    pub fn from_request(headers: &HeaderMap, body: &[u8]) -> Result<Self> {
        let is_structured = header_str(headers, header::CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.starts_with(STRUCTURED_CONTENT_TYPE));

        if is_structured {
            let envelope: StructuredEvent = serde_json::from_slice(body)
                .map_err(|e| AppError::Validation(format!("Invalid CloudEvent: {}", e)))?;
            let event_type = envelope
                .event_type
                .ok_or_else(|| AppError::Validation("CloudEvent is missing `type`".to_string()))?;

            return Ok(Self {
                id: envelope.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                event_type,
                source: envelope.source,
                subject: envelope.subject,
                data: envelope.data.unwrap_or_default(),
            });
        }

        let event_type = header_str(headers, "ce-type")
            .ok_or_else(|| AppError::Validation("Missing ce-type header".to_string()))?;

        Ok(Self {
            id: header_str(headers, "ce-id")
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            event_type: event_type.to_string(),
            source: header_str(headers, "ce-source").map(str::to_string),
            subject: header_str(headers, "ce-subject").map(str::to_string),
            data: parse_data(body)?,
        })
    }

    pub fn is_document_created(&self) -> bool {
        CREATED_EVENT_TYPES.contains(&self.event_type.as_str())
    }

    /// Relative path of the created document.
    ///
    /// The resource name in the payload wins; the subject is the fallback
    /// for events delivered without data.
    pub fn document_path(&self) -> Option<String> {
        self.data
            .value
            .as_ref()
            .map(|doc| relative_path(&doc.name))
            .filter(|path| !path.is_empty())
            .or_else(|| self.subject.as_deref().map(relative_path))
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }

    /// Convert into the dispatcher's input.
    pub fn into_document_created(self) -> Result<DocumentCreated> {
        let path = self.document_path().ok_or_else(|| {
            AppError::Validation("Event has neither a document name nor a subject".to_string())
        })?;

        let document = self.data.value.map(|raw| {
            let mut document = Document::from(raw);
            document.path = path.clone();
            document
        });

        Ok(DocumentCreated {
            event_id: self.id,
            path,
            document,
        })
    }
}

/// Response for `POST /events`
#[derive(Debug, Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub result: DispatchResult,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn binary_headers(event_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("ce-id", HeaderValue::from_static("evt-1"));
        headers.insert("ce-type", HeaderValue::from_str(event_type).unwrap());
        headers.insert(
            "ce-subject",
            HeaderValue::from_static("documents/chats/c1/messages/m1"),
        );
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn chat_body() -> Vec<u8> {
        json!({
            "value": {
                "name": "projects/atlas/databases/(default)/documents/chats/c1/messages/m1",
                "fields": {
                    "toId": {"stringValue": "u2"},
                    "text": {"stringValue": "hey"}
                },
                "createTime": "2024-05-01T10:00:00Z",
                "updateTime": "2024-05-01T10:00:00Z"
            }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_binary_mode() {
        let event = FirestoreCloudEvent::from_request(
            &binary_headers("google.cloud.firestore.document.v1.created"),
            &chat_body(),
        )
        .unwrap();

        assert_eq!(event.id, "evt-1");
        assert!(event.is_document_created());
        assert_eq!(event.document_path().as_deref(), Some("chats/c1/messages/m1"));

        let created = event.into_document_created().unwrap();
        let document = created.document.unwrap();
        assert_eq!(document.get("toId"), Some(&json!("u2")));
    }

    #[test]
    fn test_structured_mode() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(STRUCTURED_CONTENT_TYPE));
        let body = json!({
            "specversion": "1.0",
            "id": "evt-2",
            "type": "google.cloud.firestore.document.v1.created.withAuthContext",
            "source": "//firestore.googleapis.com/projects/atlas/databases/(default)",
            "subject": "documents/broadcasts/b1",
            "data": {
                "value": {
                    "name": "projects/atlas/databases/(default)/documents/broadcasts/b1",
                    "fields": {"text": {"stringValue": "Hi all"}}
                }
            }
        })
        .to_string();

        let event = FirestoreCloudEvent::from_request(&headers, body.as_bytes()).unwrap();
        assert_eq!(event.id, "evt-2");
        assert!(event.is_document_created());
        assert_eq!(event.document_path().as_deref(), Some("broadcasts/b1"));
    }

    #[test]
    fn test_subject_fallback_without_data() {
        let event = FirestoreCloudEvent::from_request(
            &binary_headers("google.cloud.firestore.document.v1.created"),
            b"",
        )
        .unwrap();

        let created = event.into_document_created().unwrap();
        assert_eq!(created.path, "chats/c1/messages/m1");
        assert!(created.document.is_none());
    }

    #[test]
    fn test_other_event_types_not_created() {
        let event = FirestoreCloudEvent::from_request(
            &binary_headers("google.cloud.firestore.document.v1.updated"),
            &chat_body(),
        )
        .unwrap();
        assert!(!event.is_document_created());
    }

    #[test]
    fn test_missing_type_rejected() {
        let result = FirestoreCloudEvent::from_request(&HeaderMap::new(), &chat_body());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let result = FirestoreCloudEvent::from_request(
            &binary_headers("google.cloud.firestore.document.v1.created"),
            b"{not json",
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_missing_id_generated() {
        let mut headers = binary_headers("google.cloud.firestore.document.v1.created");
        headers.remove("ce-id");

        let event = FirestoreCloudEvent::from_request(&headers, &chat_body()).unwrap();
        assert!(Uuid::parse_str(&event.id).is_ok());
    }
}
