//! Firebase Cloud Messaging HTTP v1 backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::TokenProvider;
use crate::config::FcmConfig;

use super::backend::{MessageSender, MessagingError};
use super::Message;

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a Message,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    validate_only: bool,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    error_code: Option<String>,
}

/// Sends messages with `POST /v1/projects/{project}/messages:send`.
pub struct FcmBackend {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    send_url: String,
    dry_run: bool,
    timeout: Duration,
}

impl FcmBackend {
    pub fn new(
        config: &FcmConfig,
        project_id: &str,
        http: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            config.base_url.trim_end_matches('/'),
            project_id
        );

        Self {
            http,
            tokens,
            send_url,
            dry_run: config.dry_run,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

/// Turn a non-2xx FCM response body into a typed error.
///
/// The FCM-specific `errorCode` detail is more precise than the canonical
/// status, so it wins when present.
fn parse_error(status: u16, body: &str) -> MessagingError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope
                .error
                .details
                .iter()
                .find_map(|detail| detail.error_code.clone())
                .unwrap_or(envelope.error.status);
            MessagingError::from_fcm(status, &code, envelope.error.message)
        }
        Err(_) => MessagingError::Api {
            status,
            code: "UNKNOWN".to_string(),
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl MessageSender for FcmBackend {
    #[tracing::instrument(
        name = "fcm.send",
        skip(self, message),
        fields(target = message.target.kind(), dry_run = self.dry_run)
    )]
    async fn send(&self, message: &Message) -> Result<String, MessagingError> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&SendRequest {
                message,
                validate_only: self.dry_run,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &body));
        }

        Ok(response.json::<SendResponse>().await?.name)
    }

    fn backend_type(&self) -> &'static str {
        "fcm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use crate::messaging::MessageBuilder;
    use axum::{
        extract::State,
        http::{header, HeaderMap, StatusCode, Uri},
        response::{IntoResponse, Response},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Path, Authorization header and JSON body of every send the fake saw
    type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    async fn fake_fcm(
        State(seen): State<Seen>,
        uri: Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let token = body["message"]["token"].as_str().map(str::to_string);
        seen.lock()
            .unwrap()
            .push((uri.path().to_string(), auth, body));

        match token.as_deref() {
            Some("stale-device") => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": {
                        "code": 404,
                        "message": "Requested entity was not found.",
                        "status": "NOT_FOUND",
                        "details": [{
                            "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                            "errorCode": "UNREGISTERED"
                        }]
                    }
                })),
            )
                .into_response(),
            _ => Json(json!({"name": "projects/atlas/messages/0:1715"})).into_response(),
        }
    }

    /// Serve the fake FCM API on an ephemeral port and return its base URL
    async fn spawn_fcm() -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new().fallback(fake_fcm).with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), seen)
    }

    fn backend(base_url: &str, dry_run: bool) -> FcmBackend {
        let config = FcmConfig {
            base_url: base_url.to_string(),
            dry_run,
            ..FcmConfig::default()
        };
        FcmBackend::new(
            &config,
            "atlas",
            reqwest::Client::new(),
            Arc::new(StaticTokenProvider::new("sa-token")),
        )
    }

    #[tokio::test]
    async fn test_send_returns_message_name() {
        let (base_url, seen) = spawn_fcm().await;
        let message = MessageBuilder::token("device-1")
            .notification("New Message", "hola")
            .build()
            .unwrap();

        let name = backend(&base_url, false).send(&message).await.unwrap();
        assert_eq!(name, "projects/atlas/messages/0:1715");

        let seen = seen.lock().unwrap();
        let (path, auth, body) = &seen[0];
        assert_eq!(path, "/v1/projects/atlas/messages:send");
        assert_eq!(auth.as_deref(), Some("Bearer sa-token"));
        assert_eq!(body["message"]["token"], "device-1");
        assert_eq!(body["message"]["notification"]["body"], "hola");
        assert!(body.get("validate_only").is_none());
    }

    #[tokio::test]
    async fn test_dry_run_sets_validate_only() {
        let (base_url, seen) = spawn_fcm().await;
        let message = MessageBuilder::topic("general")
            .notification("Atlas News", "hi")
            .build()
            .unwrap();

        backend(&base_url, true).send(&message).await.unwrap();

        assert_eq!(seen.lock().unwrap()[0].2["validate_only"], json!(true));
    }

    #[tokio::test]
    async fn test_error_response_is_classified() {
        let (base_url, _) = spawn_fcm().await;
        let message = MessageBuilder::token("stale-device")
            .notification("t", "b")
            .build()
            .unwrap();

        let err = backend(&base_url, false).send(&message).await.unwrap_err();
        assert!(matches!(err, MessagingError::Unregistered(_)));
        assert_eq!(err.kind(), "unregistered");
    }

    #[test]
    fn test_send_url() {
        let backend = FcmBackend::new(
            &FcmConfig::default(),
            "atlas",
            reqwest::Client::new(),
            Arc::new(StaticTokenProvider::new("t")),
        );
        assert_eq!(
            backend.send_url(),
            "https://fcm.googleapis.com/v1/projects/atlas/messages:send"
        );
    }

    #[test]
    fn test_request_body() {
        let message = MessageBuilder::topic("general")
            .notification("Atlas News", "hi")
            .build()
            .unwrap();

        let body = serde_json::to_value(SendRequest {
            message: &message,
            validate_only: false,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"message": {"topic": "general", "notification": {"title": "Atlas News", "body": "hi"}}})
        );

        let body = serde_json::to_value(SendRequest {
            message: &message,
            validate_only: true,
        })
        .unwrap();
        assert_eq!(body["validate_only"], json!(true));
    }

    #[test]
    fn test_parse_error_prefers_fcm_detail() {
        let body = json!({
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND",
                "details": [{
                    "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                    "errorCode": "UNREGISTERED"
                }]
            }
        })
        .to_string();

        let err = parse_error(404, &body);
        assert_eq!(err.kind(), "unregistered");
    }

    #[test]
    fn test_parse_error_falls_back_to_status() {
        let body = json!({"error": {"code": 503, "message": "busy", "status": "UNAVAILABLE"}}).to_string();
        assert_eq!(parse_error(503, &body).kind(), "unavailable");

        let err = parse_error(502, "<html>bad gateway</html>");
        assert!(matches!(err, MessagingError::Api { status: 502, .. }));
    }
}
