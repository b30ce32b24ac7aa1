use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

/// OAuth scopes requested for Firestore reads and FCM sends
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/firebase.messaging",
];

/// Tokens are refreshed this long before Google says they expire
const REFRESH_MARGIN_SECONDS: i64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read credentials file {path}: {source}")]
    CredentialsFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid service account key: {0}")]
    InvalidKey(#[from] serde_json::Error),

    #[error("Failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("Missing credentials: {0}")]
    Missing(String),
}

/// Source of bearer tokens for Google APIs
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, refreshed when close to expiry
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Provider name for logs
    fn kind(&self) -> &'static str;
}

/// Token payload shared by the OAuth token endpoint and the metadata server
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Single-slot cache holding the latest access token.
///
/// The lock is held across a refresh so concurrent callers wait for one
/// token request instead of each issuing their own.
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<TokenResponse, AuthError>>,
    {
        let mut slot = self.slot.lock().await;
        let now = Utc::now();

        if let Some(cached) = slot.as_ref() {
            if cached.expires_at - Duration::seconds(REFRESH_MARGIN_SECONDS) > now {
                return Ok(cached.value.clone());
            }
        }

        let response = refresh().await?;
        tracing::debug!(expires_in = response.expires_in, "Access token refreshed");

        let token = CachedToken {
            value: response.access_token,
            expires_at: now + Duration::seconds(response.expires_in),
        };
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }
}

/// Fixed token, used against emulators and in tests
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_cache_reuses_fresh_token() {
        let cache = TokenCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let token = cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(TokenResponse {
                        access_token: "tok-1".to_string(),
                        expires_in: 3600,
                    })
                })
                .await
                .unwrap();
            assert_eq!(token, "tok-1");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_refreshes_near_expiry() {
        let cache = TokenCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    // Inside the refresh margin, so never reused
                    Ok(TokenResponse {
                        access_token: "short".to_string(),
                        expires_in: 30,
                    })
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_propagates_refresh_error() {
        let cache = TokenCache::new();
        let result = cache
            .get_or_refresh(|| async { Err(AuthError::Missing("no key".to_string())) })
            .await;
        tokio_test::assert_err!(result);
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("owner");
        assert_eq!(provider.access_token().await.unwrap(), "owner");
        assert_eq!(provider.kind(), "static");
    }
}
