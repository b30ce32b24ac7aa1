//! Firestore REST backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use crate::auth::TokenProvider;
use crate::config::FirestoreConfig;

use super::backend::{validate_id, DocumentStore, FirestoreError};
use super::document::{Document, RawDocument};

/// Emulators accept this fixed bearer token as an admin credential
const EMULATOR_TOKEN: &str = "owner";

/// Reads documents through `GET .../documents/{collection}/{id}`.
pub struct FirestoreRestBackend {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    documents_url: String,
    emulator: bool,
    timeout: Duration,
}

impl FirestoreRestBackend {
    pub fn new(
        config: &FirestoreConfig,
        project_id: &str,
        http: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            config.base_url.trim_end_matches('/'),
            project_id,
            config.database
        );

        Self {
            http,
            tokens,
            documents_url,
            emulator: config.emulator,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// URL of `{collection}/{id}`.
    ///
    /// Both are appended as single path segments, so `?`, `#` and `%` in an
    /// id are percent-encoded and can never address another document.
    pub fn document_url(&self, collection: &str, id: &str) -> Result<Url, FirestoreError> {
        let mut url = Url::parse(&self.documents_url)
            .map_err(|e| FirestoreError::InvalidUrl(format!("{}: {}", self.documents_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| FirestoreError::InvalidUrl(self.documents_url.clone()))?
            .pop_if_empty()
            .push(collection)
            .push(id);

        Ok(url)
    }

    async fn bearer(&self) -> Result<String, FirestoreError> {
        if self.emulator {
            return Ok(EMULATOR_TOKEN.to_string());
        }
        Ok(self.tokens.access_token().await?)
    }
}

#[async_trait]
impl DocumentStore for FirestoreRestBackend {
    #[tracing::instrument(name = "firestore.get_document", skip(self))]
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, FirestoreError> {
        validate_id(collection, id)?;

        let response = self
            .http
            .get(self.document_url(collection, id)?)
            .bearer_auth(self.bearer().await?)
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(collection = %collection, id = %id, "Document not found");
                Ok(None)
            }
            status if status.is_success() => {
                let raw = response.json::<RawDocument>().await?;
                Ok(Some(Document::from(raw)))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(FirestoreError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    fn backend_type(&self) -> &'static str {
        "firestore"
    }
}
