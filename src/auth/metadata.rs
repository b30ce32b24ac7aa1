use async_trait::async_trait;

use super::token::{AuthError, TokenCache, TokenProvider, TokenResponse, SCOPES};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Access tokens from the instance metadata server (Cloud Run, GCE, GKE)
pub struct MetadataTokenProvider {
    http: reqwest::Client,
    url: String,
    cache: TokenCache,
}

impl MetadataTokenProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_url(http, METADATA_TOKEN_URL)
    }

    pub fn with_url(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            cache: TokenCache::new(),
        }
    }

    async fn request_token(&self) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", SCOPES.join(","))])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<TokenResponse>().await?)
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    #[tracing::instrument(name = "auth.metadata", skip(self))]
    async fn access_token(&self) -> Result<String, AuthError> {
        self.cache.get_or_refresh(|| self.request_token()).await
    }

    fn kind(&self) -> &'static str {
        "metadata"
    }
}
