//! Google API credentials.
//!
//! Firestore reads and FCM sends both authenticate with an OAuth bearer
//! token. Three sources are supported:
//!
//! - `ServiceAccountTokenProvider`: RS256 assertion signed with a service
//!   account key, exchanged at the OAuth token endpoint
//! - `MetadataTokenProvider`: the instance metadata server
//! - `StaticTokenProvider`: a fixed token (emulators, tests)

mod metadata;
mod service_account;
mod token;

use std::sync::Arc;

use crate::config::{AuthMode, FirebaseConfig};

pub use metadata::MetadataTokenProvider;
pub use service_account::{AssertionClaims, ServiceAccountKey, ServiceAccountTokenProvider};
pub use token::{AuthError, StaticTokenProvider, TokenProvider, SCOPES};

/// Create the token provider selected by `firebase.auth`.
pub fn create_token_provider(
    config: &FirebaseConfig,
    http: reqwest::Client,
) -> Result<Arc<dyn TokenProvider>, AuthError> {
    match config.auth {
        AuthMode::ServiceAccount => {
            let path = config.credentials_file.as_deref().ok_or_else(|| {
                AuthError::Missing("firebase.credentials_file is required for service_account auth".to_string())
            })?;
            let key = ServiceAccountKey::from_file(path)?;

            if let Some(ref key_project) = key.project_id {
                if key_project != &config.project_id {
                    tracing::warn!(
                        key_project = %key_project,
                        configured_project = %config.project_id,
                        "Service account key belongs to a different project"
                    );
                }
            }

            let provider = ServiceAccountTokenProvider::new(key, http)?;
            tracing::info!(
                auth = "service_account",
                client_email = %provider.client_email(),
                "Using service account credentials"
            );
            Ok(Arc::new(provider))
        }
        AuthMode::Metadata => {
            tracing::info!(auth = "metadata", "Using metadata server credentials");
            Ok(Arc::new(MetadataTokenProvider::new(http)))
        }
        AuthMode::Static => {
            let token = config.static_token.clone().ok_or_else(|| {
                AuthError::Missing("firebase.static_token is required for static auth".to_string())
            })?;
            tracing::info!(auth = "static", "Using static access token");
            Ok(Arc::new(StaticTokenProvider::new(token)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firebase_config(auth: AuthMode) -> FirebaseConfig {
        FirebaseConfig {
            project_id: "atlas".to_string(),
            credentials_file: None,
            auth,
            static_token: None,
        }
    }

    #[test]
    fn test_service_account_requires_key_file() {
        let result = create_token_provider(&firebase_config(AuthMode::ServiceAccount), reqwest::Client::new());
        assert!(matches!(result, Err(AuthError::Missing(_))));
    }

    #[test]
    fn test_static_requires_token() {
        let result = create_token_provider(&firebase_config(AuthMode::Static), reqwest::Client::new());
        assert!(matches!(result, Err(AuthError::Missing(_))));

        let mut config = firebase_config(AuthMode::Static);
        config.static_token = Some("owner".to_string());
        let provider = create_token_provider(&config, reqwest::Client::new()).unwrap();
        assert_eq!(provider.kind(), "static");
    }

    #[test]
    fn test_metadata_provider() {
        let provider = create_token_provider(&firebase_config(AuthMode::Metadata), reqwest::Client::new()).unwrap();
        assert_eq!(provider.kind(), "metadata");
    }
}
