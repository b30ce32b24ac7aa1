//! Backend trait for document lookups.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthError;

use super::Document;

#[derive(Debug, Error)]
pub enum FirestoreError {
    /// Ids with slashes would address a different document
    #[error("Invalid document id {id:?} in collection {collection}")]
    InvalidId { collection: String, id: String },

    #[error("Invalid Firestore URL: {0}")]
    InvalidUrl(String),

    #[error("Credential error: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Firestore returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Read access to single documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch `{collection}/{id}`; `Ok(None)` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, FirestoreError>;

    /// Backend type identifier
    fn backend_type(&self) -> &'static str;
}

/// Reject ids that are empty or would escape the collection.
pub fn validate_id(collection: &str, id: &str) -> Result<(), FirestoreError> {
    if id.is_empty() || id.contains('/') || id == "." || id == ".." {
        return Err(FirestoreError::InvalidId {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}
