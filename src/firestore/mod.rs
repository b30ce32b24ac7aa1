//! Firestore document model and read access.
//!
//! # Backends
//!
//! - `FirestoreRestBackend`: REST API, authenticated with a `TokenProvider`
//! - `MemoryDocumentStore`: in-memory documents for tests and local runs
//!
//! Use `create_document_store()` to pick one from configuration.

mod backend;
mod document;
mod memory_backend;
mod rest_backend;
mod value;

use std::sync::Arc;

use crate::auth::TokenProvider;
use crate::config::Settings;

pub use backend::{validate_id, DocumentStore, FirestoreError};
pub use document::{relative_path, Document, PathPattern, RawDocument};
pub use memory_backend::MemoryDocumentStore;
pub use rest_backend::FirestoreRestBackend;
pub use value::{decode_fields, decode_value};

/// Create a document store based on configuration.
///
/// - `"memory"`: Returns an empty `MemoryDocumentStore`
/// - `"firestore"` (default): Returns a `FirestoreRestBackend`
pub fn create_document_store(
    settings: &Settings,
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
) -> Arc<dyn DocumentStore> {
    match settings.firestore.backend.as_str() {
        "memory" => {
            tracing::info!(backend = "memory", "Creating memory document store");
            Arc::new(MemoryDocumentStore::new())
        }
        _ => {
            tracing::info!(
                backend = "firestore",
                project_id = %settings.firebase.project_id,
                database = %settings.firestore.database,
                emulator = settings.firestore.emulator,
                auth = tokens.kind(),
                "Creating Firestore document store"
            );
            Arc::new(FirestoreRestBackend::new(
                &settings.firestore,
                &settings.firebase.project_id,
                http,
                tokens,
            ))
        }
    }
}
