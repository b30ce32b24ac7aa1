//! In-memory document store using DashMap.
//!
//! Used by tests and by local runs with `firestore.backend = "memory"`.
//! Documents are lost on restart.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::backend::{validate_id, DocumentStore, FirestoreError};
use super::Document;

#[derive(Default)]
pub struct MemoryDocumentStore {
    /// Documents keyed by relative path
    documents: DashMap<String, Document>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `{collection}/{id}` with the given plain JSON fields.
    pub fn insert(&self, collection: &str, id: &str, fields: Value) {
        let path = format!("{}/{}", collection, id);
        self.documents
            .insert(path.clone(), Document::from_json(path, fields));
    }

    pub fn remove(&self, collection: &str, id: &str) {
        self.documents.remove(&format!("{}/{}", collection, id));
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, FirestoreError> {
        validate_id(collection, id)?;
        let path = format!("{}/{}", collection, id);
        Ok(self.documents.get(&path).map(|doc| doc.value().clone()))
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
