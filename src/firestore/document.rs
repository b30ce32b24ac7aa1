use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value::decode_fields;

const DOCUMENTS_MARKER: &str = "/documents/";

/// A Firestore document with its fields decoded into plain JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the database root, e.g. `chats/c1/messages/m1`
    pub path: String,
    pub fields: Map<String, Value>,
}

/// Wire shape of a document in REST responses and event payloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    /// Full resource name (`projects/{p}/databases/{d}/documents/...`)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Value,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Document {
    pub fn new(path: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            fields,
        }
    }

    /// Build a document from a plain JSON object (non-objects give no fields).
    pub fn from_json(path: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(path, fields)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Last path segment (the document id).
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Self {
            path: relative_path(&raw.name).to_string(),
            fields: decode_fields(&raw.fields),
        }
    }
}

/// Strip the `projects/{p}/databases/{d}/documents/` prefix from a resource
/// name. Paths that are already relative (or carry only a leading
/// `documents/`) are returned trimmed.
pub fn relative_path(name: &str) -> &str {
    let trimmed = name.trim_matches('/');
    if let Some(idx) = trimmed.find(DOCUMENTS_MARKER) {
        return &trimmed[idx + DOCUMENTS_MARKER.len()..];
    }
    trimmed.strip_prefix("documents/").unwrap_or(trimmed)
}

/// A document path template such as `chats/{chatId}/messages/{msgId}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .trim_matches('/')
            .split('/')
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                {
                    Some(name) => Segment::Wildcard(name.to_string()),
                    None => Segment::Literal(segment.to_string()),
                }
            })
            .collect();
        Self { segments }
    }

    /// Match a relative document path, returning the wildcard bindings.
    ///
    /// Only paths with exactly as many segments as the pattern match, so
    /// `broadcasts/{id}` never fires for documents in a subcollection.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            if part.is_empty() {
                return None;
            }
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Wildcard(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}
