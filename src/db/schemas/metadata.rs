//! Common metadata for all documents
//!
//! Tracks creation, update, and soft deletion timestamps. A document is
//! live iff `is_deleted` is false; every standard read path filters on it.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// Whether this document has been soft-deleted
    #[serde(default)]
    pub is_deleted: bool,

    /// When the document was soft-deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,

    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata with current timestamp
    pub fn new() -> Self {
        Self {
            is_deleted: false,
            deleted_at: None,
            updated_at: Some(DateTime::now()),
            created_at: Some(DateTime::now()),
        }
    }

    /// Creation time as an RFC 3339 string, for API responses
    pub fn created_at_rfc3339(&self) -> Option<String> {
        self.created_at.and_then(|t| t.try_to_rfc3339_string().ok())
    }

    /// Last-update time as an RFC 3339 string, for API responses
    pub fn updated_at_rfc3339(&self) -> Option<String> {
        self.updated_at.and_then(|t| t.try_to_rfc3339_string().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metadata_is_live() {
        let meta = Metadata::new();
        assert!(!meta.is_deleted);
        assert!(meta.deleted_at.is_none());
        assert!(meta.created_at.is_some());
        assert!(meta.updated_at.is_some());
    }

    #[test]
    fn test_default_deserializes_missing_fields() {
        let meta: Metadata = serde_json::from_str("{}").unwrap();
        assert!(!meta.is_deleted);
        assert!(meta.created_at.is_none());
    }

    #[test]
    fn test_rfc3339_rendering() {
        let meta = Metadata::new();
        let rendered = meta.created_at_rfc3339().unwrap();
        // e.g. 2026-08-05T12:00:00.000Z
        assert!(rendered.contains('T'));
    }
}
