//! Memory document schema
//!
//! Memories record facts about a person. They are append-only from the
//! API's perspective: creation happens at the model layer, and the HTTP
//! surface exposes reads only.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for memories
pub const MEMORY_COLLECTION: &str = "memories";

/// Memory document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MemoryDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Person the memory is about
    pub owner_id: String,

    /// Person that recorded the memory
    pub creator_id: String,

    pub title: String,

    pub content: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl MemoryDoc {
    pub fn new(
        owner_id: String,
        creator_id: String,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            owner_id,
            creator_id,
            title,
            content,
            tags,
        }
    }

    /// Document id as a hex string, empty when the doc has not been persisted
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }

    /// Public JSON view for API responses
    pub fn api_view(&self) -> Value {
        json!({
            "id": self.id_hex(),
            "owner_id": self.owner_id,
            "creator_id": self.creator_id,
            "title": self.title,
            "content": self.content,
            "tags": self.tags,
            "created_at": self.metadata.created_at_rfc3339(),
            "updated_at": self.metadata.updated_at_rfc3339(),
            "is_deleted": self.metadata.is_deleted,
        })
    }
}

impl IntoIndexes for MemoryDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "owner_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("owner_id_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "creator_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("creator_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for MemoryDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_view_shape() {
        let memory = MemoryDoc::new(
            "owner-1".to_string(),
            "creator-1".to_string(),
            "travel".to_string(),
            "leaves for the mountains on saturday".to_string(),
            vec!["travel".to_string()],
        );
        let view = memory.api_view();
        assert_eq!(view["owner_id"], "owner-1");
        assert_eq!(view["title"], "travel");
        assert_eq!(view["tags"], json!(["travel"]));
    }

    #[test]
    fn test_tags_default_empty() {
        let memory: MemoryDoc = serde_json::from_value(json!({
            "owner_id": "o",
            "creator_id": "c",
            "title": "t",
            "content": "c",
        }))
        .unwrap();
        assert!(memory.tags.is_empty());
    }
}
