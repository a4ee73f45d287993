//! Tool document schema
//!
//! Tools are read-only catalog entries at the HTTP boundary; mutation is
//! rejected with a fixed disabled-operation error.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for tools
pub const TOOL_COLLECTION: &str = "tools";

/// Tool document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    pub name: String,

    pub description: Option<String>,

    pub content: Option<String>,
}

impl ToolDoc {
    /// Document id as a hex string, empty when the doc has not been persisted
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }

    /// Public JSON view for API responses
    pub fn api_view(&self) -> Value {
        json!({
            "id": self.id_hex(),
            "name": self.name,
            "description": self.description,
            "content": self.content,
            "created_at": self.metadata.created_at_rfc3339(),
            "updated_at": self.metadata.updated_at_rfc3339(),
            "is_deleted": self.metadata.is_deleted,
        })
    }
}

impl IntoIndexes for ToolDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "name": 1 },
            Some(
                IndexOptions::builder()
                    .name("name_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ToolDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_view_shape() {
        let tool = ToolDoc {
            _id: Some(ObjectId::new()),
            metadata: Metadata::new(),
            name: "notepad".to_string(),
            description: Some("a simple notepad".to_string()),
            content: None,
        };
        let view = tool.api_view();
        assert_eq!(view["name"], "notepad");
        assert_eq!(view["description"], "a simple notepad");
        assert_eq!(view["content"], Value::Null);
    }
}
