//! Conversation document schema
//!
//! A conversation is a named set of person ids. Membership never drops
//! below one; the creator is always included at creation.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for conversations
pub const CONVERSATION_COLLECTION: &str = "conversations";

/// Name given to conversations created without one
pub const DEFAULT_CONVERSATION_NAME: &str = "new conversation";

fn default_name() -> String {
    DEFAULT_CONVERSATION_NAME.to_string()
}

/// Conversation document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversationDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default = "default_name")]
    pub name: String,

    /// Person ids of the members; treated as a set, stored sorted
    pub members: Vec<String>,
}

impl ConversationDoc {
    pub fn new(name: String, members: Vec<String>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            name,
            members,
        }
    }

    /// Document id as a hex string, empty when the doc has not been persisted
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }

    /// Whether the given person id is currently a member
    pub fn has_member(&self, person_id: &str) -> bool {
        self.members.iter().any(|m| m == person_id)
    }

    /// Public JSON view for API responses
    pub fn api_view(&self) -> Value {
        json!({
            "id": self.id_hex(),
            "name": self.name,
            "members": self.members,
            "created_at": self.metadata.created_at_rfc3339(),
            "updated_at": self.metadata.updated_at_rfc3339(),
            "is_deleted": self.metadata.is_deleted,
        })
    }
}

impl IntoIndexes for ConversationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Membership containment drives the per-actor listing
            (
                doc! { "members": 1 },
                Some(
                    IndexOptions::builder()
                        .name("members_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ConversationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_member() {
        let conv = ConversationDoc::new(
            "reading club".to_string(),
            vec!["alpha".to_string(), "beta".to_string()],
        );
        assert!(conv.has_member("alpha"));
        assert!(!conv.has_member("gamma"));
    }

    #[test]
    fn test_name_defaults_on_missing_field() {
        let conv: ConversationDoc =
            serde_json::from_value(json!({ "members": ["alpha"] })).unwrap();
        assert_eq!(conv.name, DEFAULT_CONVERSATION_NAME);
    }

    #[test]
    fn test_api_view_shape() {
        let conv = ConversationDoc::new("salon".to_string(), vec!["alpha".to_string()]);
        let view = conv.api_view();
        assert_eq!(view["name"], "salon");
        assert_eq!(view["members"], json!(["alpha"]));
        assert_eq!(view["is_deleted"], false);
    }
}
