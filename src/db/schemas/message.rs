//! Message document schema
//!
//! Messages are addressed from one conversation member to another. The
//! read flag transitions false to true exactly once, by the receiver.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for messages
pub const MESSAGE_COLLECTION: &str = "messages";

/// Kind of payload a message carries
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Video,
    File,
}

/// Message document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    pub conversation_id: String,

    pub sender_id: String,

    pub receiver_id: String,

    pub message_type: MessageType,

    pub content: Option<String>,

    pub media_url: Option<String>,

    /// Caller-supplied free-form payload; named `extra` in storage so it
    /// cannot collide with the document envelope's `metadata`
    pub extra: Option<Value>,

    #[serde(default)]
    pub is_read: bool,
}

impl MessageDoc {
    /// Document id as a hex string, empty when the doc has not been persisted
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }

    /// Public JSON view for API responses.
    ///
    /// `extra` is exposed under its wire name `metadata`.
    pub fn api_view(&self) -> Value {
        json!({
            "id": self.id_hex(),
            "conversation_id": self.conversation_id,
            "sender_id": self.sender_id,
            "receiver_id": self.receiver_id,
            "message_type": serde_json::to_value(self.message_type).unwrap_or(Value::Null),
            "content": self.content,
            "media_url": self.media_url,
            "metadata": self.extra,
            "is_read": self.is_read,
            "created_at": self.metadata.created_at_rfc3339(),
            "updated_at": self.metadata.updated_at_rfc3339(),
            "is_deleted": self.metadata.is_deleted,
        })
    }
}

impl IntoIndexes for MessageDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Conversation history listing, bounded by created_at
            (
                doc! { "conversation_id": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("conversation_created_index".to_string())
                        .build(),
                ),
            ),
            // Unread lookup for the mark-read paths
            (
                doc! { "conversation_id": 1, "receiver_id": 1, "is_read": 1 },
                Some(
                    IndexOptions::builder()
                        .name("receiver_unread_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for MessageDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> MessageDoc {
        MessageDoc {
            _id: Some(ObjectId::new()),
            metadata: Metadata::new(),
            conversation_id: "conv-1".to_string(),
            sender_id: "alpha".to_string(),
            receiver_id: "beta".to_string(),
            message_type: MessageType::Text,
            content: Some("hello".to_string()),
            media_url: None,
            extra: Some(json!({ "mood": "curious" })),
            is_read: false,
        }
    }

    #[test]
    fn test_api_view_exposes_extra_as_metadata() {
        let view = sample_message().api_view();
        assert_eq!(view["metadata"]["mood"], "curious");
        assert!(view.get("extra").is_none());
    }

    #[test]
    fn test_message_type_serializes_lowercase() {
        assert_eq!(serde_json::to_value(MessageType::Image).unwrap(), "image");
    }

    #[test]
    fn test_is_read_defaults_false() {
        let msg: MessageDoc = serde_json::from_value(json!({
            "conversation_id": "conv-1",
            "sender_id": "alpha",
            "receiver_id": "beta",
            "message_type": "text",
            "content": null,
            "media_url": null,
            "extra": null,
        }))
        .unwrap();
        assert!(!msg.is_read);
    }
}
