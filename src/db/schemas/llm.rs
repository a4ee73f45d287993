//! Language-model record schema
//!
//! Records mirror an upstream model catalog and are identified by the
//! (model_name, provider, api_key, base_url) tuple. The HTTP surface never
//! mutates them; the only permitted write besides insert is the soft-delete
//! toggle applied by catalog synchronization.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for language-model records
pub const LLM_COLLECTION: &str = "llms";

/// Language-model record stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LlmDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Model name as listed upstream, e.g. "gpt-4"
    pub model_name: String,

    /// Owner reported by the catalog
    pub provider: String,

    /// Credential the record was synced with; never serialized to clients
    pub api_key: String,

    pub base_url: String,
}

impl LlmDoc {
    pub fn new(model_name: String, provider: String, api_key: String, base_url: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            model_name,
            provider,
            api_key,
            base_url,
        }
    }

    /// Document id as a hex string, empty when the doc has not been persisted
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }

    /// Public JSON view for API responses; omits `api_key` and `base_url`
    pub fn api_view(&self) -> Value {
        json!({
            "id": self.id_hex(),
            "model_name": self.model_name,
            "provider": self.provider,
            "created_at": self.metadata.created_at_rfc3339(),
            "updated_at": self.metadata.updated_at_rfc3339(),
            "is_deleted": self.metadata.is_deleted,
        })
    }
}

impl IntoIndexes for LlmDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Identity tuple; sync relies on this to stay duplicate-free
            (
                doc! { "model_name": 1, "provider": 1, "api_key": 1, "base_url": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("model_identity_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for LlmDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_view_hides_credentials() {
        let llm = LlmDoc::new(
            "gpt-4".to_string(),
            "openai".to_string(),
            "sk-secret".to_string(),
            "https://api.openai.com/v1".to_string(),
        );
        let view = llm.api_view();
        assert!(view.get("api_key").is_none());
        assert!(view.get("base_url").is_none());
        assert_eq!(view["model_name"], "gpt-4");
        assert_eq!(view["provider"], "openai");
    }
}
