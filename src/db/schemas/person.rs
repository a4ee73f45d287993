//! Person document schema
//!
//! Persons are both API actors (authenticated by `access_token`) and
//! conversation participants. The token is the sole credential and is never
//! serialized into API responses.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for persons
pub const PERSON_COLLECTION: &str = "persons";

/// Role of a person, determining what it may do as a request actor
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Human,
    Ai,
}

/// Gender of a person
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Preferred language for generated replies
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePreference {
    Chinese,
    English,
    Japanese,
}

fn default_role() -> Role {
    Role::Human
}

fn default_language() -> LanguagePreference {
    LanguagePreference::Chinese
}

/// Person document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PersonDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    pub name: Option<String>,

    pub gender: Option<Gender>,

    /// Birth date as an opaque string, e.g. "1990-01-01"
    pub birthday: Option<String>,

    pub email: Option<String>,

    pub phone: Option<String>,

    /// Sole authentication credential; unique across live persons
    pub access_token: Option<String>,

    #[serde(default = "default_role")]
    pub role: Role,

    #[serde(default = "default_language")]
    pub language_preference: LanguagePreference,

    pub address: Option<String>,

    pub description: Option<String>,

    pub avatar_url: Option<String>,
}

impl PersonDoc {
    /// Document id as a hex string, empty when the doc has not been persisted
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }

    /// Public JSON view for API responses; never includes `access_token`
    pub fn api_view(&self) -> Value {
        json!({
            "id": self.id_hex(),
            "name": self.name,
            "gender": serde_json::to_value(self.gender).unwrap_or(Value::Null),
            "birthday": self.birthday,
            "email": self.email,
            "phone": self.phone,
            "role": serde_json::to_value(self.role).unwrap_or(Value::Null),
            "language_preference": serde_json::to_value(self.language_preference).unwrap_or(Value::Null),
            "address": self.address,
            "description": self.description,
            "avatar_url": self.avatar_url,
            "created_at": self.metadata.created_at_rfc3339(),
            "updated_at": self.metadata.updated_at_rfc3339(),
            "is_deleted": self.metadata.is_deleted,
        })
    }
}

impl IntoIndexes for PersonDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique token lookup for authentication; sparse because legacy
            // records may predate token generation
            (
                doc! { "access_token": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name("access_token_unique".to_string())
                        .build(),
                ),
            ),
            // Role filter on person listings
            (
                doc! { "role": 1 },
                Some(
                    IndexOptions::builder()
                        .name("role_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for PersonDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_person() -> PersonDoc {
        PersonDoc {
            _id: Some(ObjectId::new()),
            metadata: Metadata::new(),
            name: Some("Nuwa".to_string()),
            gender: Some(Gender::Female),
            birthday: Some("1990-01-01".to_string()),
            email: None,
            phone: None,
            access_token: Some("secret-token".to_string()),
            role: Role::Admin,
            language_preference: LanguagePreference::Chinese,
            address: None,
            description: None,
            avatar_url: None,
        }
    }

    #[test]
    fn test_api_view_hides_access_token() {
        let view = sample_person().api_view();
        assert!(view.get("access_token").is_none());
        assert_eq!(view["name"], "Nuwa");
        assert_eq!(view["role"], "admin");
        assert_eq!(view["gender"], "female");
    }

    #[test]
    fn test_api_view_id_is_hex_string() {
        let person = sample_person();
        let view = person.api_view();
        assert_eq!(view["id"], person._id.unwrap().to_hex());
    }

    #[test]
    fn test_role_defaults_to_human() {
        let person: PersonDoc = serde_json::from_value(json!({
            "name": "Plato",
            "gender": null,
            "birthday": null,
            "email": null,
            "phone": null,
            "access_token": null,
            "address": null,
            "description": null,
            "avatar_url": null,
        }))
        .unwrap();
        assert_eq!(person.role, Role::Human);
        assert_eq!(person.language_preference, LanguagePreference::Chinese);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Ai).unwrap(), "ai");
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "admin");
    }
}
