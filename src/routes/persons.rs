//! HTTP routes for persons
//!
//! - `GET    /api/persons`      - list persons, optionally filtered by role
//! - `POST   /api/persons`      - create a person (access token generated)
//! - `GET    /api/persons/{id}` - person plus the memories about them
//! - `PUT    /api/persons/{id}` - merge updates into a person
//! - `DELETE /api/persons/{id}` - soft-delete a person

use bson::{doc, Document};
use hyper::{Method, Request, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::schemas::{
    Gender, LanguagePreference, Metadata, PersonDoc, Role,
};
use crate::routes::envelope::{
    self, fail, method_not_allowed, not_found_route, ok, page_params, page_skip, parse_json_body,
    BoxBody,
};
use crate::server::AppState;
use crate::types::{AgoraError, Result};

/// Parsed person route components
#[derive(Debug, PartialEq)]
enum PersonRoute<'a> {
    Collection,
    Item(&'a str),
}

impl<'a> PersonRoute<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let stripped = path.strip_prefix("/api/persons")?;
        if stripped.is_empty() {
            return Some(PersonRoute::Collection);
        }
        let id = stripped.strip_prefix('/')?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(PersonRoute::Item(id))
    }
}

/// Create/update payload; absent fields are left untouched on update
#[derive(Debug, Deserialize)]
struct PersonPayload {
    name: Option<String>,
    gender: Option<Gender>,
    birthday: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    role: Option<Role>,
    language_preference: Option<LanguagePreference>,
    address: Option<String>,
    description: Option<String>,
    avatar_url: Option<String>,
}

/// Build the `$set` document for a person update from the provided fields.
/// The access token is not an updatable field.
fn person_set_doc(payload: &PersonPayload) -> Result<Document> {
    let mut set = Document::new();
    if let Some(name) = &payload.name {
        set.insert("name", name.as_str());
    }
    if let Some(gender) = &payload.gender {
        set.insert("gender", to_bson_value(gender)?);
    }
    if let Some(birthday) = &payload.birthday {
        set.insert("birthday", birthday.as_str());
    }
    if let Some(email) = &payload.email {
        set.insert("email", email.as_str());
    }
    if let Some(phone) = &payload.phone {
        set.insert("phone", phone.as_str());
    }
    if let Some(role) = &payload.role {
        set.insert("role", to_bson_value(role)?);
    }
    if let Some(language) = &payload.language_preference {
        set.insert("language_preference", to_bson_value(language)?);
    }
    if let Some(address) = &payload.address {
        set.insert("address", address.as_str());
    }
    if let Some(description) = &payload.description {
        set.insert("description", description.as_str());
    }
    if let Some(avatar_url) = &payload.avatar_url {
        set.insert("avatar_url", avatar_url.as_str());
    }
    if set.is_empty() {
        return Err(AgoraError::Validation("no updatable fields supplied".into()));
    }
    Ok(set)
}

fn to_bson_value<T: serde::Serialize>(value: &T) -> Result<bson::Bson> {
    bson::to_bson(value).map_err(|e| AgoraError::Validation(format!("invalid field value: {}", e)))
}

/// Dispatch person routes
pub async fn handle_person_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    _actor: PersonDoc,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    match (method, PersonRoute::parse(&path)) {
        (Method::GET, Some(PersonRoute::Collection)) => list_persons(state, &query).await,
        (Method::POST, Some(PersonRoute::Collection)) => create_person(req, state).await,
        (Method::GET, Some(PersonRoute::Item(id))) => {
            let id = id.to_string();
            get_person(state, &id).await
        }
        (Method::PUT, Some(PersonRoute::Item(id))) => {
            let id = id.to_string();
            update_person(req, state, &id).await
        }
        (Method::DELETE, Some(PersonRoute::Item(id))) => {
            let id = id.to_string();
            delete_person(state, &id).await
        }
        (_, Some(_)) => method_not_allowed(),
        (_, None) => not_found_route(&path),
    }
}

async fn list_persons(state: Arc<AppState>, query: &str) -> Response<BoxBody> {
    let params = envelope::parse_query_params(query);
    let (page, limit) = match page_params(&params, 100) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let mut filter = Document::new();
    if let Some(role) = params.get("role") {
        filter.insert("role", role.as_str());
    }

    match state
        .db
        .persons
        .find_many(filter, page_skip(page, limit), limit)
        .await
    {
        Ok(persons) => ok(
            "Persons retrieved successfully",
            Value::Array(persons.iter().map(|p| p.api_view()).collect()),
        ),
        Err(e) => fail(&e),
    }
}

async fn get_person(state: Arc<AppState>, id: &str) -> Response<BoxBody> {
    let person = match state.db.persons.find_by_id(id).await {
        Ok(Some(p)) => p,
        Ok(None) => return fail(&AgoraError::NotFound("Person".into())),
        Err(e) => return fail(&e),
    };

    let memories = match state
        .db
        .memories
        .find_many(doc! { "owner_id": id }, 0, 100)
        .await
    {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    ok(
        "Person retrieved successfully",
        json!({
            "person": person.api_view(),
            "memories": memories.iter().map(|m| m.api_view()).collect::<Vec<_>>(),
        }),
    )
}

async fn create_person(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let payload: PersonPayload = match parse_json_body(req).await {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let mut person = PersonDoc {
        _id: None,
        metadata: Metadata::new(),
        name: payload.name,
        gender: payload.gender,
        birthday: payload.birthday,
        email: payload.email,
        phone: payload.phone,
        // The token is the sole credential and is always server-generated
        access_token: Some(Uuid::new_v4().simple().to_string()),
        role: payload.role.unwrap_or(Role::Human),
        language_preference: payload
            .language_preference
            .unwrap_or(LanguagePreference::Chinese),
        address: payload.address,
        description: payload.description,
        avatar_url: payload.avatar_url,
    };

    match state.db.persons.insert_one(&mut person).await {
        Ok(id) => {
            person._id = Some(id);
            ok("Person created successfully", person.api_view())
        }
        Err(e) => fail(&e),
    }
}

async fn update_person(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    let payload: PersonPayload = match parse_json_body(req).await {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let set = match person_set_doc(&payload) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    match state.db.persons.update_by_id(id, set).await {
        Ok(true) => ok("Person updated successfully", json!({})),
        Ok(false) => fail(&AgoraError::NotFound("Person".into())),
        Err(e) => fail(&e),
    }
}

async fn delete_person(state: Arc<AppState>, id: &str) -> Response<BoxBody> {
    match state.db.persons.soft_delete(id).await {
        Ok(true) => ok("Person deleted successfully", json!({ "id": id })),
        Ok(false) => fail(&AgoraError::NotFound("Person".into())),
        Err(e) => fail(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_route() {
        assert_eq!(
            PersonRoute::parse("/api/persons"),
            Some(PersonRoute::Collection)
        );
    }

    #[test]
    fn test_parse_item_route() {
        assert_eq!(
            PersonRoute::parse("/api/persons/abc123"),
            Some(PersonRoute::Item("abc123"))
        );
    }

    #[test]
    fn test_parse_rejects_trailing_or_nested() {
        assert_eq!(PersonRoute::parse("/api/persons/"), None);
        assert_eq!(PersonRoute::parse("/api/persons/a/b"), None);
        assert_eq!(PersonRoute::parse("/api/tools"), None);
    }

    #[test]
    fn test_person_set_doc_skips_absent_fields() {
        let payload: PersonPayload = serde_json::from_value(json!({
            "name": "Laozi",
            "role": "ai",
        }))
        .unwrap();
        let set = person_set_doc(&payload).unwrap();
        assert_eq!(set.get_str("name").unwrap(), "Laozi");
        assert_eq!(set.get_str("role").unwrap(), "ai");
        assert!(!set.contains_key("email"));
        assert!(!set.contains_key("access_token"));
    }

    #[test]
    fn test_person_set_doc_rejects_empty_payload() {
        let payload: PersonPayload = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            person_set_doc(&payload),
            Err(AgoraError::Validation(_))
        ));
    }

    #[test]
    fn test_payload_rejects_unknown_role() {
        let parsed: std::result::Result<PersonPayload, _> =
            serde_json::from_value(json!({ "role": "superuser" }));
        assert!(parsed.is_err());
    }
}
