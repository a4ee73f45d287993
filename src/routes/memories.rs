//! HTTP routes for memories
//!
//! Read-only surface: memories are written by the model layer, never over
//! HTTP. Mutating verbs answer with the fixed disabled-operation error.
//!
//! - `GET /api/memories`      - list, optionally filtered by owner/creator
//! - `GET /api/memories/{id}` - single memory

use bson::Document;
use hyper::{Method, Request, Response};
use serde_json::Value;
use std::sync::Arc;

use crate::db::schemas::PersonDoc;
use crate::routes::envelope::{
    self, disabled, fail, method_not_allowed, not_found_route, ok, page_params, page_skip,
    BoxBody,
};
use crate::server::AppState;
use crate::types::AgoraError;

/// Parsed memory route components
#[derive(Debug, PartialEq)]
enum MemoryRoute<'a> {
    Collection,
    Item(&'a str),
}

impl<'a> MemoryRoute<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let stripped = path.strip_prefix("/api/memories")?;
        if stripped.is_empty() {
            return Some(MemoryRoute::Collection);
        }
        let id = stripped.strip_prefix('/')?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(MemoryRoute::Item(id))
    }
}

/// Dispatch memory routes
pub async fn handle_memory_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    _actor: PersonDoc,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    match (method, MemoryRoute::parse(&path)) {
        (Method::GET, Some(MemoryRoute::Collection)) => list_memories(state, &query).await,
        (Method::GET, Some(MemoryRoute::Item(id))) => {
            let id = id.to_string();
            get_memory(state, &id).await
        }
        (Method::POST, Some(MemoryRoute::Collection)) => disabled("Memory creation"),
        (Method::PUT, Some(MemoryRoute::Item(_))) => disabled("Memory update"),
        (Method::DELETE, Some(MemoryRoute::Item(_))) => disabled("Memory deletion"),
        (_, Some(_)) => method_not_allowed(),
        (_, None) => not_found_route(&path),
    }
}

async fn list_memories(state: Arc<AppState>, query: &str) -> Response<BoxBody> {
    let params = envelope::parse_query_params(query);
    let (page, limit) = match page_params(&params, 100) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let mut filter = Document::new();

    // Filter persons must themselves exist and be live
    if let Some(owner_id) = params.get("owner_id") {
        match state.db.persons.find_by_id(owner_id).await {
            Ok(Some(_)) => {
                filter.insert("owner_id", owner_id.as_str());
            }
            Ok(None) => return fail(&AgoraError::NotFound(format!("Owner {}", owner_id))),
            Err(e) => return fail(&e),
        }
    }
    if let Some(creator_id) = params.get("creator_id") {
        match state.db.persons.find_by_id(creator_id).await {
            Ok(Some(_)) => {
                filter.insert("creator_id", creator_id.as_str());
            }
            Ok(None) => {
                return fail(&AgoraError::NotFound(format!("Creator {}", creator_id)))
            }
            Err(e) => return fail(&e),
        }
    }

    match state
        .db
        .memories
        .find_many(filter, page_skip(page, limit), limit)
        .await
    {
        Ok(memories) => ok(
            "Memories retrieved successfully",
            Value::Array(memories.iter().map(|m| m.api_view()).collect()),
        ),
        Err(e) => fail(&e),
    }
}

async fn get_memory(state: Arc<AppState>, id: &str) -> Response<BoxBody> {
    match state.db.memories.find_by_id(id).await {
        Ok(Some(memory)) => ok("Memory retrieved successfully", memory.api_view()),
        Ok(None) => fail(&AgoraError::NotFound("Memory".into())),
        Err(e) => fail(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(
            MemoryRoute::parse("/api/memories"),
            Some(MemoryRoute::Collection)
        );
        assert_eq!(
            MemoryRoute::parse("/api/memories/m1"),
            Some(MemoryRoute::Item("m1"))
        );
        assert_eq!(MemoryRoute::parse("/api/memories/m1/tags"), None);
    }
}
