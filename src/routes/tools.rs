//! HTTP routes for tools
//!
//! Tools are a read-only catalog; `run` validates the target and answers
//! with an empty result object. Mutating verbs answer with the fixed
//! disabled-operation error.
//!
//! - `GET  /api/tools`          - list tools
//! - `GET  /api/tools/{id}`     - single tool
//! - `POST /api/tools/{id}/run` - invoke a tool

use bson::Document;
use hyper::{Method, Request, Response};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db::schemas::PersonDoc;
use crate::routes::envelope::{
    self, disabled, fail, method_not_allowed, not_found_route, ok, page_params, page_skip,
    BoxBody,
};
use crate::server::AppState;
use crate::types::AgoraError;

/// Parsed tool route components
#[derive(Debug, PartialEq)]
enum ToolRoute<'a> {
    Collection,
    Item(&'a str),
    Run(&'a str),
}

impl<'a> ToolRoute<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let stripped = path.strip_prefix("/api/tools")?;
        if stripped.is_empty() {
            return Some(ToolRoute::Collection);
        }
        let stripped = stripped.strip_prefix('/')?;
        let parts: Vec<&str> = stripped.split('/').collect();

        match parts.as_slice() {
            [id] if !id.is_empty() => Some(ToolRoute::Item(id)),
            [id, "run"] if !id.is_empty() => Some(ToolRoute::Run(id)),
            _ => None,
        }
    }
}

/// Dispatch tool routes
pub async fn handle_tool_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    _actor: PersonDoc,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    match (method, ToolRoute::parse(&path)) {
        (Method::GET, Some(ToolRoute::Collection)) => list_tools(state, &query).await,
        (Method::GET, Some(ToolRoute::Item(id))) => {
            let id = id.to_string();
            get_tool(state, &id).await
        }
        (Method::POST, Some(ToolRoute::Run(id))) => {
            let id = id.to_string();
            run_tool(state, &id).await
        }
        (Method::POST, Some(ToolRoute::Collection)) => disabled("Tool creation"),
        (Method::PUT, Some(ToolRoute::Item(_))) => disabled("Tool update"),
        (Method::DELETE, Some(ToolRoute::Item(_))) => disabled("Tool deletion"),
        (_, Some(_)) => method_not_allowed(),
        (_, None) => not_found_route(&path),
    }
}

async fn list_tools(state: Arc<AppState>, query: &str) -> Response<BoxBody> {
    let params = envelope::parse_query_params(query);
    let (page, limit) = match page_params(&params, 100) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    match state
        .db
        .tools
        .find_many(Document::new(), page_skip(page, limit), limit)
        .await
    {
        Ok(tools) => ok(
            "Tools retrieved successfully",
            Value::Array(tools.iter().map(|t| t.api_view()).collect()),
        ),
        Err(e) => fail(&e),
    }
}

async fn get_tool(state: Arc<AppState>, id: &str) -> Response<BoxBody> {
    match state.db.tools.find_by_id(id).await {
        Ok(Some(tool)) => ok("Tool retrieved successfully", tool.api_view()),
        Ok(None) => fail(&AgoraError::NotFound("Tool".into())),
        Err(e) => fail(&e),
    }
}

/// Tool execution is a stub: the target must exist, the result is empty
async fn run_tool(state: Arc<AppState>, id: &str) -> Response<BoxBody> {
    match state.db.tools.find_by_id(id).await {
        Ok(Some(_)) => ok("Tool run completed", json!({})),
        Ok(None) => fail(&AgoraError::NotFound("Tool".into())),
        Err(e) => fail(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(ToolRoute::parse("/api/tools"), Some(ToolRoute::Collection));
        assert_eq!(
            ToolRoute::parse("/api/tools/t1"),
            Some(ToolRoute::Item("t1"))
        );
        assert_eq!(
            ToolRoute::parse("/api/tools/t1/run"),
            Some(ToolRoute::Run("t1"))
        );
        assert_eq!(ToolRoute::parse("/api/tools/t1/walk"), None);
        assert_eq!(ToolRoute::parse("/api/tools//run"), None);
    }
}
