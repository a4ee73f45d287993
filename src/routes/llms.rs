//! HTTP routes for language-model records
//!
//! Records mirror an upstream catalog and never carry credentials out of
//! the API. Only catalog synchronization (admin) mutates them; the other
//! mutating verbs answer with the fixed disabled-operation error.
//!
//! - `GET  /api/llms`        - list records
//! - `GET  /api/llms/{name}` - single record, looked up by model name
//! - `POST /api/llms/sync`   - reconcile against the upstream catalog

use bson::{doc, Document};
use hyper::{Method, Request, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::auth::{authorize, PermissionLevel};
use crate::db::schemas::PersonDoc;
use crate::routes::envelope::{
    self, disabled, fail, method_not_allowed, not_found_route, ok, page_params, page_skip,
    BoxBody,
};
use crate::server::AppState;
use crate::services::catalog::{sync_catalog, CatalogClient};
use crate::types::AgoraError;

/// Parsed llm route components
#[derive(Debug, PartialEq)]
enum LlmRoute<'a> {
    Collection,
    Sync,
    Item(&'a str),
}

impl<'a> LlmRoute<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let stripped = path.strip_prefix("/api/llms")?;
        if stripped.is_empty() {
            return Some(LlmRoute::Collection);
        }
        let name = stripped.strip_prefix('/')?;
        if name.is_empty() || name.contains('/') {
            return None;
        }
        if name == "sync" {
            return Some(LlmRoute::Sync);
        }
        Some(LlmRoute::Item(name))
    }
}

/// Dispatch llm routes
pub async fn handle_llm_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    actor: PersonDoc,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    match (method, LlmRoute::parse(&path)) {
        (Method::GET, Some(LlmRoute::Collection)) => list_llms(state, &query).await,
        (Method::GET, Some(LlmRoute::Item(name))) => {
            let name = name.to_string();
            get_llm(state, &name).await
        }
        (Method::POST, Some(LlmRoute::Sync)) => sync_llms(state, &actor).await,
        (Method::POST, Some(LlmRoute::Collection)) => disabled("LLM creation"),
        (Method::PUT, Some(LlmRoute::Item(_))) => disabled("LLM update"),
        (Method::DELETE, Some(LlmRoute::Item(_))) => disabled("LLM deletion"),
        (_, Some(_)) => method_not_allowed(),
        (_, None) => not_found_route(&path),
    }
}

async fn list_llms(state: Arc<AppState>, query: &str) -> Response<BoxBody> {
    let params = envelope::parse_query_params(query);
    let (page, limit) = match page_params(&params, 100) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    match state
        .db
        .llms
        .find_many(Document::new(), page_skip(page, limit), limit)
        .await
    {
        Ok(llms) => ok(
            "LLMs retrieved successfully",
            Value::Array(llms.iter().map(|l| l.api_view()).collect()),
        ),
        Err(e) => fail(&e),
    }
}

async fn get_llm(state: Arc<AppState>, name: &str) -> Response<BoxBody> {
    match state.db.llms.find_one(doc! { "model_name": name }).await {
        Ok(Some(llm)) => ok("LLM retrieved successfully", llm.api_view()),
        Ok(None) => fail(&AgoraError::NotFound("LLM".into())),
        Err(e) => fail(&e),
    }
}

/// Admin-only reconciliation against the upstream model catalog
async fn sync_llms(state: Arc<AppState>, actor: &PersonDoc) -> Response<BoxBody> {
    if let Err(e) = authorize(actor, PermissionLevel::Admin) {
        return fail(&e);
    }

    let client = match CatalogClient::new(
        state.args.catalog_base_url(),
        state.args.model_catalog_api_key.as_deref(),
    ) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    match sync_catalog(&state.db, &client).await {
        Ok(report) => {
            info!(
                discovered = report.discovered,
                inserted = report.inserted,
                retained = report.retained,
                revived = report.revived,
                deactivated = report.deactivated,
                "Model catalog synchronized"
            );
            ok(
                "Model catalog synchronized",
                serde_json::to_value(&report).unwrap_or(Value::Null),
            )
        }
        Err(e) => fail(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(LlmRoute::parse("/api/llms"), Some(LlmRoute::Collection));
        assert_eq!(LlmRoute::parse("/api/llms/gpt-4"), Some(LlmRoute::Item("gpt-4")));
        assert_eq!(LlmRoute::parse("/api/llms/sync"), Some(LlmRoute::Sync));
        assert_eq!(LlmRoute::parse("/api/llms/gpt-4/run"), None);
        assert_eq!(LlmRoute::parse("/api/llms/"), None);
    }
}
