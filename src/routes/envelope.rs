//! Uniform response envelope and shared request plumbing
//!
//! Every endpoint answers `{success, message, data}`; errors map through
//! `AgoraError::status_code()`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::types::{AgoraError, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Uniform response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

fn envelope_response(status: StatusCode, envelope: &ApiResponse) -> Response<BoxBody> {
    let json = serde_json::to_string(envelope).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// Successful envelope with HTTP 200
pub fn ok(message: impl Into<String>, data: Value) -> Response<BoxBody> {
    envelope_response(
        StatusCode::OK,
        &ApiResponse {
            success: true,
            message: message.into(),
            data,
        },
    )
}

/// Failure envelope; status comes from the error taxonomy
pub fn fail(err: &AgoraError) -> Response<BoxBody> {
    envelope_response(
        err.status_code(),
        &ApiResponse {
            success: false,
            message: err.to_string(),
            data: Value::Null,
        },
    )
}

/// Fixed rejection for intentionally blocked mutations
pub fn disabled(operation: &str) -> Response<BoxBody> {
    fail(&AgoraError::OperationDisabled(operation.to_string()))
}

pub fn not_found_route(path: &str) -> Response<BoxBody> {
    fail(&AgoraError::NotFound(format!("route {}", path)))
}

pub fn method_not_allowed() -> Response<BoxBody> {
    envelope_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ApiResponse {
            success: false,
            message: "method not allowed".to_string(),
            data: Value::Null,
        },
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

/// Read and deserialize a JSON request body, bounded by `MAX_BODY_BYTES`
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T> {
    let body = req
        .collect()
        .await
        .map_err(|e| AgoraError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_BODY_BYTES {
        return Err(AgoraError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| AgoraError::Http(format!("Invalid JSON: {}", e)))
}

/// Parse query string into key-value map
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    if query.is_empty() {
        return HashMap::new();
    }

    query
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next().unwrap_or("");
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// One-based page plus page size from query params, with route defaults.
/// Range checking happens in the store layer's page-bound validation.
pub fn page_params(
    params: &HashMap<String, String>,
    default_limit: i64,
) -> Result<(i64, i64)> {
    let page = match params.get("page") {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| AgoraError::Validation(format!("invalid page: {}", raw)))?,
        None => 1,
    };
    let limit = match params.get("limit") {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| AgoraError::Validation(format!("invalid limit: {}", raw)))?,
        None => default_limit,
    };
    Ok((page, limit))
}

/// Skip offset for a one-based page
pub fn page_skip(page: i64, limit: i64) -> i64 {
    (page - 1) * limit
}

/// Number of pages needed for `total` items at `limit` per page
pub fn page_count(total: u64, limit: i64) -> u64 {
    if limit <= 0 {
        return 0;
    }
    total.div_ceil(limit as u64)
}

/// Parse an RFC 3339 timestamp from a query or body field
pub fn parse_rfc3339(field: &str, value: &str) -> Result<bson::DateTime> {
    let parsed = chrono::DateTime::parse_from_rfc3339(value)
        .map_err(|_| AgoraError::Validation(format!("invalid {} timestamp: {}", field, value)))?;
    Ok(bson::DateTime::from_chrono(parsed.with_timezone(&chrono::Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let params = parse_query_params("page=2&limit=50&role=admin");
        assert_eq!(params.get("page"), Some(&"2".to_string()));
        assert_eq!(params.get("limit"), Some(&"50".to_string()));
        assert_eq!(params.get("role"), Some(&"admin".to_string()));
    }

    #[test]
    fn test_parse_query_params_empty() {
        assert!(parse_query_params("").is_empty());
    }

    #[test]
    fn test_page_params_defaults() {
        let (page, limit) = page_params(&HashMap::new(), 100).unwrap();
        assert_eq!((page, limit), (1, 100));
    }

    #[test]
    fn test_page_params_rejects_garbage() {
        let params = parse_query_params("page=first");
        assert!(page_params(&params, 100).is_err());
    }

    #[test]
    fn test_page_skip() {
        assert_eq!(page_skip(1, 100), 0);
        assert_eq!(page_skip(3, 20), 40);
        // page 0 yields a negative skip; the store layer rejects it
        assert_eq!(page_skip(0, 20), -20);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
    }

    #[test]
    fn test_parse_rfc3339() {
        assert!(parse_rfc3339("before", "2026-01-01T00:00:00Z").is_ok());
        assert!(parse_rfc3339("before", "2026-01-01T00:00:00+08:00").is_ok());
        assert!(matches!(
            parse_rfc3339("before", "yesterday"),
            Err(AgoraError::Validation(_))
        ));
    }

    #[test]
    fn test_fail_envelope_serialization() {
        let envelope = ApiResponse {
            success: false,
            message: "Person not found".to_string(),
            data: Value::Null,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["data"], Value::Null);
    }
}
