//! Health and welcome endpoints
//!
//! `/health` and `/healthz` are liveness probes: 200 whenever the process
//! is serving, regardless of store reachability. `/` is an unauthenticated
//! welcome line.

use serde_json::json;

use crate::routes::envelope::{ok, BoxBody};

/// GET /health, GET /healthz
pub fn health_check() -> hyper::Response<BoxBody> {
    ok(
        "ok",
        json!({
            "healthy": true,
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// GET /
pub fn welcome() -> hyper::Response<BoxBody> {
    ok("Welcome to Agora", serde_json::Value::Null)
}
