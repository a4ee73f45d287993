//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one spawned task per connection. Requests are
//! routed by a `match` on (method, path prefix); everything under `/api`
//! resolves an actor from the `Authorization` header before dispatch.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth;
use crate::config::Args;
use crate::db::Database;
use crate::routes::{self, envelope, BoxBody};
use crate::types::Result;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub db: Database,
}

impl AppState {
    pub fn new(args: Args, db: Database) -> Self {
        Self { args, db }
    }
}

/// Run the HTTP server until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Agora listening on {}", state.args.listen);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route one request and log its outcome
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = route(state, req).await;

    info!(
        request_id = %request_id.simple(),
        peer = %addr,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request complete"
    );

    Ok(response)
}

async fn route(state: Arc<AppState>, req: Request<Incoming>) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Unauthenticated surface
    match (&method, path.as_str()) {
        (&Method::GET, "/") => return routes::welcome(),
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => {
            return routes::health_check()
        }
        (&Method::OPTIONS, _) => return envelope::cors_preflight(),
        _ => {}
    }

    if !path.starts_with("/api/") {
        return envelope::not_found_route(&path);
    }

    // The Authorization header carries the raw access token
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let actor = match auth::authenticate(&state.db, auth_header.as_deref()).await {
        Ok(actor) => actor,
        Err(e) => return envelope::fail(&e),
    };

    if path.starts_with("/api/conversations") {
        routes::handle_conversation_request(req, state, actor).await
    } else if path.starts_with("/api/persons") {
        routes::handle_person_request(req, state, actor).await
    } else if path.starts_with("/api/memories") {
        routes::handle_memory_request(req, state, actor).await
    } else if path.starts_with("/api/tools") {
        routes::handle_tool_request(req, state, actor).await
    } else if path.starts_with("/api/llms") {
        routes::handle_llm_request(req, state, actor).await
    } else {
        envelope::not_found_route(&path)
    }
}
