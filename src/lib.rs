//! Agora - conversation backend for persona agents
//!
//! An HTTP API over MongoDB exposing persons, conversations, messages,
//! memories, tools, and language-model records.
//!
//! ## Layers
//!
//! - **db**: generic document CRUD with soft-delete semantics, plus the
//!   per-collection schemas
//! - **auth**: bearer-token resolution and the role policy
//! - **routes**: the REST surface, including the conversation/message rules
//! - **services**: the upstream model-catalog client and synchronization

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{AgoraError, Result};
