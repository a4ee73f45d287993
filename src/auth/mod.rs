//! Access control: bearer-token resolution and the role policy
//!
//! The `Authorization` header carries the raw access token (no scheme).
//! Everything credential-shaped stays behind this module boundary so a
//! stronger scheme can replace the static-token lookup without touching
//! handlers.

mod permissions;

pub use permissions::{actor_level, authorize, PermissionLevel};

use bson::doc;
use tracing::warn;

use crate::db::Database;
use crate::db::schemas::PersonDoc;
use crate::types::{AgoraError, Result};

/// Resolve the request's bearer credential to a live acting Person.
///
/// Fails with `Unauthorized` when the header is missing, no live person
/// matches, or the person's role grants no actor permission.
pub async fn authenticate(db: &Database, header: Option<&str>) -> Result<PersonDoc> {
    let token = match header {
        Some(t) if !t.is_empty() => t,
        _ => {
            warn!("Missing access token");
            return Err(AgoraError::Unauthorized("missing access token".into()));
        }
    };

    let person = db
        .persons
        .find_one(doc! { "access_token": token })
        .await?
        .ok_or_else(|| {
            warn!("Invalid access token");
            AgoraError::Unauthorized("invalid access token".into())
        })?;

    if actor_level(person.role).is_none() {
        warn!("Rejected actor with non-acting role: {}", person.id_hex());
        return Err(AgoraError::Unauthorized(
            "this role cannot act on the API".into(),
        ));
    }

    Ok(person)
}
