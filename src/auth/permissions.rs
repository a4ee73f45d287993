//! Permission levels and the role policy for request actors
//!
//! One explicit policy function decides (actor, required level) instead of
//! inline role comparisons scattered across handlers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::schemas::{PersonDoc, Role};
use crate::types::{AgoraError, Result};

/// Permission levels for API operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
#[derive(Default)]
pub enum PermissionLevel {
    /// No authentication - health and welcome endpoints only
    #[default]
    Public = 0,
    /// Authenticated person - the standard resource surface
    Authenticated = 1,
    /// Admin - catalog synchronization and other administrative operations
    Admin = 2,
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionLevel::Public => write!(f, "PUBLIC"),
            PermissionLevel::Authenticated => write!(f, "AUTHENTICATED"),
            PermissionLevel::Admin => write!(f, "ADMIN"),
        }
    }
}

/// Permission level a role is granted as a request actor.
/// Returns None for roles that may never act (an "ai" person is a
/// conversation participant, not an API caller).
pub fn actor_level(role: Role) -> Option<PermissionLevel> {
    match role {
        Role::Admin => Some(PermissionLevel::Admin),
        Role::Human => Some(PermissionLevel::Authenticated),
        Role::Ai => None,
    }
}

/// Check that the resolved actor holds the required permission level
pub fn authorize(person: &PersonDoc, required: PermissionLevel) -> Result<()> {
    match actor_level(person.role) {
        Some(level) if level >= required => Ok(()),
        Some(_) => Err(AgoraError::Forbidden(format!(
            "this operation requires {} permission",
            required
        ))),
        None => Err(AgoraError::Unauthorized(
            "this role cannot act on the API".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Metadata;

    fn person_with_role(role: Role) -> PersonDoc {
        PersonDoc {
            _id: None,
            metadata: Metadata::new(),
            name: None,
            gender: None,
            birthday: None,
            email: None,
            phone: None,
            access_token: None,
            role,
            language_preference: crate::db::schemas::LanguagePreference::English,
            address: None,
            description: None,
            avatar_url: None,
        }
    }

    #[test]
    fn test_admin_passes_all_levels() {
        let admin = person_with_role(Role::Admin);
        assert!(authorize(&admin, PermissionLevel::Public).is_ok());
        assert!(authorize(&admin, PermissionLevel::Authenticated).is_ok());
        assert!(authorize(&admin, PermissionLevel::Admin).is_ok());
    }

    #[test]
    fn test_human_is_not_admin() {
        let human = person_with_role(Role::Human);
        assert!(authorize(&human, PermissionLevel::Authenticated).is_ok());
        assert!(matches!(
            authorize(&human, PermissionLevel::Admin),
            Err(AgoraError::Forbidden(_))
        ));
    }

    #[test]
    fn test_ai_cannot_act() {
        let ai = person_with_role(Role::Ai);
        assert!(actor_level(Role::Ai).is_none());
        assert!(matches!(
            authorize(&ai, PermissionLevel::Authenticated),
            Err(AgoraError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_permission_ordering() {
        assert!(PermissionLevel::Admin > PermissionLevel::Authenticated);
        assert!(PermissionLevel::Authenticated > PermissionLevel::Public);
    }
}
