//! HTTP routes for conversations and their messages
//!
//! - `GET    /api/conversations`                      - conversations the actor belongs to
//! - `POST   /api/conversations`                      - create (creator auto-included)
//! - `GET    /api/conversations/{id}`                 - conversation plus recent messages
//! - `PUT    /api/conversations/{id}`                 - rename
//! - `DELETE /api/conversations/{id}`                 - soft-delete
//! - `POST   /api/conversations/{id}/members`         - add a member (idempotent)
//! - `DELETE /api/conversations/{id}/members/{mid}`   - remove a member, never the last
//! - `PUT    /api/conversations/{id}/messages`        - send a message
//! - `GET    /api/conversations/{id}/messages`        - paginated history with time bounds
//! - `PUT    /api/conversations/{id}/messages/read`   - mark the actor's unread messages read
//!
//! Membership checks and read-state transitions live here; this is the only
//! module with multi-entity rules. The member add/remove paths are
//! read-modify-write without cross-document atomicity: two concurrent
//! updates to the same conversation can lose one of the writes.

use bson::{doc, oid::ObjectId, DateTime, Document};
use hyper::{Method, Request, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::db::parse_object_id;
use crate::db::schemas::{
    ConversationDoc, MessageDoc, MessageType, Metadata, PersonDoc, DEFAULT_CONVERSATION_NAME,
};
use crate::routes::envelope::{
    self, fail, method_not_allowed, not_found_route, ok, page_count, page_params, page_skip,
    parse_json_body, parse_rfc3339, BoxBody,
};
use crate::server::AppState;
use crate::types::{AgoraError, Result};

/// Parsed conversation route components
#[derive(Debug, PartialEq)]
enum ConversationRoute<'a> {
    Collection,
    Item(&'a str),
    Members(&'a str),
    Member(&'a str, &'a str),
    Messages(&'a str),
    MessagesRead(&'a str),
}

impl<'a> ConversationRoute<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let stripped = path.strip_prefix("/api/conversations")?;
        if stripped.is_empty() {
            return Some(ConversationRoute::Collection);
        }
        let stripped = stripped.strip_prefix('/')?;
        let parts: Vec<&str> = stripped.split('/').collect();

        match parts.as_slice() {
            [id] if !id.is_empty() => Some(ConversationRoute::Item(id)),
            [id, "members"] if !id.is_empty() => Some(ConversationRoute::Members(id)),
            [id, "members", member_id] if !id.is_empty() && !member_id.is_empty() => {
                Some(ConversationRoute::Member(id, member_id))
            }
            [id, "messages"] if !id.is_empty() => Some(ConversationRoute::Messages(id)),
            [id, "messages", "read"] if !id.is_empty() => {
                Some(ConversationRoute::MessagesRead(id))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Membership and message rules
// =============================================================================

/// Final member set for a new conversation.
///
/// The requested set must be non-empty before the creator is folded in;
/// the creator is always included.
fn assemble_members(requested: Vec<String>, creator_id: &str) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Err(AgoraError::Validation(
            "at least one member is required".into(),
        ));
    }
    let mut members: BTreeSet<String> = requested.into_iter().collect();
    members.insert(creator_id.to_string());
    Ok(members.into_iter().collect())
}

/// Member set with one member added; `None` when already present (no-op)
fn with_member(members: &[String], member_id: &str) -> Option<Vec<String>> {
    if members.iter().any(|m| m == member_id) {
        return None;
    }
    let mut updated: BTreeSet<String> = members.iter().cloned().collect();
    updated.insert(member_id.to_string());
    Some(updated.into_iter().collect())
}

/// Member set with one member removed.
///
/// The target must currently be a member, and removal may never empty
/// the set.
fn without_member(members: &[String], member_id: &str) -> Result<Vec<String>> {
    if !members.iter().any(|m| m == member_id) {
        return Err(AgoraError::NotFound("Member".into()));
    }
    let reduced: Vec<String> = members
        .iter()
        .filter(|m| m.as_str() != member_id)
        .cloned()
        .collect();
    if reduced.is_empty() {
        return Err(AgoraError::Validation("cannot remove last member".into()));
    }
    Ok(reduced)
}

/// Sender/receiver rules for a new message.
///
/// Three distinct failures: a non-member sender is forbidden, a self-send
/// is invalid, and a non-member receiver is invalid. Receiver existence is
/// checked separately against the person collection.
fn validate_message_send(
    conversation: &ConversationDoc,
    sender_id: &str,
    receiver_id: &str,
) -> Result<()> {
    if !conversation.has_member(sender_id) {
        return Err(AgoraError::Forbidden(
            "you are not a member of this conversation".into(),
        ));
    }
    if sender_id == receiver_id {
        return Err(AgoraError::Validation(
            "you cannot send a message to yourself".into(),
        ));
    }
    if !conversation.has_member(receiver_id) {
        return Err(AgoraError::Validation(
            "receiver is not a member of this conversation".into(),
        ));
    }
    Ok(())
}

/// History filter: messages of one conversation, optionally bounded on
/// `created_at`
fn message_window_filter(
    conversation_id: &str,
    before: Option<DateTime>,
    after: Option<DateTime>,
) -> Document {
    let mut filter = doc! { "conversation_id": conversation_id };
    if before.is_some() || after.is_some() {
        let mut bounds = Document::new();
        if let Some(ts) = before {
            bounds.insert("$lt", ts);
        }
        if let Some(ts) = after {
            bounds.insert("$gt", ts);
        }
        filter.insert("metadata.created_at", bounds);
    }
    filter
}

/// Base filter for read-state transitions: unread messages addressed to
/// the actor in one conversation
fn read_scope_filter(conversation_id: &str, receiver_id: &str) -> Document {
    doc! {
        "conversation_id": conversation_id,
        "receiver_id": receiver_id,
        "is_read": false,
    }
}

/// Which messages a mark-read request targets
#[derive(Debug, PartialEq)]
enum MarkReadMode {
    Before(DateTime),
    Ids(Vec<ObjectId>),
}

impl MarkReadMode {
    /// The two modes are mutually exclusive and exactly one is required
    fn from_payload(payload: &MarkReadPayload) -> Result<Self> {
        match (&payload.before, &payload.message_ids) {
            (Some(_), Some(_)) => Err(AgoraError::Validation(
                "before and message_ids are mutually exclusive".into(),
            )),
            (Some(raw), None) => Ok(MarkReadMode::Before(parse_rfc3339("before", raw)?)),
            (None, Some(ids)) => {
                if ids.is_empty() {
                    return Err(AgoraError::Validation("message_ids is empty".into()));
                }
                let parsed = ids
                    .iter()
                    .map(|id| parse_object_id(id))
                    .collect::<Result<Vec<_>>>()?;
                Ok(MarkReadMode::Ids(parsed))
            }
            (None, None) => Err(AgoraError::Validation(
                "either before or message_ids must be provided".into(),
            )),
        }
    }

    /// Narrow the read-scope filter to this mode's targets
    fn apply(self, mut filter: Document) -> Document {
        match self {
            MarkReadMode::Before(ts) => {
                filter.insert("metadata.created_at", doc! { "$lt": ts });
            }
            MarkReadMode::Ids(ids) => {
                filter.insert("_id", doc! { "$in": ids });
            }
        }
        filter
    }
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateConversationPayload {
    name: Option<String>,
    #[serde(default)]
    members: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RenameConversationPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AddMemberPayload {
    member_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateMessagePayload {
    receiver_id: String,
    message_type: MessageType,
    content: Option<String>,
    media_url: Option<String>,
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MarkReadPayload {
    before: Option<String>,
    message_ids: Option<Vec<String>>,
}

// =============================================================================
// Dispatch
// =============================================================================

pub async fn handle_conversation_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    actor: PersonDoc,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    match (method, ConversationRoute::parse(&path)) {
        (Method::GET, Some(ConversationRoute::Collection)) => {
            list_conversations(state, &actor, &query).await
        }
        (Method::POST, Some(ConversationRoute::Collection)) => {
            create_conversation(req, state, &actor).await
        }
        (Method::GET, Some(ConversationRoute::Item(id))) => {
            let id = id.to_string();
            get_conversation(state, &id).await
        }
        (Method::PUT, Some(ConversationRoute::Item(id))) => {
            let id = id.to_string();
            rename_conversation(req, state, &id).await
        }
        (Method::DELETE, Some(ConversationRoute::Item(id))) => {
            let id = id.to_string();
            delete_conversation(state, &id).await
        }
        (Method::POST, Some(ConversationRoute::Members(id))) => {
            let id = id.to_string();
            add_member(req, state, &id).await
        }
        (Method::DELETE, Some(ConversationRoute::Member(id, member_id))) => {
            let id = id.to_string();
            let member_id = member_id.to_string();
            remove_member(state, &id, &member_id).await
        }
        (Method::PUT, Some(ConversationRoute::Messages(id))) => {
            let id = id.to_string();
            send_message(req, state, &actor, &id).await
        }
        (Method::GET, Some(ConversationRoute::Messages(id))) => {
            let id = id.to_string();
            list_messages(state, &actor, &id, &query).await
        }
        (Method::PUT, Some(ConversationRoute::MessagesRead(id))) => {
            let id = id.to_string();
            mark_messages_read(req, state, &actor, &id).await
        }
        (_, Some(_)) => method_not_allowed(),
        (_, None) => not_found_route(&path),
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_conversations(
    state: Arc<AppState>,
    actor: &PersonDoc,
    query: &str,
) -> Response<BoxBody> {
    let params = envelope::parse_query_params(query);
    let (page, limit) = match page_params(&params, 100) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    match state
        .db
        .conversations
        .find_many(
            doc! { "members": actor.id_hex() },
            page_skip(page, limit),
            limit,
        )
        .await
    {
        Ok(conversations) => ok(
            "Conversations retrieved successfully",
            Value::Array(conversations.iter().map(|c| c.api_view()).collect()),
        ),
        Err(e) => fail(&e),
    }
}

async fn get_conversation(state: Arc<AppState>, id: &str) -> Response<BoxBody> {
    let conversation = match state.db.conversations.find_by_id(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return fail(&AgoraError::NotFound("Conversation".into())),
        Err(e) => return fail(&e),
    };

    let messages = match state
        .db
        .messages
        .find_many(doc! { "conversation_id": id }, 0, 100)
        .await
    {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    ok(
        "Conversation retrieved successfully",
        json!({
            "conversation": conversation.api_view(),
            "messages": messages.iter().map(|m| m.api_view()).collect::<Vec<_>>(),
        }),
    )
}

async fn create_conversation(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    actor: &PersonDoc,
) -> Response<BoxBody> {
    let payload: CreateConversationPayload = match parse_json_body(req).await {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let members = match assemble_members(payload.members, &actor.id_hex()) {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    // Every member must resolve to a live person
    for member_id in &members {
        match state.db.persons.find_by_id(member_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return fail(&AgoraError::NotFound(format!("Member {}", member_id)))
            }
            Err(e) => return fail(&e),
        }
    }

    let mut conversation = ConversationDoc::new(
        payload
            .name
            .unwrap_or_else(|| DEFAULT_CONVERSATION_NAME.to_string()),
        members,
    );

    match state.db.conversations.insert_one(&mut conversation).await {
        Ok(id) => {
            conversation._id = Some(id);
            ok("Conversation created successfully", conversation.api_view())
        }
        Err(e) => fail(&e),
    }
}

async fn rename_conversation(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    let payload: RenameConversationPayload = match parse_json_body(req).await {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    match state
        .db
        .conversations
        .update_by_id(id, doc! { "name": payload.name })
        .await
    {
        Ok(true) => ok("Conversation renamed successfully", json!({})),
        Ok(false) => fail(&AgoraError::NotFound("Conversation".into())),
        Err(e) => fail(&e),
    }
}

async fn delete_conversation(state: Arc<AppState>, id: &str) -> Response<BoxBody> {
    match state.db.conversations.soft_delete(id).await {
        Ok(true) => ok("Conversation deleted successfully", json!({ "id": id })),
        Ok(false) => fail(&AgoraError::NotFound("Conversation".into())),
        Err(e) => fail(&e),
    }
}

async fn add_member(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    let payload: AddMemberPayload = match parse_json_body(req).await {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let conversation = match state.db.conversations.find_by_id(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return fail(&AgoraError::NotFound("Conversation".into())),
        Err(e) => return fail(&e),
    };

    match state.db.persons.find_by_id(&payload.member_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return fail(&AgoraError::NotFound(format!(
                "Member {}",
                payload.member_id
            )))
        }
        Err(e) => return fail(&e),
    }

    let updated = match with_member(&conversation.members, &payload.member_id) {
        Some(m) => m,
        // Already a member: no-op success
        None => return ok("Member added successfully", json!({})),
    };

    match state
        .db
        .conversations
        .update_by_id(id, doc! { "members": updated })
        .await
    {
        Ok(_) => ok("Member added successfully", json!({})),
        Err(e) => fail(&e),
    }
}

async fn remove_member(state: Arc<AppState>, id: &str, member_id: &str) -> Response<BoxBody> {
    let conversation = match state.db.conversations.find_by_id(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return fail(&AgoraError::NotFound("Conversation".into())),
        Err(e) => return fail(&e),
    };

    let reduced = match without_member(&conversation.members, member_id) {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    match state
        .db
        .conversations
        .update_by_id(id, doc! { "members": reduced })
        .await
    {
        Ok(_) => ok("Member removed successfully", json!({})),
        Err(e) => fail(&e),
    }
}

async fn send_message(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    actor: &PersonDoc,
    id: &str,
) -> Response<BoxBody> {
    let payload: CreateMessagePayload = match parse_json_body(req).await {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let conversation = match state.db.conversations.find_by_id(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return fail(&AgoraError::NotFound("Conversation".into())),
        Err(e) => return fail(&e),
    };

    let sender_id = actor.id_hex();
    if let Err(e) = validate_message_send(&conversation, &sender_id, &payload.receiver_id) {
        return fail(&e);
    }

    match state.db.persons.find_by_id(&payload.receiver_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return fail(&AgoraError::NotFound("Receiver".into())),
        Err(e) => return fail(&e),
    }

    let mut message = MessageDoc {
        _id: None,
        metadata: Metadata::new(),
        conversation_id: id.to_string(),
        sender_id,
        receiver_id: payload.receiver_id,
        message_type: payload.message_type,
        content: payload.content,
        media_url: payload.media_url,
        extra: payload.metadata,
        is_read: false,
    };

    match state.db.messages.insert_one(&mut message).await {
        Ok(message_id) => {
            message._id = Some(message_id);
            ok("Message sent successfully", message.api_view())
        }
        Err(e) => fail(&e),
    }
}

async fn list_messages(
    state: Arc<AppState>,
    actor: &PersonDoc,
    id: &str,
    query: &str,
) -> Response<BoxBody> {
    let conversation = match state.db.conversations.find_by_id(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return fail(&AgoraError::NotFound("Conversation".into())),
        Err(e) => return fail(&e),
    };

    if !conversation.has_member(&actor.id_hex()) {
        return fail(&AgoraError::Forbidden(
            "you are not a member of this conversation".into(),
        ));
    }

    let params = envelope::parse_query_params(query);
    let (page, limit) = match page_params(&params, 20) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let before = match params.get("before") {
        Some(raw) => match parse_rfc3339("before", raw) {
            Ok(ts) => Some(ts),
            Err(e) => return fail(&e),
        },
        None => None,
    };
    let after = match params.get("after") {
        Some(raw) => match parse_rfc3339("after", raw) {
            Ok(ts) => Some(ts),
            Err(e) => return fail(&e),
        },
        None => None,
    };

    let filter = message_window_filter(id, before, after);

    let total = match state.db.messages.count(filter.clone()).await {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    let messages = match state
        .db
        .messages
        .find_many(filter, page_skip(page, limit), limit)
        .await
    {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    ok(
        "Messages retrieved successfully",
        json!({
            "messages": messages.iter().map(|m| m.api_view()).collect::<Vec<_>>(),
            "pagination": {
                "total": total,
                "page": page,
                "limit": limit,
                "pages": page_count(total, limit),
            },
        }),
    )
}

async fn mark_messages_read(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    actor: &PersonDoc,
    id: &str,
) -> Response<BoxBody> {
    let payload: MarkReadPayload = match parse_json_body(req).await {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let conversation = match state.db.conversations.find_by_id(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return fail(&AgoraError::NotFound("Conversation".into())),
        Err(e) => return fail(&e),
    };

    let actor_id = actor.id_hex();
    if !conversation.has_member(&actor_id) {
        return fail(&AgoraError::Forbidden(
            "you are not a member of this conversation".into(),
        ));
    }

    let mode = match MarkReadMode::from_payload(&payload) {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    let filter = mode.apply(read_scope_filter(id, &actor_id));

    match state
        .db
        .messages
        .update_many(filter, doc! { "is_read": true })
        .await
    {
        Ok(modified) => ok(
            format!("Marked {} messages as read", modified),
            json!({ "modified_count": modified }),
        ),
        Err(e) => fail(&e),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(
            ConversationRoute::parse("/api/conversations"),
            Some(ConversationRoute::Collection)
        );
        assert_eq!(
            ConversationRoute::parse("/api/conversations/c1"),
            Some(ConversationRoute::Item("c1"))
        );
        assert_eq!(
            ConversationRoute::parse("/api/conversations/c1/members"),
            Some(ConversationRoute::Members("c1"))
        );
        assert_eq!(
            ConversationRoute::parse("/api/conversations/c1/members/p1"),
            Some(ConversationRoute::Member("c1", "p1"))
        );
        assert_eq!(
            ConversationRoute::parse("/api/conversations/c1/messages"),
            Some(ConversationRoute::Messages("c1"))
        );
        assert_eq!(
            ConversationRoute::parse("/api/conversations/c1/messages/read"),
            Some(ConversationRoute::MessagesRead("c1"))
        );
        assert_eq!(ConversationRoute::parse("/api/conversations//members"), None);
        assert_eq!(
            ConversationRoute::parse("/api/conversations/c1/unknown"),
            None
        );
    }

    #[test]
    fn test_assemble_members_requires_non_empty() {
        assert!(matches!(
            assemble_members(vec![], "creator"),
            Err(AgoraError::Validation(_))
        ));
    }

    #[test]
    fn test_assemble_members_folds_in_creator() {
        let members = assemble_members(vec!["beta".into()], "alpha").unwrap();
        assert_eq!(members, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_assemble_members_self_only() {
        // {A} requested by A stays exactly {A}
        let members = assemble_members(vec!["alpha".into()], "alpha").unwrap();
        assert_eq!(members, vec!["alpha".to_string()]);
    }

    #[test]
    fn test_with_member_is_idempotent() {
        let members = vec!["alpha".to_string(), "beta".to_string()];
        assert_eq!(with_member(&members, "beta"), None);
        assert_eq!(
            with_member(&members, "gamma"),
            Some(vec![
                "alpha".to_string(),
                "beta".to_string(),
                "gamma".to_string()
            ])
        );
    }

    #[test]
    fn test_without_member_refuses_last() {
        let members = vec!["alpha".to_string()];
        let err = without_member(&members, "alpha").unwrap_err();
        assert!(matches!(err, AgoraError::Validation(_)));
        assert_eq!(err.to_string(), "cannot remove last member");
        // and the set is untouched
        assert_eq!(members, vec!["alpha".to_string()]);
    }

    #[test]
    fn test_without_member_requires_membership() {
        let members = vec!["alpha".to_string(), "beta".to_string()];
        assert!(matches!(
            without_member(&members, "gamma"),
            Err(AgoraError::NotFound(_))
        ));
        assert_eq!(
            without_member(&members, "beta").unwrap(),
            vec!["alpha".to_string()]
        );
    }

    fn conversation_of(members: &[&str]) -> ConversationDoc {
        ConversationDoc::new(
            "salon".to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        )
    }

    #[test]
    fn test_send_rules_sender_must_be_member() {
        let conv = conversation_of(&["alpha", "beta"]);
        assert!(matches!(
            validate_message_send(&conv, "gamma", "alpha"),
            Err(AgoraError::Forbidden(_))
        ));
    }

    #[test]
    fn test_send_rules_no_self_send() {
        let conv = conversation_of(&["alpha", "beta"]);
        assert!(matches!(
            validate_message_send(&conv, "alpha", "alpha"),
            Err(AgoraError::Validation(_))
        ));
    }

    #[test]
    fn test_send_rules_receiver_must_be_member() {
        let conv = conversation_of(&["alpha", "beta"]);
        assert!(matches!(
            validate_message_send(&conv, "alpha", "gamma"),
            Err(AgoraError::Validation(_))
        ));
        assert!(validate_message_send(&conv, "alpha", "beta").is_ok());
    }

    #[test]
    fn test_message_window_filter_bounds() {
        let now = DateTime::now();
        let filter = message_window_filter("c1", Some(now), None);
        let bounds = filter.get_document("metadata.created_at").unwrap();
        assert!(bounds.contains_key("$lt"));
        assert!(!bounds.contains_key("$gt"));

        let unbounded = message_window_filter("c1", None, None);
        assert!(!unbounded.contains_key("metadata.created_at"));
        assert_eq!(unbounded.get_str("conversation_id").unwrap(), "c1");
    }

    #[test]
    fn test_read_scope_targets_unread_for_receiver() {
        let filter = read_scope_filter("c1", "beta");
        assert_eq!(filter.get_str("receiver_id").unwrap(), "beta");
        assert_eq!(filter.get_bool("is_read").unwrap(), false);
    }

    #[test]
    fn test_mark_read_modes_are_exclusive() {
        let both = MarkReadPayload {
            before: Some("2026-01-01T00:00:00Z".into()),
            message_ids: Some(vec![ObjectId::new().to_hex()]),
        };
        assert!(MarkReadMode::from_payload(&both).is_err());

        let neither = MarkReadPayload {
            before: None,
            message_ids: None,
        };
        assert!(MarkReadMode::from_payload(&neither).is_err());
    }

    #[test]
    fn test_mark_read_before_filter() {
        let payload = MarkReadPayload {
            before: Some("2026-01-01T00:00:00Z".into()),
            message_ids: None,
        };
        let mode = MarkReadMode::from_payload(&payload).unwrap();
        let filter = mode.apply(read_scope_filter("c1", "beta"));
        assert!(filter
            .get_document("metadata.created_at")
            .unwrap()
            .contains_key("$lt"));
        // unread-only scope survives the narrowing
        assert_eq!(filter.get_bool("is_read").unwrap(), false);
    }

    #[test]
    fn test_mark_read_ids_filter() {
        let id = ObjectId::new();
        let payload = MarkReadPayload {
            before: None,
            message_ids: Some(vec![id.to_hex()]),
        };
        let mode = MarkReadMode::from_payload(&payload).unwrap();
        let filter = mode.apply(read_scope_filter("c1", "beta"));
        let targeted = filter.get_document("_id").unwrap();
        assert_eq!(targeted.get_array("$in").unwrap().len(), 1);
    }

    #[test]
    fn test_mark_read_rejects_bad_ids() {
        let payload = MarkReadPayload {
            before: None,
            message_ids: Some(vec!["not-an-id".into()]),
        };
        assert!(matches!(
            MarkReadMode::from_payload(&payload),
            Err(AgoraError::Validation(_))
        ));
    }
}
