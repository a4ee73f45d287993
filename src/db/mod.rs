//! Document store layer: client wrapper, generic collection CRUD, schemas

pub mod mongo;
pub mod schemas;

pub use mongo::{
    live_filter, parse_object_id, validate_page_bounds, IntoIndexes, MongoClient,
    MongoCollection, MutMetadata, MAX_PAGE_LIMIT,
};

use crate::types::Result;
use schemas::{
    ConversationDoc, LlmDoc, MemoryDoc, MessageDoc, PersonDoc, ToolDoc,
    CONVERSATION_COLLECTION, LLM_COLLECTION, MEMORY_COLLECTION, MESSAGE_COLLECTION,
    PERSON_COLLECTION, TOOL_COLLECTION,
};

/// Typed collections opened once at startup, with indexes applied
#[derive(Clone)]
pub struct Database {
    pub persons: MongoCollection<PersonDoc>,
    pub conversations: MongoCollection<ConversationDoc>,
    pub messages: MongoCollection<MessageDoc>,
    pub memories: MongoCollection<MemoryDoc>,
    pub tools: MongoCollection<ToolDoc>,
    pub llms: MongoCollection<LlmDoc>,
}

impl Database {
    pub async fn open(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            persons: client.collection(PERSON_COLLECTION).await?,
            conversations: client.collection(CONVERSATION_COLLECTION).await?,
            messages: client.collection(MESSAGE_COLLECTION).await?,
            memories: client.collection(MEMORY_COLLECTION).await?,
            tools: client.collection(TOOL_COLLECTION).await?,
            llms: client.collection(LLM_COLLECTION).await?,
        })
    }
}
