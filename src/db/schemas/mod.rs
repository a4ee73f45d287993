//! Database schemas for Agora
//!
//! Defines MongoDB document structures for persons, conversations,
//! messages, memories, tools, and language-model records.

mod conversation;
mod llm;
mod memory;
mod message;
mod metadata;
mod person;
mod tool;

pub use conversation::{
    ConversationDoc, CONVERSATION_COLLECTION, DEFAULT_CONVERSATION_NAME,
};
pub use llm::{LlmDoc, LLM_COLLECTION};
pub use memory::{MemoryDoc, MEMORY_COLLECTION};
pub use message::{MessageDoc, MessageType, MESSAGE_COLLECTION};
pub use metadata::Metadata;
pub use person::{Gender, LanguagePreference, PersonDoc, Role, PERSON_COLLECTION};
pub use tool::{ToolDoc, TOOL_COLLECTION};
