//! Saved tutor conversations

pub mod models;
pub mod storage;

pub use models::{ChatSession, ChatSessionSummary, ConversationTurn};
pub use storage::ChatSessionStorage;
