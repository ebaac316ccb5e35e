//! Conversation memory for the chat runtime.
//!
//! [`ConversationStore`] is the seam the orchestrator writes through;
//! [`InMemoryConversationStore`] keeps every conversation for the lifetime of
//! the process.

#![warn(missing_docs, clippy::pedantic)]

pub mod conversation;
pub mod message;

pub use conversation::{ConversationStore, InMemoryConversationStore};
pub use message::{ChatMessage, ChatMessageBuilder, MessageRole};
