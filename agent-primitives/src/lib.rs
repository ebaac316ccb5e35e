//! Core shared types for the MCP chat runtime.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifiers for conversations, messages, and tool servers.
pub use ids::{ConversationId, MessageId, ServerId};
