//! Request and response bodies of the chat entry points.

use agent_primitives::{ConversationId, MessageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound chat turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Raw user text.
    pub message: String,
    /// Conversation to continue; a fresh one is created when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    /// Whether the caller allows tool use. Accepted and recorded only.
    #[serde(default = "tools_enabled_by_default")]
    pub use_tools: bool,
}

fn tools_enabled_by_default() -> bool {
    true
}

impl ChatRequest {
    /// Creates a request that starts a new conversation.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            use_tools: true,
        }
    }

    /// Continues an existing conversation.
    #[must_use]
    pub fn with_conversation_id(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    /// Sets the tool-use flag.
    #[must_use]
    pub fn with_use_tools(mut self, use_tools: bool) -> Self {
        self.use_tools = use_tools;
        self
    }
}

/// Result of a single-shot chat turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Identifier of the assistant message.
    pub id: MessageId,
    /// Assistant text, or `"Error: ..."` when the model failed.
    pub message: String,
    /// Conversation the turn belongs to.
    pub conversation_id: ConversationId,
    /// Tools invoked while producing the answer.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
}

/// One event of a streamed chat turn.
///
/// Every event of a response shares `id`; exactly one event, the last, has
/// `is_complete` set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChatResponse {
    /// Response identifier shared by all events of the stream.
    pub id: MessageId,
    /// Text fragment; empty on successful completion, `"Error: ..."` on
    /// failure.
    pub delta: String,
    /// Conversation the turn belongs to.
    pub conversation_id: ConversationId,
    /// Marks the terminal event.
    pub is_complete: bool,
    /// Tools invoked while producing the answer.
    #[serde(default)]
    pub tools_used: Vec<String>,
}

impl StreamChatResponse {
    pub(crate) fn fragment(id: MessageId, conversation_id: ConversationId, delta: String) -> Self {
        Self {
            id,
            delta,
            conversation_id,
            is_complete: false,
            tools_used: Vec::new(),
        }
    }

    pub(crate) fn terminal(id: MessageId, conversation_id: ConversationId, delta: String) -> Self {
        Self {
            id,
            delta,
            conversation_id,
            is_complete: true,
            tools_used: Vec::new(),
        }
    }
}
