//! Chat message records.

use agent_primitives::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Text supplied by the end user.
    User,
    /// Text produced by the model.
    Assistant,
    /// Instructions injected by the runtime.
    System,
}

/// A single entry of a conversation. Messages are immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    role: MessageRole,
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

impl ChatMessage {
    /// Creates a builder for a message with a fresh id and the current time.
    #[must_use]
    pub fn builder(role: MessageRole, content: impl Into<String>) -> ChatMessageBuilder {
        ChatMessageBuilder {
            id: MessageId::random(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: Map::new(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::builder(MessageRole::User, content).build()
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::builder(MessageRole::Assistant, content).build()
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the author role.
    #[must_use]
    pub const fn role(&self) -> MessageRole {
        self.role
    }

    /// Returns the text content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns when the message was created.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the metadata map.
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}

/// Builder used to assemble [`ChatMessage`] values.
#[derive(Debug)]
pub struct ChatMessageBuilder {
    id: MessageId,
    role: MessageRole,
    content: String,
    timestamp: DateTime<Utc>,
    metadata: Map<String, Value>,
}

impl ChatMessageBuilder {
    /// Overrides the message identifier.
    #[must_use]
    pub fn id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }

    /// Overrides the creation time.
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Finalises the message.
    #[must_use]
    pub fn build(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            role: self.role,
            content: self.content,
            timestamp: self.timestamp,
            metadata: self.metadata,
        }
    }
}
