//! Shared error definitions for agent primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided message identifier could not be parsed.
    #[error("invalid message id: {source}")]
    InvalidMessageId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Conversation identifier failed validation.
    #[error("invalid conversation id: {reason}")]
    InvalidConversationId {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Server identifier failed validation.
    #[error("invalid server id `{id}`: {reason}")]
    InvalidServerId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}
