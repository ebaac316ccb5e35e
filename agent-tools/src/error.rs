//! Errors produced by tool resolution, validation, and execution.

use thiserror::Error;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Context used for failures that carry no more specific context.
pub const EXECUTION_FAILED: &str = "Tool execution failed";

/// Errors produced by tool dispatch.
///
/// The `Display` output of each variant is the user-facing error string of a
/// failed [`ToolCallResult`](crate::ToolCallResult).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    /// No enabled server exposes the requested tool.
    #[error("Tool not found: {name}")]
    NotFound {
        /// Name of the missing tool.
        name: String,
    },

    /// The tool is registered but no handler implements it.
    #[error("Tool not implemented: {name}")]
    NotImplemented {
        /// Name of the unimplemented tool.
        name: String,
    },

    /// A required argument was absent.
    #[error("{} required", capitalize(.name))]
    MissingArgument {
        /// Name of the missing argument.
        name: String,
    },

    /// An argument did not match its declared schema.
    #[error("Invalid argument {name}: expected {expected}")]
    InvalidArgument {
        /// Name of the offending argument.
        name: String,
        /// Description of what the schema expects.
        expected: String,
    },

    /// The handler failed while doing its work.
    #[error("{context}: {reason}")]
    Execution {
        /// What the handler was doing.
        context: String,
        /// Underlying failure message.
        reason: String,
    },

    /// A handler with the same tool name is already registered.
    #[error("handler for tool `{name}` is already registered")]
    DuplicateHandler {
        /// Name of the offending tool.
        name: String,
    },

    /// The server registry could not be loaded or saved.
    #[error("server registry persistence failed: {reason}")]
    Persistence {
        /// Human-readable reason.
        reason: String,
    },
}

impl ToolError {
    /// Creates an execution error with an explicit context.
    #[must_use]
    pub fn execution(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Execution {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an execution error with the generic context.
    #[must_use]
    pub fn failed(reason: impl ToString) -> Self {
        Self::execution(EXECUTION_FAILED, reason)
    }

    /// Creates a missing-argument error.
    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingArgument { name: name.into() }
    }

    /// Creates a persistence error.
    #[must_use]
    pub fn persistence(reason: impl ToString) -> Self {
        Self::Persistence {
            reason: reason.to_string(),
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::from("Argument"),
    }
}
