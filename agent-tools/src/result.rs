//! Uniform outcome of a tool call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolResult;

/// Request body for executing a tool by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRequest {
    /// Name of the tool to run.
    pub tool_name: String,
    /// Raw arguments keyed by property name.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Result of dispatching a tool call. Failures are data, never panics or
/// errors.
///
/// Serialized as `{"success": true, "result": ...}` or
/// `{"success": false, "error": "..."}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireResult", try_from = "WireResult")]
pub enum ToolCallResult {
    /// The tool ran and produced a value.
    Success {
        /// Value returned by the handler.
        result: Value,
    },
    /// The call failed.
    Failure {
        /// Human-readable failure message.
        error: String,
    },
}

impl ToolCallResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(result: impl Into<Value>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Returns `true` for [`ToolCallResult::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the result value on success.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success { result } => Some(result),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the error message on failure.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }
}

impl From<ToolResult<Value>> for ToolCallResult {
    fn from(value: ToolResult<Value>) -> Self {
        match value {
            Ok(result) => Self::Success { result },
            Err(err) => Self::Failure {
                error: err.to_string(),
            },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireResult {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<ToolCallResult> for WireResult {
    fn from(value: ToolCallResult) -> Self {
        match value {
            ToolCallResult::Success { result } => Self {
                success: true,
                result: Some(result),
                error: None,
            },
            ToolCallResult::Failure { error } => Self {
                success: false,
                result: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<WireResult> for ToolCallResult {
    type Error = String;

    fn try_from(value: WireResult) -> Result<Self, Self::Error> {
        if value.success {
            Ok(Self::Success {
                result: value.result.unwrap_or(Value::Null),
            })
        } else {
            Ok(Self::Failure {
                error: value
                    .error
                    .ok_or_else(|| "failed tool result requires an error".to_owned())?,
            })
        }
    }
}
