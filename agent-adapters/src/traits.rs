//! Shared model adapter traits and data structures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used by model adapters.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Error type shared by adapter implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The supplied request was invalid for the target model.
    #[error("invalid completion request: {reason}")]
    InvalidRequest {
        /// Reason describing why the request could not be processed.
        reason: String,
    },

    /// Transport-level failures (network, protocol, etc.).
    #[error("adapter transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },
}

impl AdapterError {
    /// Convenience constructor for invalid requests.
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}

/// Minimal metadata describing a model adapter instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterMetadata {
    provider: &'static str,
    model: String,
}

impl AdapterMetadata {
    /// Creates metadata for the supplied provider and model identifier.
    #[must_use]
    pub fn new(provider: &'static str, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Returns the provider identifier (e.g., "echo").
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Returns the configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request submitted to a completion model.
///
/// The prompt is the raw user text; no conversation history is attached.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CompletionRequest {
    prompt: String,
}

impl CompletionRequest {
    /// Creates a request for the supplied prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// Returns the prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Trait implemented by text-generation backends.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Returns basic metadata describing the adapter instance.
    fn metadata(&self) -> &AdapterMetadata;

    /// Generates the full completion for `request`.
    ///
    /// # Errors
    ///
    /// Returns an [`AdapterError`] when the backend cannot produce a result.
    async fn complete(&self, request: CompletionRequest) -> AdapterResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        metadata: AdapterMetadata,
    }

    fn fixed() -> Fixed {
        Fixed {
            metadata: AdapterMetadata::new("test", "fixed"),
        }
    }

    #[async_trait]
    impl CompletionModel for Fixed {
        fn metadata(&self) -> &AdapterMetadata {
            &self.metadata
        }

        async fn complete(&self, request: CompletionRequest) -> AdapterResult<String> {
            if request.prompt().is_empty() {
                return Err(AdapterError::invalid_request("empty prompt"));
            }
            Ok("fixed answer".to_owned())
        }
    }

    #[tokio::test]
    async fn complete_reports_invalid_requests() {
        assert_eq!(
            fixed().complete(CompletionRequest::new("ping")).await.unwrap(),
            "fixed answer"
        );
        let err = fixed()
            .complete(CompletionRequest::new(""))
            .await
            .expect_err("empty prompt");
        assert_eq!(err.to_string(), "invalid completion request: empty prompt");
    }

    #[test]
    fn transport_errors_render_reason() {
        assert_eq!(
            AdapterError::transport("timeout").to_string(),
            "adapter transport error: timeout"
        );
    }

    #[test]
    fn metadata_accessors() {
        let metadata = AdapterMetadata::new("echo", "echo-1");
        assert_eq!(metadata.provider(), "echo");
        assert_eq!(metadata.model(), "echo-1");
    }
}
