//! Provider-free completion model.

use async_trait::async_trait;
use tracing::debug;

use crate::traits::{AdapterMetadata, AdapterResult, CompletionModel, CompletionRequest};

/// Model that answers with the prompt, optionally prefixed.
#[derive(Clone, Debug)]
pub struct EchoModel {
    metadata: AdapterMetadata,
    prefix: String,
}

impl EchoModel {
    /// Creates a model that returns the prompt unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: AdapterMetadata::new("echo", "echo"),
            prefix: String::new(),
        }
    }

    /// Prepends `prefix` to every answer.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl Default for EchoModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionModel for EchoModel {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn complete(&self, request: CompletionRequest) -> AdapterResult<String> {
        debug!(prompt_len = request.prompt().len(), "echo completion");
        Ok(format!("{}{}", self.prefix, request.prompt()))
    }
}
