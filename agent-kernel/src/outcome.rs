//! Observers notified after every chat turn.

use std::sync::{Arc, Mutex, PoisonError};

use agent_primitives::{ConversationId, MessageId};

/// Outcome of one chat turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatOutcome {
    conversation_id: ConversationId,
    response_id: MessageId,
    response: String,
    streamed: bool,
    error: Option<String>,
}

impl ChatOutcome {
    pub(crate) fn completed(
        conversation_id: ConversationId,
        response_id: MessageId,
        response: String,
        streamed: bool,
    ) -> Self {
        Self {
            conversation_id,
            response_id,
            response,
            streamed,
            error: None,
        }
    }

    pub(crate) fn failed(
        conversation_id: ConversationId,
        response_id: MessageId,
        error: String,
        streamed: bool,
    ) -> Self {
        Self {
            conversation_id,
            response_id,
            response: String::new(),
            streamed,
            error: Some(error),
        }
    }

    /// Returns the conversation the turn belongs to.
    #[must_use]
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Returns the response identifier.
    #[must_use]
    pub const fn response_id(&self) -> MessageId {
        self.response_id
    }

    /// Returns the assistant text stored for the turn. Empty on failure.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Returns `true` when the turn was produced through the streaming path.
    #[must_use]
    pub const fn streamed(&self) -> bool {
        self.streamed
    }

    /// Returns the upstream failure message, if the turn failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Observer trait used to capture chat outcomes (for logging, metrics, etc.).
pub trait ChatOutcomeSink: Send + Sync {
    /// Records the outcome of a chat turn.
    fn record(&self, outcome: ChatOutcome);
}

/// Sink implementation that logs to tracing.
#[derive(Debug, Default)]
pub struct TracingChatSink;

impl ChatOutcomeSink for TracingChatSink {
    fn record(&self, outcome: ChatOutcome) {
        match outcome.error() {
            None => tracing::info!(
                conversation_id = %outcome.conversation_id(),
                response_id = %outcome.response_id(),
                streamed = outcome.streamed(),
                response_len = outcome.response().len(),
                "chat turn completed"
            ),
            Some(error) => tracing::warn!(
                conversation_id = %outcome.conversation_id(),
                response_id = %outcome.response_id(),
                streamed = outcome.streamed(),
                error,
                "chat turn failed"
            ),
        }
    }
}

/// Sink that keeps every outcome in memory.
#[derive(Debug, Default)]
pub struct CollectingChatSink {
    outcomes: Mutex<Vec<ChatOutcome>>,
}

impl CollectingChatSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Removes and returns the collected outcomes.
    #[must_use]
    pub fn drain(&self) -> Vec<ChatOutcome> {
        let mut outcomes = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
        outcomes.drain(..).collect()
    }
}

impl ChatOutcomeSink for CollectingChatSink {
    fn record(&self, outcome: ChatOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome);
    }
}
