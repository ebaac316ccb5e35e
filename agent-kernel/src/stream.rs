//! Incremental delivery of an assistant response.
//!
//! A streamed turn moves through [`StreamPhase::Started`], zero or more
//! [`StreamPhase::Emitting`] steps and ends in exactly one terminal phase. The
//! stream is produced lazily: the model is called on the first poll and the
//! assistant message is only stored once every delta has been pulled.

use std::collections::VecDeque;
use std::sync::Arc;

use agent_adapters::{CompletionModel, CompletionRequest};
use agent_memory::{ChatMessage, ConversationStore, MessageRole};
use agent_primitives::{ConversationId, MessageId};
use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;
use tracing::{debug, warn};

use crate::chat::StreamChatResponse;
use crate::outcome::{ChatOutcome, ChatOutcomeSink};

/// Stream of events produced by one streamed chat turn.
pub type ChatStream = BoxStream<'static, StreamChatResponse>;

/// Separator used to cut a response into deltas.
pub const WORD_SEPARATOR: char = ' ';

/// Phases a streamed response occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// The user message is stored; nothing has been emitted yet.
    Started,
    /// Deltas are being emitted.
    Emitting {
        /// Number of deltas emitted so far.
        emitted: usize,
    },
    /// All deltas were emitted and the assistant message stored.
    Completed,
    /// The response failed; an error event ended the stream.
    Failed,
}

impl StreamPhase {
    /// Returns `true` once no further event may be emitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Events that drive [`StreamLifecycle`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    /// One non-terminal delta is emitted.
    Delta,
    /// The terminal success event is emitted.
    Complete,
    /// The terminal error event is emitted.
    Fail,
}

/// Phase tracker of one streamed response.
#[derive(Debug, Clone, Copy)]
pub struct StreamLifecycle {
    response_id: MessageId,
    phase: StreamPhase,
}

impl StreamLifecycle {
    /// Creates a tracker in [`StreamPhase::Started`].
    #[must_use]
    pub const fn new(response_id: MessageId) -> Self {
        Self {
            response_id,
            phase: StreamPhase::Started,
        }
    }

    /// Returns the response identifier.
    #[must_use]
    pub const fn response_id(&self) -> MessageId {
        self.response_id
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Applies an event, returning the resulting phase.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidTransition`] when the event is not
    /// allowed from the current phase, which includes every event after a
    /// terminal phase.
    pub fn transition(&mut self, event: StreamEvent) -> StreamResult<StreamPhase> {
        let next = match (self.phase, event) {
            (StreamPhase::Started, StreamEvent::Delta) => Some(StreamPhase::Emitting { emitted: 1 }),
            (StreamPhase::Emitting { emitted }, StreamEvent::Delta) => {
                Some(StreamPhase::Emitting {
                    emitted: emitted + 1,
                })
            }
            (StreamPhase::Started | StreamPhase::Emitting { .. }, StreamEvent::Complete) => {
                Some(StreamPhase::Completed)
            }
            (StreamPhase::Started | StreamPhase::Emitting { .. }, StreamEvent::Fail) => {
                Some(StreamPhase::Failed)
            }
            _ => None,
        };

        let Some(next_phase) = next else {
            return Err(StreamError::InvalidTransition {
                response_id: self.response_id,
                from: self.phase,
                event,
            });
        };

        if next_phase.is_terminal() {
            debug!(
                response_id = %self.response_id,
                from = ?self.phase,
                to = ?next_phase,
                "stream phase transition"
            );
        }
        self.phase = next_phase;
        Ok(next_phase)
    }
}

/// Errors emitted by the stream phase tracker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Transition was not permitted from the current phase.
    #[error("invalid stream transition from {from:?} via {event:?} for response {response_id}")]
    InvalidTransition {
        /// Identifier of the response whose transition failed.
        response_id: MessageId,
        /// Phase prior to the attempted transition.
        from: StreamPhase,
        /// Event that triggered the failure.
        event: StreamEvent,
    },
}

/// Result alias used for stream phase operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Cuts `text` at every [`WORD_SEPARATOR`] and re-appends the separator to
/// each piece.
///
/// Concatenating the pieces yields `text` followed by one separator.
#[must_use]
pub fn segment_words(text: &str) -> Vec<String> {
    text.split(WORD_SEPARATOR)
        .map(|word| {
            let mut delta = String::with_capacity(word.len() + 1);
            delta.push_str(word);
            delta.push(WORD_SEPARATOR);
            delta
        })
        .collect()
}

/// Replaces a blank model answer with `fallback`.
pub(crate) fn non_blank(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_owned()
    } else {
        text
    }
}

/// Producer of one streamed response.
pub(crate) struct StreamEmitter {
    model: Arc<dyn CompletionModel>,
    store: Arc<dyn ConversationStore>,
    sink: Arc<dyn ChatOutcomeSink>,
    conversation_id: ConversationId,
    prompt: String,
    fallback: String,
    lifecycle: StreamLifecycle,
}

impl StreamEmitter {
    pub(crate) fn new(
        model: Arc<dyn CompletionModel>,
        store: Arc<dyn ConversationStore>,
        sink: Arc<dyn ChatOutcomeSink>,
        conversation_id: ConversationId,
        prompt: String,
        fallback: String,
    ) -> Self {
        Self {
            model,
            store,
            sink,
            conversation_id,
            prompt,
            fallback,
            lifecycle: StreamLifecycle::new(MessageId::random()),
        }
    }

    pub(crate) fn into_stream(self) -> ChatStream {
        stream::unfold(Production::Pending(self), Production::advance).boxed()
    }

    fn response_id(&self) -> MessageId {
        self.lifecycle.response_id()
    }

    fn fail(mut self, reason: &str) -> (StreamChatResponse, Production) {
        if let Err(err) = self.lifecycle.transition(StreamEvent::Fail) {
            debug!(error = %err, "failure reported after terminal phase");
        }
        let response_id = self.response_id();
        self.sink.record(ChatOutcome::failed(
            self.conversation_id.clone(),
            response_id,
            reason.to_owned(),
            true,
        ));

        let event = StreamChatResponse::terminal(
            response_id,
            self.conversation_id,
            format!("Error: {reason}"),
        );
        (event, Production::Done)
    }

    async fn complete(mut self, content: String) -> (StreamChatResponse, Production) {
        if let Err(err) = self.lifecycle.transition(StreamEvent::Complete) {
            return self.fail(&err.to_string());
        }

        let response_id = self.response_id();
        let message = ChatMessage::builder(MessageRole::Assistant, content.clone())
            .id(response_id)
            .build();
        self.store.append(&self.conversation_id, message).await;
        self.sink.record(ChatOutcome::completed(
            self.conversation_id.clone(),
            response_id,
            content,
            true,
        ));

        let event = StreamChatResponse::terminal(response_id, self.conversation_id, String::new());
        (event, Production::Done)
    }
}

enum Production {
    Pending(StreamEmitter),
    Emitting {
        emitter: StreamEmitter,
        deltas: VecDeque<String>,
        content: String,
    },
    Done,
}

impl Production {
    async fn advance(self) -> Option<(StreamChatResponse, Self)> {
        let mut state = self;
        loop {
            match state {
                Self::Done => return None,
                Self::Pending(emitter) => {
                    let request = CompletionRequest::new(emitter.prompt.clone());
                    match emitter.model.complete(request).await {
                        Ok(text) => {
                            let text = non_blank(text, &emitter.fallback);
                            state = Self::Emitting {
                                deltas: segment_words(&text).into(),
                                content: String::with_capacity(text.len() + 1),
                                emitter,
                            };
                        }
                        Err(err) => {
                            warn!(
                                conversation_id = %emitter.conversation_id,
                                provider = emitter.model.metadata().provider(),
                                error = %err,
                                "model call failed during streamed chat"
                            );
                            return Some(emitter.fail(&err.to_string()));
                        }
                    }
                }
                Self::Emitting {
                    mut emitter,
                    mut deltas,
                    mut content,
                } => {
                    let Some(delta) = deltas.pop_front() else {
                        return Some(emitter.complete(content).await);
                    };
                    if let Err(err) = emitter.lifecycle.transition(StreamEvent::Delta) {
                        return Some(emitter.fail(&err.to_string()));
                    }

                    content.push_str(&delta);
                    let event = StreamChatResponse::fragment(
                        emitter.response_id(),
                        emitter.conversation_id.clone(),
                        delta,
                    );
                    return Some((
                        event,
                        Self::Emitting {
                            emitter,
                            deltas,
                            content,
                        },
                    ));
                }
            }
        }
    }
}
