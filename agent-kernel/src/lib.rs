//! Chat orchestration.
//!
//! [`ChatOrchestrator`] runs chat turns against a [`agent_adapters::CompletionModel`],
//! storing both sides of every turn in a [`agent_memory::ConversationStore`].
//! Streamed turns are produced by a lazy emitter whose phases are tracked by
//! [`StreamLifecycle`].

#![warn(missing_docs, clippy::pedantic)]

mod chat;
mod orchestrator;
mod outcome;
mod stream;

pub use chat::{ChatRequest, ChatResponse, StreamChatResponse};
pub use orchestrator::{ChatOrchestrator, DEFAULT_FALLBACK_MESSAGE};
pub use outcome::{ChatOutcome, ChatOutcomeSink, CollectingChatSink, TracingChatSink};
pub use stream::{
    ChatStream, StreamError, StreamEvent, StreamLifecycle, StreamPhase, StreamResult,
    WORD_SEPARATOR, segment_words,
};
