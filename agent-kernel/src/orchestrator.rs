//! Chat turn orchestration over the model, the conversation store and the
//! tool dispatcher.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use agent_adapters::{CompletionModel, CompletionRequest};
use agent_memory::{ChatMessage, ConversationStore};
use agent_primitives::{ConversationId, MessageId};
use agent_telemetry::ServiceHealth;
use agent_tools::ToolDispatcher;
use agent_tools::builtin::{READ_FILE, SEARCH_WEB, WRITE_FILE};
use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::chat::{ChatRequest, ChatResponse};
use crate::outcome::{ChatOutcome, ChatOutcomeSink, TracingChatSink};
use crate::stream::{ChatStream, StreamEmitter, non_blank};

/// Text stored when the model answers with nothing.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Unable to generate a response.";

/// Drives chat turns.
///
/// Both entry points store the user message first and share failure
/// semantics: an upstream model error becomes an `"Error: ..."` answer and no
/// assistant message is stored.
#[derive(Clone)]
pub struct ChatOrchestrator {
    model: Arc<dyn CompletionModel>,
    store: Arc<dyn ConversationStore>,
    dispatcher: Arc<ToolDispatcher>,
    sink: Arc<dyn ChatOutcomeSink>,
    fallback_message: String,
}

impl fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.model.metadata();
        f.debug_struct("ChatOrchestrator")
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .field("fallback_message", &self.fallback_message)
            .finish_non_exhaustive()
    }
}

impl ChatOrchestrator {
    /// Creates an orchestrator that reports outcomes through tracing.
    #[must_use]
    pub fn new(
        model: Arc<dyn CompletionModel>,
        store: Arc<dyn ConversationStore>,
        dispatcher: Arc<ToolDispatcher>,
    ) -> Self {
        Self {
            model,
            store,
            dispatcher,
            sink: Arc::new(TracingChatSink),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_owned(),
        }
    }

    /// Replaces the outcome sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ChatOutcomeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the text stored when the model answers with nothing.
    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Returns the conversation store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Returns the tool dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<ToolDispatcher> {
        &self.dispatcher
    }

    /// Runs one single-shot chat turn.
    pub async fn chat(&self, request: ChatRequest) -> ChatResponse {
        let conversation_id = self.open_turn(&request).await;

        let completion = self
            .model
            .complete(CompletionRequest::new(request.message))
            .await;

        let (id, message) = match completion {
            Ok(text) => {
                let content = non_blank(text, &self.fallback_message);
                let assistant = ChatMessage::assistant(content.clone());
                let id = assistant.id();
                self.store.append(&conversation_id, assistant).await;
                self.sink.record(ChatOutcome::completed(
                    conversation_id.clone(),
                    id,
                    content.clone(),
                    false,
                ));
                (id, content)
            }
            Err(err) => {
                warn!(
                    conversation_id = %conversation_id,
                    provider = self.model.metadata().provider(),
                    error = %err,
                    "model call failed during chat"
                );
                let id = MessageId::random();
                self.sink.record(ChatOutcome::failed(
                    conversation_id.clone(),
                    id,
                    err.to_string(),
                    false,
                ));
                (id, format!("Error: {err}"))
            }
        };

        ChatResponse {
            id,
            message,
            conversation_id,
            tools_used: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Starts a streamed chat turn.
    ///
    /// The user message is stored before this returns. The model is called
    /// when the stream is first polled; dropping the stream before its
    /// terminal event stores nothing further.
    pub async fn chat_stream(&self, request: ChatRequest) -> ChatStream {
        let conversation_id = self.open_turn(&request).await;
        StreamEmitter::new(
            Arc::clone(&self.model),
            Arc::clone(&self.store),
            Arc::clone(&self.sink),
            conversation_id,
            request.message,
            self.fallback_message.clone(),
        )
        .into_stream()
    }

    async fn open_turn(&self, request: &ChatRequest) -> ConversationId {
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(ConversationId::generate);
        debug!(
            conversation_id = %conversation_id,
            use_tools = request.use_tools,
            "chat turn started"
        );
        self.store
            .append(&conversation_id, ChatMessage::user(request.message.clone()))
            .await;
        conversation_id
    }

    /// Returns the messages of a conversation; empty when unknown.
    pub async fn conversation(&self, id: &ConversationId) -> Vec<ChatMessage> {
        self.store.get(id).await
    }

    /// Drops a conversation. Unknown ids are ignored.
    pub async fn clear_conversation(&self, id: &ConversationId) {
        self.store.clear(id).await;
        info!(conversation_id = %id, "conversation cleared");
    }

    /// Returns every conversation.
    pub async fn conversations(&self) -> HashMap<ConversationId, Vec<ChatMessage>> {
        self.store.list_all().await
    }

    /// Reads a file through the `read_file` tool and renders the outcome as
    /// assistant-facing text.
    pub async fn read_file_text(&self, path: &str) -> String {
        let result = self
            .dispatcher
            .execute(READ_FILE, arguments(json!({"path": path})))
            .await;
        match result.error() {
            None => match result.result() {
                Some(Value::String(text)) if !text.is_empty() => text.clone(),
                _ => "The file was read but it is empty.".to_owned(),
            },
            Some(error) => format!("File read failed: {error}"),
        }
    }

    /// Writes a file through the `write_file` tool and renders the outcome as
    /// assistant-facing text.
    pub async fn write_file_text(&self, path: &str, content: &str) -> String {
        let result = self
            .dispatcher
            .execute(WRITE_FILE, arguments(json!({"path": path, "content": content})))
            .await;
        match result.error() {
            None => "The file was saved successfully.".to_owned(),
            Some(error) => format!("File save failed: {error}"),
        }
    }

    /// Searches the web through the `search_web` tool and renders the results
    /// as assistant-facing text.
    pub async fn web_search_text(&self, query: &str, limit: Option<i64>) -> String {
        let mut args = arguments(json!({"query": query}));
        if let Some(limit) = limit {
            args.insert("limit".to_owned(), Value::from(limit));
        }

        let result = self.dispatcher.execute(SEARCH_WEB, args).await;
        if let Some(error) = result.error() {
            return format!("Web search failed: {error}");
        }

        let rendered: Vec<String> = result
            .result()
            .and_then(Value::as_array)
            .map(|hits| hits.iter().map(render_search_hit).collect())
            .unwrap_or_default();
        if rendered.is_empty() {
            "No search results found.".to_owned()
        } else {
            rendered.join("\n\n")
        }
    }

    /// Builds the chat service health report.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn health(&self) -> ServiceHealth {
        ServiceHealth::ok("ChatService")
    }
}

fn arguments(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn render_search_hit(hit: &Value) -> String {
    let field = |name: &str| hit.get(name).and_then(Value::as_str).unwrap_or_default();
    format!(
        "Title: {}\nURL: {}\nSummary: {}",
        field("title"),
        field("url"),
        field("snippet")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_adapters::{AdapterError, AdapterMetadata, AdapterResult};
    use agent_memory::{InMemoryConversationStore, MessageRole};
    use agent_tools::ToolRegistry;
    use agent_tools::builtin::default_servers;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::outcome::CollectingChatSink;

    struct StaticModel {
        metadata: AdapterMetadata,
        response: AdapterResult<String>,
        calls: AtomicUsize,
    }

    impl StaticModel {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                metadata: AdapterMetadata::new("test", "static"),
                response: Ok(text.to_owned()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                metadata: AdapterMetadata::new("test", "static"),
                response: Err(AdapterError::transport(reason)),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionModel for StaticModel {
        fn metadata(&self) -> &AdapterMetadata {
            &self.metadata
        }

        async fn complete(&self, _request: CompletionRequest) -> AdapterResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    async fn orchestrator(model: Arc<StaticModel>) -> ChatOrchestrator {
        let registry = Arc::new(ToolRegistry::new());
        registry.seed_if_empty(default_servers()).await;
        ChatOrchestrator::new(
            model,
            Arc::new(InMemoryConversationStore::new()),
            Arc::new(ToolDispatcher::with_builtin_handlers(registry)),
        )
    }

    fn conversation(id: &str) -> ConversationId {
        ConversationId::new(id).unwrap()
    }

    #[tokio::test]
    async fn chat_stores_both_sides() {
        let chat = orchestrator(StaticModel::answering("Hello there")).await;
        let response = chat
            .chat(ChatRequest::new("hi").with_conversation_id(conversation("c1")))
            .await;

        assert_eq!(response.message, "Hello there");
        assert!(response.tools_used.is_empty());
        let history = chat.conversation(&conversation("c1")).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role(), MessageRole::User);
        assert_eq!(history[0].content(), "hi");
        assert_eq!(history[1].id(), response.id);
        assert_eq!(history[1].content(), "Hello there");
    }

    #[tokio::test]
    async fn chat_generates_conversation_id() {
        let chat = orchestrator(StaticModel::answering("ok")).await;
        let response = chat.chat(ChatRequest::new("hi")).await;
        assert_eq!(chat.conversation(&response.conversation_id).await.len(), 2);
    }

    #[tokio::test]
    async fn empty_answer_uses_fallback() {
        let chat = orchestrator(StaticModel::answering("   "))
            .await
            .with_fallback_message("Nothing to say.");
        let response = chat.chat(ChatRequest::new("hi")).await;
        assert_eq!(response.message, "Nothing to say.");
    }

    #[tokio::test]
    async fn chat_failure_is_soft() {
        let sink = CollectingChatSink::new();
        let chat = orchestrator(StaticModel::failing("connection reset"))
            .await
            .with_sink(sink.clone());
        let id = conversation("c1");
        let response = chat
            .chat(ChatRequest::new("hi").with_conversation_id(id.clone()))
            .await;

        assert_eq!(
            response.message,
            "Error: adapter transport error: connection reset"
        );
        let history = chat.conversation(&id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role(), MessageRole::User);

        let outcomes = sink.drain();
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].streamed());
        assert_eq!(
            outcomes[0].error(),
            Some("adapter transport error: connection reset")
        );
    }

    #[tokio::test]
    async fn stream_round_trips_into_store() {
        let sink = CollectingChatSink::new();
        let chat = orchestrator(StaticModel::answering("streamed reply here"))
            .await
            .with_sink(sink.clone());
        let id = conversation("s1");

        let events: Vec<_> = chat
            .chat_stream(ChatRequest::new("go").with_conversation_id(id.clone()))
            .await
            .collect()
            .await;

        let (terminal, deltas) = events.split_last().unwrap();
        assert!(terminal.is_complete);
        assert_eq!(terminal.delta, "");
        assert!(deltas.iter().all(|event| !event.is_complete));
        assert!(events.iter().all(|event| event.id == terminal.id));

        let streamed: String = deltas.iter().map(|event| event.delta.as_str()).collect();
        assert_eq!(streamed, "streamed reply here ");

        let history = chat.conversation(&id).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content(), streamed);
        assert_eq!(history[1].id(), terminal.id);

        let outcomes = sink.drain();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].streamed());
    }

    #[tokio::test]
    async fn stream_failure_ends_with_error_event() {
        let chat = orchestrator(StaticModel::failing("timeout")).await;
        let id = conversation("s2");

        let events: Vec<_> = chat
            .chat_stream(ChatRequest::new("go").with_conversation_id(id.clone()))
            .await
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(events[0].is_complete);
        assert_eq!(events[0].delta, "Error: adapter transport error: timeout");
        assert_eq!(chat.conversation(&id).await.len(), 1);
    }

    #[tokio::test]
    async fn stream_is_lazy_and_cancellable() {
        let model = StaticModel::answering("one two three");
        let chat = orchestrator(Arc::clone(&model)).await;
        let id = conversation("s3");

        let mut stream = chat
            .chat_stream(ChatRequest::new("go").with_conversation_id(id.clone()))
            .await;
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.conversation(&id).await.len(), 1);

        let first = stream.next().await.unwrap();
        assert_eq!(first.delta, "one ");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        drop(stream);

        let history = chat.conversation(&id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role(), MessageRole::User);
    }

    #[tokio::test]
    async fn clear_and_list_conversations() {
        let chat = orchestrator(StaticModel::answering("ok")).await;
        chat.chat(ChatRequest::new("a").with_conversation_id(conversation("a")))
            .await;
        chat.chat(ChatRequest::new("b").with_conversation_id(conversation("b")))
            .await;
        assert_eq!(chat.conversations().await.len(), 2);

        chat.clear_conversation(&conversation("a")).await;
        chat.clear_conversation(&conversation("missing")).await;
        let all = chat.conversations().await;
        assert_eq!(all.len(), 1);
        assert!(all.contains_key(&conversation("b")));
    }

    #[tokio::test]
    async fn narration_helpers_render_outcomes() {
        let chat = orchestrator(StaticModel::answering("ok")).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let path = path.to_str().unwrap();

        assert_eq!(
            chat.write_file_text(path, "remember").await,
            "The file was saved successfully."
        );
        assert_eq!(chat.read_file_text(path).await, "remember");

        let missing = dir.path().join("missing.txt");
        let text = chat.read_file_text(missing.to_str().unwrap()).await;
        assert!(text.starts_with("File read failed: Failed to read file: "));

        let text = chat.web_search_text("rust", Some(1)).await;
        assert_eq!(
            text,
            "Title: Sample Result 1\nURL: https://example1.com\nSummary: Sample snippet 1"
        );
        assert_eq!(
            chat.web_search_text("rust", Some(0)).await,
            "No search results found."
        );
        assert_eq!(chat.web_search_text("rust", None).await.matches("Title:").count(), 2);
    }

    #[tokio::test]
    async fn health_reports_chat_service() {
        let chat = orchestrator(StaticModel::answering("ok")).await;
        let value = serde_json::to_value(chat.health()).unwrap();
        assert_eq!(value, json!({"status": "OK", "service": "ChatService"}));
    }
}
