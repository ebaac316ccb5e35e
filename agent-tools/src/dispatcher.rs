//! Resolves tool calls against the registry and runs their handlers.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::arguments::ToolArguments;
use crate::builtin;
use crate::error::{ToolError, ToolResult};
use crate::registry::ToolRegistry;
use crate::result::ToolCallResult;
use crate::server::McpTool;

/// Trait implemented by tool executors.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool with arguments already validated against its schema.
    async fn call(&self, args: ToolArguments) -> ToolResult<Value>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Send + Sync + Fn(ToolArguments) -> Fut,
    Fut: Future<Output = ToolResult<Value>> + Send,
{
    async fn call(&self, args: ToolArguments) -> ToolResult<Value> {
        (self)(args).await
    }
}

/// Executes tool calls by name.
///
/// Tools are resolved against the registry's current catalog, so a disabled
/// server's tools stop resolving immediately. Every outcome, including a
/// panicking handler, comes back as a [`ToolCallResult`].
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    handlers: RwLock<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("registry", &self.registry)
            .field("handlers", &self.handler_names())
            .finish()
    }
}

impl ToolDispatcher {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a dispatcher with the `read_file`, `write_file` and
    /// `search_web` handlers installed.
    #[must_use]
    pub fn with_builtin_handlers(registry: Arc<ToolRegistry>) -> Self {
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert(builtin::READ_FILE.to_owned(), Arc::new(builtin::read_file));
        handlers.insert(builtin::WRITE_FILE.to_owned(), Arc::new(builtin::write_file));
        handlers.insert(builtin::SEARCH_WEB.to_owned(), Arc::new(builtin::search_web));
        Self {
            registry,
            handlers: RwLock::new(handlers),
        }
    }

    /// Returns the registry the dispatcher resolves against.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Registers a handler for the tool called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateHandler`] if a handler already exists for
    /// that name.
    pub fn register_handler<H>(&self, name: impl Into<String>, handler: H) -> ToolResult<()>
    where
        H: ToolHandler + 'static,
    {
        let name = name.into();
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.contains_key(&name) {
            return Err(ToolError::DuplicateHandler { name });
        }
        debug!(tool = %name, "tool handler registered");
        handlers.insert(name, Arc::new(handler));
        Ok(())
    }

    /// Returns the names of all installed handlers, sorted.
    #[must_use]
    pub fn handler_names(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Executes the first enabled tool called `name`.
    pub async fn execute(&self, name: &str, args: Map<String, Value>) -> ToolCallResult {
        let tool = self.registry.find_tool(name);
        self.run(name, tool, args).await
    }

    /// Executes the tool called `name` on the server `server_id`.
    pub async fn execute_on(
        &self,
        server_id: &str,
        name: &str,
        args: Map<String, Value>,
    ) -> ToolCallResult {
        let tool = self.registry.find_qualified_tool(server_id, name);
        self.run(name, tool, args).await
    }

    async fn run(
        &self,
        name: &str,
        tool: Option<McpTool>,
        args: Map<String, Value>,
    ) -> ToolCallResult {
        let result = self.try_run(name, tool, args).await;
        match &result {
            Ok(_) => debug!(tool = name, "tool call succeeded"),
            Err(err) => debug!(tool = name, error = %err, "tool call failed"),
        }
        result.into()
    }

    async fn try_run(
        &self,
        name: &str,
        tool: Option<McpTool>,
        args: Map<String, Value>,
    ) -> ToolResult<Value> {
        let tool = tool.ok_or_else(|| ToolError::NotFound {
            name: name.to_owned(),
        })?;
        let handler = self.handler(name).ok_or_else(|| ToolError::NotImplemented {
            name: name.to_owned(),
        })?;
        let args = ToolArguments::new(args).validate(tool.input_schema())?;

        match AssertUnwindSafe(handler.call(args)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                warn!(tool = name, server_id = %tool.server_id(), reason, "tool handler panicked");
                Err(ToolError::failed(reason))
            }
        }
    }

    fn handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.get(name).cloned()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "handler panicked"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::default_servers;
    use crate::schema::{PropertySchema, ToolSchema};
    use crate::server::McpServer;
    use agent_primitives::ServerId;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    async fn double(args: ToolArguments) -> ToolResult<Value> {
        let n = args.integer("n").ok_or_else(|| ToolError::missing("n"))?;
        Ok(json!(n * 2))
    }

    async fn noop(_args: ToolArguments) -> ToolResult<Value> {
        Ok(Value::Null)
    }

    async fn explode(_args: ToolArguments) -> ToolResult<Value> {
        panic!("boom")
    }

    async fn seeded() -> ToolDispatcher {
        let registry = Arc::new(ToolRegistry::new());
        registry.seed_if_empty(default_servers()).await;
        ToolDispatcher::with_builtin_handlers(registry)
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let dispatcher = seeded().await;
        let result = dispatcher.execute("no_such_tool", Map::new()).await;
        assert_eq!(result.error(), Some("Tool not found: no_such_tool"));
    }

    #[tokio::test]
    async fn read_file_validates_then_reads() {
        let dispatcher = seeded().await;
        let result = dispatcher.execute("read_file", Map::new()).await;
        assert_eq!(result.error(), Some("Path required"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let result = dispatcher
            .execute("read_file", map(json!({"path": path.to_str().unwrap()})))
            .await;
        assert!(result.is_success());
        assert_eq!(result.result(), Some(&json!("hello")));
    }

    #[tokio::test]
    async fn schema_types_are_enforced() {
        let dispatcher = seeded().await;
        let result = dispatcher
            .execute("search_web", map(json!({"query": "rust", "limit": "two"})))
            .await;
        assert_eq!(
            result.error(),
            Some("Invalid argument limit: expected integer")
        );
    }

    #[tokio::test]
    async fn registered_tool_without_handler_is_not_implemented() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .add_server(McpServer::new(ServerId::new("calc").unwrap(), "Calc", "node").with_tool(
                "add",
                "Adds",
                ToolSchema::new(),
            ))
            .await;
        let dispatcher = ToolDispatcher::with_builtin_handlers(registry);

        let result = dispatcher.execute("add", Map::new()).await;
        assert_eq!(result.error(), Some("Tool not implemented: add"));
    }

    #[tokio::test]
    async fn disabling_a_server_hides_its_tools() {
        let dispatcher = seeded().await;
        let disabled = builtin::web_search_server().with_enabled(false);
        dispatcher.registry().add_server(disabled).await;

        let result = dispatcher
            .execute("search_web", map(json!({"query": "rust"})))
            .await;
        assert_eq!(result.error(), Some("Tool not found: search_web"));
    }

    #[tokio::test]
    async fn custom_handlers_and_duplicates() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .add_server(McpServer::new(ServerId::new("calc").unwrap(), "Calc", "node").with_tool(
                "double",
                "Doubles",
                ToolSchema::new().required_property("n", PropertySchema::integer("value")),
            ))
            .await;
        let dispatcher = ToolDispatcher::new(registry);

        dispatcher.register_handler("double", double).unwrap();
        let err = dispatcher.register_handler("double", noop).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateHandler { .. }));

        let result = dispatcher.execute("double", map(json!({"n": 21}))).await;
        assert_eq!(result.result(), Some(&json!(42)));
        assert_eq!(dispatcher.handler_names(), ["double"]);
    }

    #[tokio::test]
    async fn panicking_handler_becomes_failure() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .add_server(McpServer::new(ServerId::new("bad").unwrap(), "Bad", "node").with_tool(
                "explode",
                "Panics",
                ToolSchema::new(),
            ))
            .await;
        let dispatcher = ToolDispatcher::new(registry);
        dispatcher.register_handler("explode", explode).unwrap();

        let result = dispatcher.execute("explode", Map::new()).await;
        assert_eq!(result.error(), Some("Tool execution failed: boom"));
    }

    #[tokio::test]
    async fn qualified_execution_targets_one_server() {
        let dispatcher = seeded().await;
        let result = dispatcher
            .execute_on("filesystem", "search_web", map(json!({"query": "rust"})))
            .await;
        assert_eq!(result.error(), Some("Tool not found: search_web"));

        let result = dispatcher
            .execute_on("web-search", "search_web", map(json!({"query": "rust", "limit": 1})))
            .await;
        assert_eq!(result.result().and_then(Value::as_array).map(Vec::len), Some(1));
    }
}
