//! Built-in tool servers and their in-process handlers.
//!
//! The handlers simulate what the external file-system and web-search servers
//! would do, so the runtime is usable without spawning any process.

use agent_primitives::ServerId;
use serde_json::{Value, json};
use tokio::fs;

use crate::arguments::ToolArguments;
use crate::error::{ToolError, ToolResult};
use crate::schema::{PropertySchema, PropertyType, ToolSchema};
use crate::server::McpServer;

/// Identifier of the built-in file-system server.
pub const FILESYSTEM_SERVER: &str = "filesystem";
/// Identifier of the built-in web-search server.
pub const WEB_SEARCH_SERVER: &str = "web-search";

/// Name of the file-reading tool.
pub const READ_FILE: &str = "read_file";
/// Name of the file-writing tool.
pub const WRITE_FILE: &str = "write_file";
/// Name of the web-search tool.
pub const SEARCH_WEB: &str = "search_web";

/// Result returned by [`write_file`] on success.
pub const FILE_WRITTEN: &str = "File written successfully";

const DEFAULT_SEARCH_LIMIT: i64 = 5;

/// Returns the servers seeded into an empty registry.
#[must_use]
pub fn default_servers() -> Vec<McpServer> {
    vec![filesystem_server(), web_search_server()]
}

/// Returns the file-system server definition.
#[must_use]
pub fn filesystem_server() -> McpServer {
    McpServer::new(ServerId::from_static(FILESYSTEM_SERVER), "File System", "node")
        .with_description("Tools for working with the local file system")
        .with_args(["filesystem-server.js"])
        .with_tool(
            READ_FILE,
            "Reads the contents of a file",
            ToolSchema::new().required_property("path", PropertySchema::string("Path of the file to read")),
        )
        .with_tool(
            WRITE_FILE,
            "Writes content to a file",
            ToolSchema::new()
                .required_property("path", PropertySchema::string("Path of the file to write"))
                .required_property("content", PropertySchema::string("Content to write")),
        )
}

/// Returns the web-search server definition.
#[must_use]
pub fn web_search_server() -> McpServer {
    McpServer::new(ServerId::from_static(WEB_SEARCH_SERVER), "Web Search", "python")
        .with_description("Searches the web")
        .with_args(["web-search-server.py"])
        .with_tool(
            SEARCH_WEB,
            "Searches the web for information",
            ToolSchema::new()
                .required_property("query", PropertySchema::string("Search query"))
                .property(
                    "limit",
                    PropertySchema::integer("Maximum number of results")
                        .with_default(DEFAULT_SEARCH_LIMIT),
                ),
        )
}

/// Returns a disabled server definition showing every configurable field.
#[must_use]
pub fn example_server() -> McpServer {
    McpServer::new(ServerId::from_static("example-server"), "Example MCP Server", "node")
        .with_description("Example server configuration")
        .with_args(["server.js"])
        .with_env("API_KEY", "your-api-key")
        .with_enabled(false)
        .with_tool(
            "example_tool",
            "Example tool",
            ToolSchema::new()
                .required_property("input", PropertySchema::string("Input value"))
                .property(
                    "option",
                    PropertySchema::new(PropertyType::Boolean, "Option flag"),
                ),
        )
}

/// Reads a file and returns its contents as a string.
///
/// # Errors
///
/// Returns [`ToolError::MissingArgument`] without a `path` and
/// [`ToolError::Execution`] when the file cannot be read.
pub async fn read_file(args: ToolArguments) -> ToolResult<Value> {
    let path = args.require_str("path")?;
    let contents = fs::read_to_string(path)
        .await
        .map_err(|err| ToolError::execution("Failed to read file", err))?;
    Ok(Value::String(contents))
}

/// Writes `content` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`ToolError::MissingArgument`] without `path` or `content` and
/// [`ToolError::Execution`] when the write fails.
pub async fn write_file(args: ToolArguments) -> ToolResult<Value> {
    let path = args.require_str("path")?;
    let content = args.require_str("content")?;
    fs::write(path, content)
        .await
        .map_err(|err| ToolError::execution("Failed to write file", err))?;
    Ok(Value::from(FILE_WRITTEN))
}

/// Returns simulated search results, at most `limit` of them.
///
/// # Errors
///
/// Returns [`ToolError::MissingArgument`] without a `query`.
#[allow(clippy::unused_async)]
pub async fn search_web(args: ToolArguments) -> ToolResult<Value> {
    let query = args.require_str("query")?;
    let limit = args.integer("limit").unwrap_or(DEFAULT_SEARCH_LIMIT);
    let limit = usize::try_from(limit).unwrap_or(0);
    tracing::debug!(query, limit, "simulated web search");

    let results: Vec<Value> = (1..=2)
        .map(|n| {
            json!({
                "title": format!("Sample Result {n}"),
                "url": format!("https://example{n}.com"),
                "snippet": format!("Sample snippet {n}"),
            })
        })
        .take(limit)
        .collect();
    Ok(Value::Array(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn args(value: Value) -> ToolArguments {
        match value {
            Value::Object(map) => ToolArguments::new(map),
            _ => ToolArguments::new(Map::new()),
        }
    }

    #[test]
    fn default_servers_expose_three_tools() {
        let servers = default_servers();
        let names: Vec<_> = servers
            .iter()
            .flat_map(McpServer::tools)
            .map(|tool| tool.name())
            .collect();
        assert_eq!(names, [READ_FILE, WRITE_FILE, SEARCH_WEB]);
        assert!(servers.iter().all(McpServer::enabled));
        assert_eq!(
            servers[0].tools()[1].input_schema().required(),
            ["path", "content"]
        );
    }

    #[test]
    fn example_server_is_disabled() {
        let server = example_server();
        assert!(!server.enabled());
        assert_eq!(server.env()["API_KEY"], "your-api-key");
    }

    #[tokio::test]
    async fn write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let path = path.to_str().unwrap();

        let written = write_file(args(json!({"path": path, "content": "hi"})))
            .await
            .unwrap();
        assert_eq!(written, FILE_WRITTEN);

        let read = read_file(args(json!({"path": path}))).await.unwrap();
        assert_eq!(read, "hi");
    }

    #[tokio::test]
    async fn read_missing_file_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");

        let err = read_file(args(json!({"path": path.to_str().unwrap()})))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read file: "));
    }

    #[tokio::test]
    async fn handlers_require_their_arguments() {
        let err = write_file(args(json!({"path": "/tmp/x"}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Content required");

        let err = search_web(args(json!({}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Query required");
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let all = search_web(args(json!({"query": "rust"}))).await.unwrap();
        assert_eq!(all.as_array().unwrap().len(), 2);
        assert_eq!(all[0]["title"], "Sample Result 1");
        assert_eq!(all[1]["url"], "https://example2.com");

        let one = search_web(args(json!({"query": "rust", "limit": 1})))
            .await
            .unwrap();
        assert_eq!(one.as_array().unwrap().len(), 1);

        let none = search_web(args(json!({"query": "rust", "limit": -3})))
            .await
            .unwrap();
        assert!(none.as_array().unwrap().is_empty());
    }
}
