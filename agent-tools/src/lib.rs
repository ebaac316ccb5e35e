//! Tool server registry and dispatch engine.
//!
//! [`registry::ToolRegistry`] owns the registered servers and answers catalog
//! queries; [`dispatcher::ToolDispatcher`] resolves a tool by name and runs the
//! matching handler, converting every failure into a
//! [`result::ToolCallResult`]. Handlers for the built-in file and web-search
//! tools live in [`builtin`].

#![warn(missing_docs, clippy::pedantic)]

pub mod arguments;
pub mod builtin;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod result;
pub mod schema;
pub mod server;
pub mod store;

pub use arguments::ToolArguments;
pub use dispatcher::{ToolDispatcher, ToolHandler};
pub use error::{ToolError, ToolResult};
pub use registry::ToolRegistry;
pub use result::{ToolCallRequest, ToolCallResult};
pub use schema::{PropertySchema, PropertyType, ToolSchema};
pub use server::{McpServer, McpTool, ServerStatus, ServerStatusInfo, ServerSummary};
pub use store::{JsonFileServerStore, ServerStore};
