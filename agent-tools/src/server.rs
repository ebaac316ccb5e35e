//! Tool server and tool records.

use std::collections::BTreeMap;

use agent_primitives::ServerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::ToolSchema;

/// A named, schema-described capability exposed by a server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    input_schema: ToolSchema,
    server_id: ServerId,
}

impl McpTool {
    /// Creates a tool owned by `server_id`.
    #[must_use]
    pub fn new(
        server_id: ServerId,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: ToolSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            server_id,
        }
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    #[must_use]
    pub fn input_schema(&self) -> &ToolSchema {
        &self.input_schema
    }

    /// Returns the owning server identifier.
    #[must_use]
    pub fn server_id(&self) -> &ServerId {
        &self.server_id
    }
}

/// A registered external capability provider and the tools it exposes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServer {
    id: ServerId,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    tools: Vec<McpTool>,
}

impl McpServer {
    /// Creates an enabled server with no tools.
    #[must_use]
    pub fn new(id: ServerId, name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            enabled: true,
            tools: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the launch arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an environment variable for the server process.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets whether the server contributes tools to the catalog.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Appends a tool owned by this server.
    #[must_use]
    pub fn with_tool(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: ToolSchema,
    ) -> Self {
        let tool = McpTool::new(self.id.clone(), name, description, input_schema);
        self.tools.push(tool);
        self
    }

    /// Returns the identifier.
    #[must_use]
    pub fn id(&self) -> &ServerId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the launch command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the launch arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the process environment.
    #[must_use]
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns `true` when the server's tools are visible to the dispatcher.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the exposed tools in declaration order.
    #[must_use]
    pub fn tools(&self) -> &[McpTool] {
        &self.tools
    }

    /// Points every tool's back-reference at this server.
    ///
    /// Returns the number of tools that were corrected.
    pub(crate) fn adopt_tools(&mut self) -> usize {
        let mut corrected = 0;
        for tool in &mut self.tools {
            if tool.server_id != self.id {
                tool.server_id = self.id.clone();
                corrected += 1;
            }
        }
        corrected
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Runtime status of a server process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    /// The process is running.
    Running,
    /// The process is not running.
    #[default]
    Stopped,
    /// The process failed.
    Error,
    /// A connection is being established.
    Connecting,
}

/// Status record kept alongside each registered server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatusInfo {
    server_id: ServerId,
    status: ServerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    last_updated: DateTime<Utc>,
}

impl ServerStatusInfo {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(server_id: ServerId, status: ServerStatus, message: Option<String>) -> Self {
        Self {
            server_id,
            status,
            message,
            last_updated: Utc::now(),
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub fn server_id(&self) -> &ServerId {
        &self.server_id
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> ServerStatus {
        self.status
    }

    /// Returns the optional status message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns when the record was last written.
    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// Compact description of a server for status queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSummary {
    /// Server identifier.
    pub id: ServerId,
    /// Display name.
    pub name: String,
    /// Whether the server is enabled.
    pub enabled: bool,
    /// Number of tools declared by the server.
    pub tool_count: usize,
}

impl From<&McpServer> for ServerSummary {
    fn from(server: &McpServer) -> Self {
        Self {
            id: server.id.clone(),
            name: server.name.clone(),
            enabled: server.enabled,
            tool_count: server.tools.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_with_defaults() {
        let server: McpServer = serde_json::from_value(json!({
            "id": "fs",
            "name": "Files",
            "tools": [{
                "name": "read_file",
                "inputSchema": {"required": ["path"]},
                "serverId": "fs"
            }]
        }))
        .unwrap();

        assert!(server.enabled());
        assert!(server.args().is_empty());
        assert_eq!(server.tools()[0].input_schema().required(), ["path"]);
        assert_eq!(server.tools()[0].server_id().as_str(), "fs");
    }

    #[test]
    fn serializes_camel_case() {
        let id = ServerId::new("fs").unwrap();
        let server = McpServer::new(id, "Files", "node")
            .with_args(["fs.js"])
            .with_env("ROOT", "/tmp")
            .with_tool("read_file", "Reads a file", ToolSchema::new());

        let value = serde_json::to_value(&server).unwrap();
        assert_eq!(value["tools"][0]["serverId"], "fs");
        assert_eq!(value["tools"][0]["inputSchema"]["type"], "object");
        assert_eq!(value["env"]["ROOT"], "/tmp");
        assert_eq!(value["enabled"], true);
    }

    #[test]
    fn adopt_tools_fixes_back_references() {
        let mut server: McpServer = serde_json::from_value(json!({
            "id": "fs",
            "name": "Files",
            "tools": [
                {"name": "a", "serverId": "other"},
                {"name": "b", "serverId": "fs"}
            ]
        }))
        .unwrap();

        assert_eq!(server.adopt_tools(), 1);
        assert!(server.tools().iter().all(|tool| tool.server_id().as_str() == "fs"));
    }

    #[test]
    fn status_uses_upper_case_names() {
        let info = ServerStatusInfo::new(ServerId::new("fs").unwrap(), ServerStatus::Stopped, None);
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["status"], "STOPPED");
        assert!(value.get("message").is_none());
    }
}
