//! Strongly typed configuration schemas.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level runtime configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Tool server registry settings.
    pub mcp: McpSettings,
    /// Chat orchestration settings.
    pub chat: ChatSettings,
    /// Logging settings.
    pub telemetry: TelemetrySettings,
}

/// Settings for the tool server registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct McpSettings {
    /// JSON file holding the persisted server list.
    pub config_path: PathBuf,
    /// Whether tool servers are loaded at all.
    pub enabled: bool,
    /// Seed the built-in servers when the registry starts empty.
    pub seed_builtin_servers: bool,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("mcp-servers.json"),
            enabled: true,
            seed_builtin_servers: true,
        }
    }
}

/// Settings for chat turns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatSettings {
    /// Assistant text used when the model returns an empty answer. The
    /// orchestrator's built-in text applies when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_message: Option<String>,
}

/// Settings for the tracing subscriber.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySettings {
    /// `EnvFilter` directive, e.g. `info,agent_tools=debug`.
    pub log_filter: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_filter: "info".to_owned(),
        }
    }
}
