//! Persistence of the server registry.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::warn;

use crate::error::{ToolError, ToolResult};
use crate::server::McpServer;

/// Trait implemented by backends that persist the full server list.
///
/// Implementations skip individual records they cannot decode and fail only
/// when the data as a whole is unreadable.
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Reads the persisted servers. A store that was never written returns an
    /// empty list.
    async fn load(&self) -> ToolResult<Vec<McpServer>>;

    /// Replaces the persisted servers with `servers`.
    async fn save(&self, servers: &[McpServer]) -> ToolResult<()>;
}

/// Store writing the servers as a pretty-printed JSON array.
///
/// Every save rewrites the whole file.
#[derive(Debug, Clone)]
pub struct JsonFileServerStore {
    path: PathBuf,
}

impl JsonFileServerStore {
    /// Creates a store backed by `path`. The file is not touched until the
    /// first load or save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ServerStore for JsonFileServerStore {
    async fn load(&self) -> ToolResult<Vec<McpServer>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ToolError::persistence(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )));
            }
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let records: Vec<Value> = serde_json::from_slice(&data).map_err(|err| {
            ToolError::persistence(format!("failed to decode {}: {err}", self.path.display()))
        })?;

        let mut servers = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<McpServer>(record) {
                Ok(server) => servers.push(server),
                Err(err) => warn!(
                    path = %self.path.display(),
                    index,
                    error = %err,
                    "skipping malformed tool server record"
                ),
            }
        }
        Ok(servers)
    }

    async fn save(&self, servers: &[McpServer]) -> ToolResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|err| {
                ToolError::persistence(format!("failed to create {}: {err}", parent.display()))
            })?;
        }

        let body = serde_json::to_vec_pretty(servers)
            .map_err(|err| ToolError::persistence(format!("failed to encode servers: {err}")))?;

        fs::write(&self.path, body).await.map_err(|err| {
            ToolError::persistence(format!("failed to write {}: {err}", self.path.display()))
        })
    }
}
