//! Registry of tool servers and the catalog of tools they expose.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use agent_primitives::ServerId;
use agent_telemetry::ServiceHealth;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::server::{McpServer, McpTool, ServerStatus, ServerStatusInfo, ServerSummary};
use crate::store::ServerStore;

#[derive(Debug, Default)]
struct RegistryInner {
    // Registration order is the resolution order for bare tool names.
    servers: Vec<McpServer>,
    statuses: HashMap<ServerId, ServerStatusInfo>,
}

impl RegistryInner {
    fn position(&self, id: &str) -> Option<usize> {
        self.servers
            .iter()
            .position(|server| server.id().as_str() == id)
    }

    fn enabled(&self) -> impl Iterator<Item = &McpServer> {
        self.servers.iter().filter(|server| server.enabled())
    }
}

/// Registry that owns tool servers keyed by id.
///
/// All reads are computed from the current records, so enabling or disabling
/// a server is visible to the next catalog query. Adds and removes rewrite the
/// configured [`ServerStore`].
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<RegistryInner>,
    store: Option<Arc<dyn ServerStore>>,
    // Set when the store held data that could not be read; seeding is
    // refused so the file is not replaced with defaults.
    store_unreadable: bool,
    persist: Mutex<()>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        let ids: Vec<_> = inner.servers.iter().map(|s| s.id().as_str()).collect();
        f.debug_struct("ToolRegistry")
            .field("servers", &ids)
            .field("persistent", &self.store.is_some())
            .field("store_unreadable", &self.store_unreadable)
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty, non-persistent registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that persists to `store`.
    #[must_use]
    pub fn with_store(store: Arc<dyn ServerStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Creates a registry populated from `store`.
    ///
    /// An unreadable store is logged and treated as empty, and the registry
    /// then refuses [`ToolRegistry::seed_if_empty`]. Loading never rewrites
    /// the store.
    pub async fn load(store: Arc<dyn ServerStore>) -> Self {
        let (servers, store_unreadable) = match store.load().await {
            Ok(servers) => (servers, false),
            Err(err) => {
                warn!(error = %err, "failed to load tool servers, starting empty");
                (Vec::new(), true)
            }
        };

        let mut registry = Self::with_store(store);
        registry.store_unreadable = store_unreadable;
        {
            let mut inner = registry.write();
            for server in servers {
                insert(&mut inner, server);
            }
            info!(servers = inner.servers.len(), "tool server registry loaded");
        }
        registry
    }

    /// Adds every server in `defaults` when the registry holds none.
    ///
    /// Nothing is seeded over a store that failed to load. Returns `true`
    /// when seeding happened.
    pub async fn seed_if_empty<I>(&self, defaults: I) -> bool
    where
        I: IntoIterator<Item = McpServer>,
    {
        if self.store_unreadable {
            warn!("tool server store is unreadable, not seeding defaults");
            return false;
        }
        if !self.read().servers.is_empty() {
            return false;
        }

        for server in defaults {
            self.add_server(server).await;
        }
        true
    }

    /// Inserts `server`, replacing any server with the same id in place.
    ///
    /// The server's status record is reset to [`ServerStatus::Stopped`] and
    /// the full server set is persisted. Tool names that collide with another
    /// enabled server are accepted; bare-name resolution keeps picking the
    /// earliest registered server.
    pub async fn add_server(&self, server: McpServer) {
        {
            let mut inner = self.write();
            warn_on_collisions(&inner, &server);
            insert(&mut inner, server);
        }
        self.persist().await;
    }

    /// Removes a server and its status record.
    ///
    /// Returns `false` when no server had that id; nothing is persisted in
    /// that case.
    pub async fn remove_server(&self, id: &str) -> bool {
        let removed = {
            let mut inner = self.write();
            match inner.position(id) {
                Some(index) => {
                    let server = inner.servers.remove(index);
                    inner.statuses.remove(server.id());
                    info!(server_id = id, "tool server removed");
                    true
                }
                None => false,
            }
        };

        if removed {
            self.persist().await;
        } else {
            debug!(server_id = id, "remove requested for unknown tool server");
        }
        removed
    }

    /// Returns the server with the given id.
    #[must_use]
    pub fn get_server(&self, id: &str) -> Option<McpServer> {
        let inner = self.read();
        inner.position(id).map(|index| inner.servers[index].clone())
    }

    /// Returns every registered server in registration order.
    #[must_use]
    pub fn list_servers(&self) -> Vec<McpServer> {
        self.read().servers.clone()
    }

    /// Returns the currently enabled servers in registration order.
    #[must_use]
    pub fn list_enabled_servers(&self) -> Vec<McpServer> {
        self.read().enabled().cloned().collect()
    }

    /// Returns the tools of all enabled servers, ordered by server
    /// registration and then by tool declaration.
    #[must_use]
    pub fn list_all_tools(&self) -> Vec<McpTool> {
        self.read()
            .enabled()
            .flat_map(|server| server.tools().iter().cloned())
            .collect()
    }

    /// Resolves a tool by bare name across enabled servers (first match).
    #[must_use]
    pub fn find_tool(&self, name: &str) -> Option<McpTool> {
        self.read()
            .enabled()
            .flat_map(McpServer::tools)
            .find(|tool| tool.name() == name)
            .cloned()
    }

    /// Resolves a tool on a specific enabled server.
    #[must_use]
    pub fn find_qualified_tool(&self, server_id: &str, name: &str) -> Option<McpTool> {
        self.read()
            .enabled()
            .find(|server| server.id().as_str() == server_id)
            .and_then(|server| server.tools().iter().find(|tool| tool.name() == name))
            .cloned()
    }

    /// Records a new runtime status for a registered server.
    ///
    /// Returns `false` when the server is unknown.
    pub fn update_server_status(
        &self,
        id: &str,
        status: ServerStatus,
        message: Option<String>,
    ) -> bool {
        let mut inner = self.write();
        let Some(index) = inner.position(id) else {
            return false;
        };
        let server_id = inner.servers[index].id().clone();
        debug!(server_id = id, ?status, "tool server status updated");
        inner.statuses.insert(
            server_id.clone(),
            ServerStatusInfo::new(server_id, status, message),
        );
        true
    }

    /// Returns the status record of a server.
    #[must_use]
    pub fn server_status(&self, id: &str) -> Option<ServerStatusInfo> {
        self.read()
            .statuses
            .iter()
            .find(|(key, _)| key.as_str() == id)
            .map(|(_, info)| info.clone())
    }

    /// Returns a compact summary of a server.
    #[must_use]
    pub fn server_summary(&self, id: &str) -> Option<ServerSummary> {
        let inner = self.read();
        inner
            .position(id)
            .map(|index| ServerSummary::from(&inner.servers[index]))
    }

    /// Builds the registry health report.
    #[must_use]
    pub fn health(&self) -> ServiceHealth {
        let inner = self.read();
        let enabled: Vec<_> = inner.enabled().collect();
        let total_tools: usize = enabled.iter().map(|server| server.tools().len()).sum();
        let servers: Vec<_> = enabled
            .iter()
            .map(|server| json!({"id": server.id(), "name": server.name()}))
            .collect();

        ServiceHealth::ok("McpService")
            .with_detail("enabledServers", enabled.len())
            .with_detail("totalTools", total_tools)
            .with_detail("servers", servers)
    }

    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };

        // Snapshot under the persist lock so the last write carries the
        // newest state.
        let _guard = self.persist.lock().await;
        let snapshot = self.list_servers();
        match store.save(&snapshot).await {
            Ok(()) => debug!(servers = snapshot.len(), "tool server registry persisted"),
            Err(err) => warn!(error = %err, "failed to persist tool server registry"),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn insert(inner: &mut RegistryInner, mut server: McpServer) {
    let corrected = server.adopt_tools();
    if corrected > 0 {
        debug!(
            server_id = %server.id(),
            corrected,
            "tool back-references rewritten to owning server"
        );
    }

    let id = server.id().clone();
    inner.statuses.insert(
        id.clone(),
        ServerStatusInfo::new(id.clone(), ServerStatus::Stopped, None),
    );

    match inner.position(id.as_str()) {
        Some(index) => {
            info!(server_id = %id, tools = server.tools().len(), "tool server replaced");
            inner.servers[index] = server;
        }
        None => {
            info!(server_id = %id, tools = server.tools().len(), "tool server added");
            inner.servers.push(server);
        }
    }
}

fn warn_on_collisions(inner: &RegistryInner, incoming: &McpServer) {
    if !incoming.enabled() {
        return;
    }

    for other in inner.enabled().filter(|other| other.id() != incoming.id()) {
        for tool in incoming.tools() {
            if other.tools().iter().any(|t| t.name() == tool.name()) {
                warn!(
                    tool = tool.name(),
                    server_id = %incoming.id(),
                    existing_server_id = %other.id(),
                    "tool name already exposed by another enabled server"
                );
            }
        }
    }
}
