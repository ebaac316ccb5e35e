//! Runtime assembly from configuration.

use std::path::Path;
use std::sync::Arc;

use agent_adapters::CompletionModel;
use agent_config::AppConfig;
use agent_kernel::ChatOrchestrator;
use agent_memory::{ConversationStore, InMemoryConversationStore};
use agent_telemetry::{ServiceHealth, init_tracing};
use agent_tools::builtin::default_servers;
use agent_tools::{JsonFileServerStore, ToolDispatcher, ToolRegistry};
use anyhow::{Context, Result};
use tracing::info;

/// Fully wired chat runtime.
#[derive(Debug, Clone)]
pub struct Runtime {
    config: AppConfig,
    registry: Arc<ToolRegistry>,
    dispatcher: Arc<ToolDispatcher>,
    chat: ChatOrchestrator,
}

impl Runtime {
    /// Returns the configuration the runtime was built from.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the tool server registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Returns the tool dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<ToolDispatcher> {
        &self.dispatcher
    }

    /// Returns the chat orchestrator.
    #[must_use]
    pub fn chat(&self) -> &ChatOrchestrator {
        &self.chat
    }

    /// Returns the health reports of every service.
    #[must_use]
    pub fn health(&self) -> Vec<ServiceHealth> {
        vec![self.registry.health(), self.chat.health()]
    }
}

/// Loads configuration, installs tracing and assembles the runtime.
///
/// # Errors
///
/// Returns an error when the configuration cannot be loaded or the tracing
/// subscriber cannot be installed.
pub async fn start(config_path: Option<&Path>, model: Arc<dyn CompletionModel>) -> Result<Runtime> {
    let config = AppConfig::load(config_path).context("failed to load configuration")?;
    init_tracing(&config.telemetry.log_filter).context("failed to initialise tracing")?;
    Ok(assemble(config, model).await)
}

/// Assembles the runtime from an already loaded configuration.
///
/// With tool servers disabled the registry stays empty and the server file
/// is never read or written.
pub async fn assemble(config: AppConfig, model: Arc<dyn CompletionModel>) -> Runtime {
    let registry = if config.mcp.enabled {
        let store = Arc::new(JsonFileServerStore::new(config.mcp.config_path.clone()));
        let registry = ToolRegistry::load(store).await;
        if config.mcp.seed_builtin_servers && registry.seed_if_empty(default_servers()).await {
            info!(path = %config.mcp.config_path.display(), "seeded built-in tool servers");
        }
        registry
    } else {
        info!("tool servers disabled");
        ToolRegistry::new()
    };
    let registry = Arc::new(registry);
    let provider = model.metadata().provider();

    let dispatcher = Arc::new(ToolDispatcher::with_builtin_handlers(Arc::clone(&registry)));
    let store: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new());
    let mut chat = ChatOrchestrator::new(model, store, Arc::clone(&dispatcher));
    if let Some(message) = &config.chat.fallback_message {
        chat = chat.with_fallback_message(message.clone());
    }

    info!(
        servers = registry.list_servers().len(),
        tools = registry.list_all_tools().len(),
        provider,
        "chat runtime ready"
    );

    Runtime {
        config,
        registry,
        dispatcher,
        chat,
    }
}
