//! Tool-augmented chat runtime facade.
//!
//! Depend on this crate via `cargo add mcp-chat`. It bundles the runtime
//! crates behind feature flags; the `bootstrap` feature adds [`bootstrap`],
//! which wires configuration, tracing, the tool registry and the chat
//! orchestrator into one [`bootstrap::Runtime`].

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use agent_primitives as primitives;

/// Chat orchestration (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use agent_kernel as kernel;

/// Completion model seam (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use agent_adapters as adapters;

/// Tool server registry and dispatch (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use agent_tools as tools;

/// Conversation storage (enabled by `memory` feature).
#[cfg(feature = "memory")]
pub use agent_memory as memory;

/// Tracing and health reporting (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use agent_telemetry as telemetry;

/// Configuration management (enabled by `config` feature).
#[cfg(feature = "config")]
pub use agent_config as config;

#[cfg(feature = "bootstrap")]
pub mod bootstrap;
