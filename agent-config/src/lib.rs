//! Configuration management for the chat runtime.
//!
//! [`schema`] defines the strongly typed settings and their defaults;
//! [`loader`] reads them from TOML and applies environment overrides.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigResult, EnvOverrides};
pub use schema::{AppConfig, ChatSettings, McpSettings, TelemetrySettings};
