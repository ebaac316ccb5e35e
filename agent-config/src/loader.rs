//! Configuration loader implementations.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::schema::AppConfig;

/// Overrides the registry file path.
pub const ENV_CONFIG_PATH: &str = "MCP_CHAT_CONFIG_PATH";
/// Overrides `mcp.enabled`.
pub const ENV_MCP_ENABLED: &str = "MCP_CHAT_MCP_ENABLED";
/// Overrides `telemetry.log_filter`.
pub const ENV_LOG: &str = "MCP_CHAT_LOG";

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`AppConfig`].
    #[error("failed to parse config: {source}")]
    Parse {
        /// Underlying TOML error.
        #[from]
        source: toml::de::Error,
    },

    /// An environment override carried an unusable value.
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidOverride {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Environment-derived overrides applied on top of file configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    config_path: Option<PathBuf>,
    mcp_enabled: Option<String>,
    log_filter: Option<String>,
}

impl EnvOverrides {
    /// Captures overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars())
    }

    /// Captures overrides from arbitrary key/value pairs.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut overrides = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                ENV_CONFIG_PATH => overrides.config_path = Some(PathBuf::from(value.into())),
                ENV_MCP_ENABLED => overrides.mcp_enabled = Some(value.into()),
                ENV_LOG => overrides.log_filter = Some(value.into()),
                _ => {}
            }
        }
        overrides
    }

    /// Applies the overrides to `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] when a boolean override cannot
    /// be parsed.
    pub fn apply(&self, config: &mut AppConfig) -> ConfigResult<()> {
        if let Some(path) = &self.config_path {
            debug!(path = %path.display(), "overriding mcp config path from environment");
            config.mcp.config_path.clone_from(path);
        }

        if let Some(raw) = &self.mcp_enabled {
            config.mcp.enabled = parse_bool(raw).ok_or_else(|| ConfigError::InvalidOverride {
                key: ENV_MCP_ENABLED,
                value: raw.clone(),
                reason: "expected true/false, 1/0, yes/no, or on/off",
            })?;
        }

        if let Some(filter) = &self.log_filter {
            config.telemetry.log_filter.clone_from(filter);
        }

        Ok(())
    }
}

impl AppConfig {
    /// Parses configuration from TOML text. Missing sections use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input or unknown keys.
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Reads configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads configuration from an optional file and the process environment.
    ///
    /// Without a file the defaults are used.
    ///
    /// # Errors
    ///
    /// Propagates file and override errors.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        Self::load_with(path, &EnvOverrides::from_env())
    }

    /// Loads configuration from an optional file and explicit overrides.
    ///
    /// # Errors
    ///
    /// Propagates file and override errors.
    pub fn load_with(path: Option<&Path>, overrides: &EnvOverrides) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        overrides.apply(&mut config)?;
        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config = AppConfig::from_toml_str("[chat]\nfallback_message = \"n/a\"\n").unwrap();
        assert_eq!(config.chat.fallback_message.as_deref(), Some("n/a"));
        assert_eq!(config.mcp.config_path, PathBuf::from("mcp-servers.json"));
        assert!(config.mcp.enabled);
        assert_eq!(config.telemetry.log_filter, "info");
    }

    #[test]
    fn fallback_message_is_unset_by_default() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert!(config.chat.fallback_message.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml_str("[mcp]\nconfig_file = \"x\"\n")
            .expect_err("unknown key should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[mcp]\nconfig_path = \"servers.json\"\nenabled = true").unwrap();

        let overrides = EnvOverrides::from_pairs([
            (ENV_CONFIG_PATH, "/tmp/other.json"),
            (ENV_MCP_ENABLED, "off"),
            (ENV_LOG, "debug"),
            ("UNRELATED", "ignored"),
        ]);

        let config = AppConfig::load_with(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.mcp.config_path, PathBuf::from("/tmp/other.json"));
        assert!(!config.mcp.enabled);
        assert_eq!(config.telemetry.log_filter, "debug");
    }

    #[test]
    fn invalid_boolean_override_errors() {
        let overrides = EnvOverrides::from_pairs([(ENV_MCP_ENABLED, "maybe")]);
        let err = AppConfig::load_with(None, &overrides).expect_err("bad bool");
        assert!(matches!(
            err,
            ConfigError::InvalidOverride { key, .. } if key == ENV_MCP_ENABLED
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::from_file("/definitely/not/here.toml").expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
