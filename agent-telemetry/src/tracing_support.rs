//! Structured tracing helpers.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {source}")]
    InvalidFilter {
        /// Directive that failed to parse.
        directive: String,
        /// Source parse error.
        #[source]
        source: ParseError,
    },

    /// A global subscriber was already installed.
    #[error("tracing subscriber already initialised: {reason}")]
    AlreadyInitialised {
        /// Message reported by the subscriber registry.
        reason: String,
    },
}

/// Builds the filter used by [`init_tracing`].
///
/// `RUST_LOG` wins over the configured directive when it is set.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the configured directive is
/// malformed.
pub fn build_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(directive).map_err(|source| TelemetryError::InvalidFilter {
        directive: directive.to_owned(),
        source,
    })
}

/// Installs a `fmt` subscriber filtered by `directive`.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the directive is invalid or a subscriber
/// is already installed for the process.
pub fn init_tracing(directive: &str) -> Result<(), TelemetryError> {
    let filter = build_filter(directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInitialised {
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directive() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = build_filter("agent_tools=loud").expect_err("malformed directive");
        assert!(matches!(err, TelemetryError::InvalidFilter { .. }));
    }

    #[test]
    fn accepts_module_directives() {
        assert!(build_filter("info,agent_tools=debug").is_ok());
    }
}
