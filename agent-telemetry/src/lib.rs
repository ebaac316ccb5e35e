//! Observability utilities for the chat runtime.
//!
//! [`tracing_support`] installs the process-wide subscriber; [`health`] holds
//! the report types that services hand out for liveness checks.

#![warn(missing_docs, clippy::pedantic)]

pub mod health;
pub mod tracing_support;

pub use health::{HealthStatus, ServiceHealth};
pub use tracing_support::{TelemetryError, init_tracing};
