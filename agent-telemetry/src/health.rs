//! Health reporting utilities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Coarse service status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// The service is answering requests.
    #[serde(rename = "OK")]
    Ok,
}

/// Health snapshot returned by a runtime service.
///
/// Service-specific fields are flattened next to `status` and `service`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    status: HealthStatus,
    service: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}

impl ServiceHealth {
    /// Creates a healthy report for the named service.
    #[must_use]
    pub fn ok(service: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Ok,
            service: service.into(),
            details: Map::new(),
        }
    }

    /// Adds a service-specific detail field.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> HealthStatus {
        self.status
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns a detail field by key.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}
