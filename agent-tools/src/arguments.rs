//! Typed access to tool call arguments.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolResult};
use crate::schema::{PropertyType, ToolSchema};

/// Arguments of a single tool call.
///
/// The dispatcher checks them against the tool's schema with
/// [`ToolArguments::validate`] before a handler sees them. Handlers read values
/// through the typed accessors, which report absent or mistyped values as
/// [`ToolError::MissingArgument`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    /// Wraps a raw argument map without validation.
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Checks the arguments against `schema`.
    ///
    /// Required properties must be present and non-null. Declared properties
    /// must match their JSON type and, for enumerations, one of the allowed
    /// values. Undeclared arguments pass through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::MissingArgument`] or [`ToolError::InvalidArgument`]
    /// for the first violation found.
    pub fn validate(self, schema: &ToolSchema) -> ToolResult<Self> {
        for name in schema.required() {
            match self.values.get(name) {
                None | Some(Value::Null) => return Err(ToolError::missing(name.clone())),
                Some(_) => {}
            }
        }

        for (name, value) in &self.values {
            let Some(property) = schema.get(name) else {
                continue;
            };
            if value.is_null() && !schema.required().contains(name) {
                continue;
            }

            if !property.kind().accepts(value) {
                return Err(ToolError::InvalidArgument {
                    name: name.clone(),
                    expected: property.kind().to_string(),
                });
            }

            if let (Some(allowed), PropertyType::String) = (property.allowed(), property.kind()) {
                let matches = value
                    .as_str()
                    .is_some_and(|text| allowed.iter().any(|item| item == text));
                if !matches {
                    return Err(ToolError::InvalidArgument {
                        name: name.clone(),
                        expected: format!("one of [{}]", allowed.join(", ")),
                    });
                }
            }
        }

        Ok(self)
    }

    /// Returns the raw value of an argument.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns a string argument if present.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Returns an integer argument if present.
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    /// Returns a string argument or a "`<Name>` required" error.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::MissingArgument`] when the value is absent or not a
    /// string.
    pub fn require_str(&self, name: &str) -> ToolResult<&str> {
        self.str(name).ok_or_else(|| ToolError::missing(name))
    }

    /// Returns the number of supplied arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no arguments were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the wrapper and returns the raw map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for ToolArguments {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}
