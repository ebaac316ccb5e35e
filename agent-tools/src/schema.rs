//! Input schemas attached to tools.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// JSON type a property is declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// UTF-8 string.
    String,
    /// Whole number.
    Integer,
    /// Any JSON number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
    /// Unrecognised type name; accepts any value.
    #[serde(other)]
    Any,
}

impl PropertyType {
    /// Returns `true` when `value` is an instance of this type.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        })
    }
}

/// Schema of a single tool argument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    kind: PropertyType,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    allowed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
}

impl PropertySchema {
    /// Creates a property of the given type.
    #[must_use]
    pub fn new(kind: PropertyType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            allowed: None,
            default: None,
        }
    }

    /// Shorthand for a string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::new(PropertyType::String, description)
    }

    /// Shorthand for an integer property.
    #[must_use]
    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(PropertyType::Integer, description)
    }

    /// Restricts a string property to the listed values.
    #[must_use]
    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Documents a default value. Defaults are informational only.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn kind(&self) -> PropertyType {
        self.kind
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the allowed values, if restricted.
    #[must_use]
    pub fn allowed(&self) -> Option<&[String]> {
        self.allowed.as_deref()
    }

    /// Returns the documented default.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Object schema describing the arguments a tool accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type", default = "object_type")]
    kind: String,
    #[serde(default)]
    properties: BTreeMap<String, PropertySchema>,
    #[serde(default, deserialize_with = "dedup_required")]
    required: Vec<String>,
}

impl Default for ToolSchema {
    fn default() -> Self {
        Self {
            kind: object_type(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

impl ToolSchema {
    /// Creates an empty object schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an optional property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Declares a required property.
    #[must_use]
    pub fn required_property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    /// Returns the schema type, normally `"object"`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the declared properties.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, PropertySchema> {
        &self.properties
    }

    /// Returns the schema of a single property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    /// Returns the required property names in declaration order.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }
}

fn object_type() -> String {
    "object".to_owned()
}

fn dedup_required<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    let mut seen = Vec::with_capacity(raw.len());
    for name in raw {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wire_schema() {
        let schema: ToolSchema = serde_json::from_value(json!({
            "properties": {
                "query": {"type": "string", "description": "search text"},
                "mode": {"type": "string", "description": "m", "enum": ["fast", "deep"]},
                "limit": {"type": "integer", "description": "max", "default": 5},
                "extra": {"type": "uuid", "description": "unknown type"}
            },
            "required": ["query", "query"]
        }))
        .unwrap();

        assert_eq!(schema.kind(), "object");
        assert_eq!(schema.required(), ["query"]);
        assert_eq!(schema.get("limit").unwrap().default_value(), Some(&json!(5)));
        assert_eq!(
            schema.get("mode").unwrap().allowed(),
            Some(&["fast".to_owned(), "deep".to_owned()][..])
        );
        assert_eq!(schema.get("extra").unwrap().kind(), PropertyType::Any);
    }

    #[test]
    fn integer_type_rejects_fractions() {
        assert!(PropertyType::Integer.accepts(&json!(3)));
        assert!(!PropertyType::Integer.accepts(&json!(3.5)));
        assert!(PropertyType::Number.accepts(&json!(3.5)));
    }

    #[test]
    fn builder_keeps_required_unique() {
        let schema = ToolSchema::new()
            .required_property("path", PropertySchema::string("file"))
            .required_property("path", PropertySchema::string("file again"));
        assert_eq!(schema.required(), ["path"]);
        assert_eq!(schema.get("path").unwrap().description(), "file again");
    }
}
