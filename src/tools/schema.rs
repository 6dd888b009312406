//! JSON-schema builder for tool parameters.

use serde::{Deserialize, Serialize};

/// JSON Schema object describing a tool's parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolParameters {
    pub schema: serde_json::Value,
}

impl ToolParameters {
    /// A tool that takes no parameters.
    pub fn empty() -> Self {
        Self::object().build()
    }

    /// Start an object schema.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder {
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }

    /// Names of the required properties.
    pub fn required(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(|v| v.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Builder for [`ToolParameters`].
pub struct ParameterBuilder {
    properties: serde_json::Map<String, serde_json::Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    fn property(
        mut self,
        name: &str,
        kind: &str,
        description: Option<&str>,
        required: bool,
    ) -> Self {
        let mut property = serde_json::json!({ "type": kind });
        if let Some(description) = description {
            property["description"] = serde_json::Value::from(description);
        }
        self.properties.insert(name.to_string(), property);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, "string", Some(description), required)
    }

    /// String property with no description.
    pub fn bare_string(self, name: &str, required: bool) -> Self {
        self.property(name, "string", None, required)
    }

    pub fn number(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, "number", Some(description), required)
    }

    pub fn boolean(self, name: &str, description: Option<&str>, required: bool) -> Self {
        self.property(name, "boolean", description, required)
    }

    pub fn build(self) -> ToolParameters {
        ToolParameters {
            schema: serde_json::json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }
}
