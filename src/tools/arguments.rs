//! Lenient access to model-supplied tool arguments.
//!
//! The model does not always honor the declared schema, so lookups never
//! fail on a malformed value: they report it as absent and the caller falls
//! back to its default.

use super::error::ToolError;

#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    /// Wrap raw arguments. A JSON-encoded string is decoded first; anything
    /// that is not an object afterwards is treated as no arguments.
    pub fn new(value: serde_json::Value) -> Self {
        let value = match value {
            serde_json::Value::String(raw) => {
                serde_json::from_str(raw.trim()).unwrap_or(serde_json::Value::Null)
            }
            other => other,
        };
        let value = if value.is_object() {
            value
        } else {
            serde_json::json!({})
        };
        Self { value }
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// String argument; empty or whitespace-only strings count as absent.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// String argument kept verbatim, so `""` clears a stored value.
    pub fn verbatim_text(&self, key: &str) -> Option<String> {
        self.value.get(key)?.as_str().map(str::to_string)
    }

    /// Owned copy of [`Self::text`].
    pub fn text_owned(&self, key: &str) -> Option<String> {
        self.text(key).map(str::to_string)
    }

    /// String argument that must be present.
    pub fn require_text(&self, key: &str) -> Result<String, ToolError> {
        self.text_owned(key).ok_or_else(|| ToolError::missing(key))
    }

    /// Numeric argument. Numeric strings ("4") are accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.value.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|n: &f64| n.is_finite())
    }

    /// Number rounded and clamped into `min..=max`.
    pub fn clamped(&self, key: &str, min: u32, max: u32) -> Option<u32> {
        self.number(key)
            .map(|n| n.round().clamp(f64::from(min), f64::from(max)) as u32)
    }

    /// Non-negative whole number.
    pub fn count(&self, key: &str) -> Option<u32> {
        self.clamped(key, 0, u32::MAX)
    }

    /// Boolean argument. "true"/"false" strings are accepted.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.value.get(key)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
