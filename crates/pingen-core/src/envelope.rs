//! Navigation helpers for untyped JSON:API envelopes
//!
//! Responses are kept as [`serde_json::Value`]. Missing keys and type
//! mismatches read as empty values instead of failing.

use serde_json::{Map, Value};

/// Safe accessors over a JSON:API document
pub trait Envelope {
    /// Follow `path` through nested objects, yielding `Value::Null` when absent
    fn at(&self, path: &[&str]) -> &Value;

    /// Render a value for plain-text output; null renders as an empty string
    fn text(&self) -> String;

    /// The string at `path`, or "" when absent or not a string
    fn str_at(&self, path: &[&str]) -> &str {
        self.at(path).as_str().unwrap_or("")
    }

    /// The `data` member
    fn data(&self) -> &Value {
        self.at(&["data"])
    }

    /// Entries of a collection `data` member; empty when not an array
    fn data_items(&self) -> &[Value] {
        self.data().as_array().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Envelope for Value {
    fn at(&self, path: &[&str]) -> &Value {
        path.iter().fold(self, |value, key| &value[*key])
    }

    fn text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() && f.fract() == 0.0 => format!("{:.0}", f),
                _ => n.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// An empty JSON object, the decoded form of an empty response body
pub fn empty_object() -> Value {
    Value::Object(Map::new())
}
