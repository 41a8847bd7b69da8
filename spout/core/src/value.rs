//! Helpers for the JSON values passed to handlers.

use serde_json::{Map, Value};

/// Literal some runtimes write into the environment for an unset value
pub const UNDEFINED_SENTINEL: &str = "undefined";

pub fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Interpret an environment-style input as a handler argument.
///
/// Absent, empty and `"undefined"` inputs become `{}`. Text that parses as
/// JSON becomes that value; anything else is passed through as a JSON string.
pub fn env_value(raw: Option<&str>) -> Value {
    match raw {
        None => empty_object(),
        Some(text) if matches!(text.trim(), "" | UNDEFINED_SENTINEL) => empty_object(),
        Some(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
    }
}
