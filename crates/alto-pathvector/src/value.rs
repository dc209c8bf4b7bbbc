//! Interpretation of loosely typed broker property values.

use serde_json::Value;

/// Truthiness of a property value.
///
/// `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Reads an identifier (dpid, port) that may be stored as a string or a
/// number. Falsy values count as absent.
pub fn as_identifier(value: Option<&Value>) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
