// ABOUTME: Query-string serialization for list parameters.
// ABOUTME: Drops null/empty values, repeats keys for arrays, percent-encodes everything.

use serde_json::Value;
use urlencoding::encode;

/// Serialize a JSON object into a query string without the leading `?`.
/// Null and empty-string values are dropped; arrays become repeated keys;
/// nested objects are carried as compact JSON text. Anything that is not an
/// object serializes to the empty string.
pub fn to_query(params: &Value) -> String {
    let Value::Object(map) = params else {
        return String::new();
    };

    let mut pairs: Vec<String> = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) if s.is_empty() => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push(pair(key, &text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push(pair(key, &text));
                }
            }
        }
    }
    pairs.join("&")
}

/// Append a serialized parameter set to an endpoint path. An empty parameter
/// set yields the path untouched — no trailing `?`.
pub fn with_query(path: &str, params: Option<&Value>) -> String {
    let query = params.map(to_query).unwrap_or_default();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

fn pair(key: &str, value: &str) -> String {
    format!("{}={}", encode(key), encode(value))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
