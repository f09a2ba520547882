//! Value coercion keyed by declared field type
//!
//! Raw values arrive loosely typed (form posts, JSON bodies, defaults written
//! by hand). Every value that enters or leaves a section passes through
//! [`coerce`], so a field is always observed with the same JSON type.
//!
//! | Type      | Rule                                                                 |
//! |-----------|----------------------------------------------------------------------|
//! | `boolean` | `null`, `false`, `0`, `""`, `"0"`, `[]`, `{}` are false; all else true |
//! | `integer` | numbers truncate; strings parse (int, then float); otherwise `0`     |
//! | `string`  | `true` → `"1"`, `false`/`null` → `""`, numbers print, containers → JSON |
//! | `array`   | arrays kept; `null`/`""` → `[]`; anything else wrapped               |

use crate::config::FieldType;
use serde_json::Value;

/// Coerce `value` to the JSON shape of `field_type`.
#[must_use]
pub fn coerce(value: &Value, field_type: FieldType) -> Value {
    match field_type {
        FieldType::Boolean => Value::Bool(to_bool(value)),
        FieldType::Integer => Value::from(to_integer(value)),
        FieldType::String => Value::String(to_text(value)),
        FieldType::Array => Value::Array(to_array(value)),
    }
}

/// Truthiness of a loosely typed value.
#[must_use]
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Integer form of a loosely typed value. Non-numeric input yields `0`.
#[must_use]
pub fn to_integer(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(truncate))
            .unwrap_or(0),
        Value::String(s) => parse_integer(s),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
    }
}

/// String form of a loosely typed value.
#[must_use]
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// List form of a loosely typed value.
#[must_use]
pub fn to_array(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        Value::String(s) if s.is_empty() => Vec::new(),
        other => vec![other.clone()],
    }
}

/// List of strings, each element coerced with [`to_text`].
#[must_use]
pub fn to_string_list(value: &Value) -> Vec<String> {
    to_array(value).iter().map(to_text).collect()
}

fn parse_integer(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return n;
    }
    trimmed.parse::<f64>().map(truncate).unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(f: f64) -> i64 {
    if f.is_finite() { f.trunc() as i64 } else { 0 }
}
