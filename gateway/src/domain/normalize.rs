//! Output normalizer: turns any [`DeviceValue`] into a JSON-safe value.
//!
//! Total by construction: values the JSON model cannot hold degrade to their
//! text form instead of failing.

use serde_json::{Map, Number, Value};

use crate::domain::value::DeviceValue;

/// Nesting depth beyond which a subtree is replaced by its summary.
pub const MAX_DEPTH: usize = 128;

/// Normalize a parser result into a `serde_json::Value`.
#[must_use]
pub fn normalize(value: &DeviceValue) -> Value {
    normalize_at(value, 0)
}

fn normalize_at(value: &DeviceValue, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::String(value.summary());
    }

    match value {
        DeviceValue::Null => Value::Null,
        DeviceValue::Bool(b) => Value::Bool(*b),
        DeviceValue::Int(i) => Value::from(*i),
        DeviceValue::UInt(u) => Value::from(*u),
        DeviceValue::Float(x) => {
            Number::from_f64(*x).map_or_else(|| Value::String(x.to_string()), Value::Number)
        }
        DeviceValue::Text(s) | DeviceValue::Opaque(s) => Value::String(s.clone()),
        DeviceValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), normalize_at(v, depth + 1)))
                .collect::<Map<String, Value>>(),
        ),
        DeviceValue::Seq(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize_at(item, depth + 1))
                .collect(),
        ),
        DeviceValue::Set(items) => {
            let mut out: Vec<Value> = items
                .iter()
                .map(|item| normalize_at(item, depth + 1))
                .collect();
            out.sort_by_cached_key(text_form);
            Value::Array(out)
        }
        DeviceValue::Object { attributes, .. } => Value::Object(
            attributes
                .iter()
                .map(|(k, v)| (k.clone(), normalize_at(v, depth + 1)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

/// Text form used to order set elements: strings bare, other values as
/// compact JSON.
#[must_use]
pub fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
