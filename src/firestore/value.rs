//! Firestore REST value decoding.
//!
//! The REST API and Eventarc payloads wrap every field in a one-key object
//! naming its type (`{"stringValue": "hi"}`, `{"integerValue": "3"}`, ...).
//! Robots only care about the plain value, so documents are flattened into
//! `serde_json::Value` on the way in.

use serde_json::{Map, Number, Value};

/// Decode a single typed Firestore value into plain JSON.
///
/// Unknown shapes decode to `Null`, which the field lookups treat as absent.
pub fn decode_value(typed: &Value) -> Value {
    let Some(obj) = typed.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => inner.as_bool().map(Value::Bool).unwrap_or(Value::Null),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

/// Decode a Firestore `fields` object into a plain JSON map.
pub fn decode_fields(fields: &Value) -> Map<String, Value> {
    fields
        .as_object()
        .map(|obj| {
            obj.iter()
                .map(|(name, typed)| (name.clone(), decode_value(typed)))
                .collect()
        })
        .unwrap_or_default()
}

// int64 travels as a decimal string
fn decode_integer(inner: &Value) -> Value {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or(Value::Null),
        Value::Number(n) => Value::Number(n.clone()),
        _ => Value::Null,
    }
}

fn decode_double(inner: &Value) -> Value {
    match inner {
        Value::Number(n) => Value::Number(n.clone()),
        // "NaN" / "Infinity" have no JSON number form
        Value::String(s) => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
