//! Conversion between plain JSON and Firestore's typed value encoding
//! (`{"stringValue": "..."}`, `{"mapValue": {"fields": {...}}}`, ...).
//!
//! Timestamps, references and bytes decode to strings; integers decode to
//! JSON numbers.

use serde_json::{json, Map, Number, Value};

use crate::{DocumentError, DocumentResult};

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

pub fn decode_value(value: &Value) -> DocumentResult<Value> {
    let Some(obj) = value.as_object() else {
        return Err(DocumentError::decode(format!("expected typed value object, got {value}")));
    };

    let Some((kind, inner)) = obj.iter().next() else {
        return Err(DocumentError::decode("empty typed value"));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| DocumentError::decode("booleanValue is not a bool")),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| Value::Number(Number::from(i)))
                .ok_or_else(|| DocumentError::decode(format!("bad integerValue {inner}")))
        }
        "doubleValue" => match inner {
            // Non-finite doubles arrive as strings and have no JSON number form.
            Value::String(s) if matches!(s.as_str(), "NaN" | "Infinity" | "-Infinity") => {
                Ok(Value::String(s.clone()))
            }
            _ => inner
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| DocumentError::decode(format!("bad doubleValue {inner}"))),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| DocumentError::decode(format!("{kind} is not a string"))),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner.get("values").and_then(Value::as_array);
            let decoded = values
                .map(|vs| vs.iter().map(decode_value).collect::<DocumentResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(decoded))
        }
        "mapValue" => match inner.get("fields") {
            Some(fields) => decode_fields(fields).map(Value::Object),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(DocumentError::decode(format!("unsupported value type '{other}'"))),
    }
}

pub fn decode_fields(fields: &Value) -> DocumentResult<Map<String, Value>> {
    let Some(map) = fields.as_object() else {
        return Err(DocumentError::decode("fields is not an object"));
    };

    map.iter()
        .map(|(k, v)| decode_value(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}
