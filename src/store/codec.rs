//! Conversion between Firestore's typed REST values and plain JSON.

use serde_json::{json, Map, Number, Value};

use super::{Document, StoreError, StoreResult};

/// Decode one Firestore `Value` (`{"stringValue": "x"}` etc.) into JSON.
pub fn decode_value(value: &Value) -> StoreResult<Value> {
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("expected typed value, got {}", value)))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| StoreError::Decode("empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            Ok(inner.clone())
        }
        "integerValue" => {
            // int64 is sent as a string
            let n = match inner {
                Value::String(s) => s
                    .parse::<i64>()
                    .map_err(|e| StoreError::Decode(format!("bad integerValue {}: {}", s, e)))?,
                Value::Number(n) => n
                    .as_i64()
                    .ok_or_else(|| StoreError::Decode(format!("bad integerValue {}", n)))?,
                other => return Err(StoreError::Decode(format!("bad integerValue {}", other))),
            };
            Ok(Value::Number(n.into()))
        }
        "doubleValue" => match inner {
            Value::Number(_) => Ok(inner.clone()),
            // NaN and infinities arrive as strings and have no JSON form
            _ => Ok(Value::Null),
        },
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => {
            let values = match inner.get("values").and_then(Value::as_array) {
                Some(values) => values.iter().map(decode_value).collect::<StoreResult<Vec<_>>>()?,
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = inner.get("fields").cloned().unwrap_or_else(|| json!({}));
            Ok(Value::Object(decode_fields(&fields)?))
        }
        other => Err(StoreError::Decode(format!("unknown value type {}", other))),
    }
}

pub fn decode_fields(fields: &Value) -> StoreResult<Map<String, Value>> {
    let Some(fields) = fields.as_object() else {
        return Err(StoreError::Decode("fields must be an object".to_string()));
    };
    fields
        .iter()
        .map(|(k, v)| decode_value(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}

/// Encode plain JSON as a Firestore typed value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => encode_number(n),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn encode_number(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => json!({ "integerValue": i.to_string() }),
        None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
    }
}

pub fn encode_fields(map: &Map<String, Value>) -> Value {
    let fields: Map<String, Value> = map
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    Value::Object(fields)
}

/// Decode a REST `Document` resource; the id is the last path segment of `name`.
pub fn decode_document(doc: &Value) -> StoreResult<Document> {
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Decode("document without name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    let fields = match doc.get("fields") {
        Some(fields) => decode_fields(fields)?,
        None => Map::new(),
    };
    let update_time = doc
        .get("updateTime")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Document { id, fields, update_time })
}
