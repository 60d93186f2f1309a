use serde_json::{Map, Value};

/// Shape of one decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// A JSON object: the `data` field, if any, plus every other field as metadata.
    Keyed {
        data: Option<Value>,
        meta: Map<String, Value>,
    },
    /// A bare JSON array of records.
    Sequence(Vec<Value>),
    /// Any other JSON value.
    Scalar(Value),
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(object) => {
                let mut data = None;
                let mut meta = Map::with_capacity(object.len());
                for (key, value) in object {
                    if key == "data" {
                        data = Some(value);
                    } else {
                        meta.insert(key, value);
                    }
                }
                RawResponse::Keyed { data, meta }
            }
            Value::Array(items) => RawResponse::Sequence(items),
            other => RawResponse::Scalar(other),
        }
    }
}

/// Loose truthiness: null, false, zero and the empty string are "absent".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
