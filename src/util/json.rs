use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum JsonObjectError {
    #[error("response is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("response is JSON but not an object (found {0})")]
    NotAnObject(&'static str),
}

/// 応答テキスト全体を単一のJSONオブジェクトとして解釈する。
pub(crate) fn parse_json_object(payload: &str) -> Result<Map<String, Value>, JsonObjectError> {
    match serde_json::from_str::<Value>(payload.trim())? {
        Value::Object(map) => Ok(map),
        other => Err(JsonObjectError::NotAnObject(json_type_name(&other))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
