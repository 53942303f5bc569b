//! Response body decoding.
//!
//! The API is not consistent about wrapping: ids and statuses arrive either
//! bare or inside an object.

use serde_json::Value;
use wayfarer_client::RunStatus;

/// Pull an id out of a bare string or the first matching key of an object.
pub(crate) fn extract_id(body: &Value, keys: &[&str]) -> Option<String> {
  match body {
    Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
    Value::Object(map) => keys
      .iter()
      .find_map(|key| map.get(*key).and_then(Value::as_str))
      .filter(|id| !id.trim().is_empty())
      .map(|id| id.trim().to_string()),
    _ => None,
  }
}

/// Read a run status from `"running"` or `{"status": "running"}`.
pub(crate) fn extract_status(body: &Value) -> Option<RunStatus> {
  match body {
    Value::String(raw) => Some(RunStatus::parse(raw)),
    Value::Object(map) => map.get("status").and_then(Value::as_str).map(RunStatus::parse),
    _ => None,
  }
}

/// Unwrap `{"result": ...}`; anything else is returned as is.
pub(crate) fn extract_result(body: Value) -> Value {
  match body {
    Value::Object(mut map) if map.contains_key("result") => map.remove("result").unwrap_or(Value::Null),
    other => other,
  }
}

/// Best-effort error message from an error response body.
pub(crate) fn error_message(body: &str, fallback: &str) -> String {
  if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
    for key in ["error", "message", "detail"] {
      if let Some(message) = map.get(key).and_then(Value::as_str) {
        return message.to_string();
      }
    }
  }

  let body = body.trim();
  if body.is_empty() {
    fallback.to_string()
  } else {
    body.to_string()
  }
}
