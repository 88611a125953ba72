//! JSON response decoding.
//!
//! Bodies are decoded in two stages: first into a generic JSON object (any
//! failure there is a `Decode` error), then into the step's DTO. Keeping the
//! object around lets a step fall back to the service's
//! `status_code`/`status_message` envelope when its expected field is absent.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::HandshakeError;
use crate::types::ServiceStatus;

/// A decoded top-level JSON object.
pub type JsonObject = Map<String, Value>;

/// Decode `bytes` as a JSON object. Never partially decodes.
pub fn decode_object(bytes: &[u8]) -> Result<JsonObject, HandshakeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| HandshakeError::Decode(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(HandshakeError::Decode(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Deserialize a decoded object into `T`, or `None` if it does not fit.
pub fn extract<T: DeserializeOwned>(object: &JsonObject) -> Option<T> {
    serde_json::from_value(Value::Object(object.clone())).ok()
}

/// The service's error envelope, if the object carries a `status_code`.
pub fn status_of(object: &JsonObject) -> Option<ServiceStatus> {
    object.get("status_code").and_then(Value::as_i64)?;
    extract(object)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
