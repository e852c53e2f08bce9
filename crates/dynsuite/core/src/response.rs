// DynamicSuite
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! API request and response value objects

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const EMPTY_STATUS: &str = "EMPTY_RESPONSE";
pub const EMPTY_MESSAGE: &str = "Empty Response";

/// One API call: the target and its JSON data payload
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    package_id: String,
    api_id: String,
    data: Map<String, Value>,
}

impl Request {
    /// Non-object payloads are treated as empty
    pub fn new(package_id: impl Into<String>, api_id: impl Into<String>, data: Value) -> Self {
        let package_id = package_id.into();
        let api_id = api_id.into();
        let data = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                warn!("Request data for {}:{} is not an object ({}), ignoring it", package_id, api_id, type_name(&other));
                Map::new()
            }
        };
        Self { package_id, api_id, data }
    }

    /// Parse a raw request body; unparsable bodies become empty data
    pub fn from_body(package_id: impl Into<String>, api_id: impl Into<String>, body: &[u8]) -> Self {
        let data = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(body).unwrap_or_else(|e| {
                warn!("Unparsable API request body: {}", e);
                Value::Null
            })
        };
        Self::new(package_id, api_id, data)
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn api_id(&self) -> &str {
        &self.api_id
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The only shape an API ever answers with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Response {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl Response {
    pub fn new(status: impl Into<String>, message: impl Into<String>, data: Value) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
            data,
        }
    }

    /// The opaque failure answer
    pub fn empty() -> Self {
        Self::new(EMPTY_STATUS, EMPTY_MESSAGE, Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.status == EMPTY_STATUS
    }

    /// Validate an entry's return value
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Response> for Value {
    fn from(response: Response) -> Self {
        serde_json::json!({
            "status": response.status,
            "message": response.message,
            "data": response.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_response_wire_format() {
        let text = serde_json::to_string(&Response::empty()).unwrap();
        assert_eq!(text, r#"{"status":"EMPTY_RESPONSE","message":"Empty Response","data":null}"#);
    }

    #[test]
    fn test_from_value_accepts_well_formed_output() {
        let response = Response::from_value(json!({"status": "OK", "message": "pong"})).unwrap();
        assert_eq!(response, Response::new("OK", "pong", Value::Null));
    }

    #[test]
    fn test_from_value_rejects_malformed_output() {
        assert!(Response::from_value(json!("OK")).is_err());
        assert!(Response::from_value(json!({"status": 200, "message": "x"})).is_err());
        assert!(Response::from_value(json!({"status": "OK"})).is_err());
        assert!(Response::from_value(json!({"status": "OK", "message": "x", "extra": 1})).is_err());
    }

    #[test]
    fn test_request_body_parsing() {
        let request = Request::from_body("blog", "save", br#"{"title": "Hi"}"#);
        assert_eq!(request.get("title"), Some(&json!("Hi")));

        assert!(Request::from_body("blog", "save", b"").data().is_empty());
        assert!(Request::from_body("blog", "save", b"{broken").data().is_empty());
        assert!(Request::from_body("blog", "save", b"[1, 2]").data().is_empty());
    }
}
