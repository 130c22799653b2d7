//! JSON-RPC 2.0 types.
//!
//! Incoming bodies go through [`JsonRpcRequest::parse`], which never panics and
//! always yields something the dispatcher can answer: either a request or an
//! [`EnvelopeError`] carrying the best id it could recover.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::fmt;

use crate::error::{ErrorKind, McpError};

/// JSON-RPC version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC version type (always "2.0")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "Invalid JSON-RPC version: expected '{}', got '{}'",
                JSONRPC_VERSION, version
            )))
        }
    }
}

/// Request identifier.
///
/// Numbers keep their original [`serde_json::Number`] representation so they
/// are echoed back exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String identifier
    String(String),
    /// Numeric identifier
    Number(Number),
    /// Explicit `null`, also used when no id could be recovered
    Null,
}

impl RequestId {
    /// Recover an id from an arbitrary JSON value, if it has a legal id type.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::Null => Some(Self::Null),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for RequestId {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

/// JSON-RPC request message.
///
/// `id` is `None` only when the member is absent (a notification); an explicit
/// `null` id deserializes to `Some(RequestId::Null)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Request method name
    pub method: String,
    /// Request parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request identifier
    #[serde(
        default,
        deserialize_with = "deserialize_present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RequestId>,
}

fn deserialize_present_id<'de, D>(deserializer: D) -> Result<Option<RequestId>, D::Error>
where
    D: Deserializer<'de>,
{
    RequestId::deserialize(deserializer).map(Some)
}

/// A body that could not be turned into a [`JsonRpcRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeError {
    /// Id to answer with (`null` when none could be recovered)
    pub id: RequestId,
    /// Parse or invalid-request error
    pub error: McpError,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>, id: impl Into<RequestId>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
            id: Some(id.into()),
        }
    }

    /// Parse a raw request body.
    ///
    /// Invalid JSON yields a parse error with a `null` id. Well-formed JSON that
    /// is not a single 2.0 request object yields an invalid-request error with
    /// the request's id when it has a legal type.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError`] for bodies that cannot be dispatched.
    pub fn parse(body: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_slice(body).map_err(|e| EnvelopeError {
            id: RequestId::Null,
            error: McpError::parse_error(format!("Parse error: {e}")),
        })?;

        let Value::Object(object) = &value else {
            let what = if value.is_array() {
                "Batch requests are not supported"
            } else {
                "Request must be a JSON object"
            };
            return Err(EnvelopeError {
                id: RequestId::Null,
                error: McpError::invalid_request(what),
            });
        };

        let recovered_id = object
            .get("id")
            .and_then(RequestId::from_value)
            .unwrap_or(RequestId::Null);

        // `"params": null` reads as absent
        if let Some(params) = object.get("params")
            && !(params.is_null() || params.is_object() || params.is_array())
        {
            return Err(EnvelopeError {
                id: recovered_id,
                error: McpError::invalid_request("params must be an object or an array"),
            });
        }

        serde_json::from_value(value).map_err(|e| EnvelopeError {
            id: recovered_id,
            error: McpError::invalid_request(format!("Invalid Request: {e}")),
        })
    }

    /// Whether this request expects no response
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new error
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        match err.kind {
            // Message stays the bare kind so clients can match on it
            ErrorKind::Forbidden => Self {
                code: err.jsonrpc_code(),
                message: ErrorKind::Forbidden.description().to_string(),
                data: Some(serde_json::json!({ "detail": err.message })),
            },
            _ => Self::new(err.jsonrpc_code(), err.message),
        }
    }
}

/// JSON-RPC response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponsePayload {
    /// Successful response
    Success {
        /// Response result
        result: Value,
    },
    /// Error response
    Error {
        /// Response error
        error: JsonRpcError,
    },
}

/// JSON-RPC response message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Response ID, always the request's id
    pub id: RequestId,
    /// Response payload
    #[serde(flatten)]
    pub payload: JsonRpcResponsePayload,
}

impl JsonRpcResponse {
    /// Create a success response
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            payload: JsonRpcResponsePayload::Success { result },
        }
    }

    /// Create an error response
    #[must_use]
    pub fn error(id: RequestId, error: impl Into<JsonRpcError>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            payload: JsonRpcResponsePayload::Error {
                error: error.into(),
            },
        }
    }

    /// Get the result if success
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            JsonRpcResponsePayload::Success { result } => Some(result),
            JsonRpcResponsePayload::Error { .. } => None,
        }
    }

    /// Get the error if error
    #[must_use]
    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.payload {
            JsonRpcResponsePayload::Success { .. } => None,
            JsonRpcResponsePayload::Error { error } => Some(error),
        }
    }
}

impl From<EnvelopeError> for JsonRpcResponse {
    fn from(err: EnvelopeError) -> Self {
        Self::error(err.id, err.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_request_with_numeric_id() {
        let req = JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#).unwrap();
        assert_eq!(req.method, "ping");
        assert_eq!(req.id, Some(RequestId::from(7)));
        assert!(req.params.is_none());
    }

    #[test]
    fn test_parse_distinguishes_null_id_from_notification() {
        let with_null =
            JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert_eq!(with_null.id, Some(RequestId::Null));
        assert!(!with_null.is_notification());

        let notification =
            JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(notification.is_notification());
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = JsonRpcRequest::parse(b"{not json").unwrap_err();
        assert_eq!(err.id, RequestId::Null);
        assert_eq!(err.error.kind, ErrorKind::ParseError);
    }

    #[test]
    fn test_parse_wrong_version_keeps_id() {
        let err =
            JsonRpcRequest::parse(br#"{"jsonrpc":"1.0","id":"abc","method":"ping"}"#).unwrap_err();
        assert_eq!(err.id, RequestId::from("abc"));
        assert_eq!(err.error.kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_parse_rejects_non_string_method() {
        let err = JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","id":1,"method":42}"#).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::InvalidRequest);
        assert_eq!(err.id, RequestId::from(1));
    }

    #[test]
    fn test_parse_rejects_illegal_id_type() {
        let err =
            JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","id":{"x":1},"method":"ping"}"#).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::InvalidRequest);
        assert_eq!(err.id, RequestId::Null);
    }

    #[test]
    fn test_parse_rejects_batch_and_scalar_params() {
        let err = JsonRpcRequest::parse(br#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#)
            .unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::InvalidRequest);

        let err = JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","id":2,"method":"ping","params":5}"#)
            .unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::InvalidRequest);
        assert_eq!(err.id, RequestId::from(2));
    }

    #[test]
    fn test_parse_null_params_as_absent() {
        let req = JsonRpcRequest::parse(
            br#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":null}"#,
        )
        .unwrap();
        assert_eq!(req.method, "tools/list");
        assert_eq!(req.id, Some(RequestId::from(1)));
        assert!(req.params.is_none());
    }

    #[test]
    fn test_response_echoes_ids_verbatim() {
        for id in [json!("req-1"), json!(42), json!(1.5), json!(null)] {
            let request_id = RequestId::from_value(&id).unwrap();
            let response = JsonRpcResponse::success(request_id, json!({}));
            let wire = serde_json::to_value(&response).unwrap();
            assert_eq!(wire["id"], id);
            assert_eq!(wire["jsonrpc"], "2.0");
        }
    }

    #[test]
    fn test_response_has_result_xor_error() {
        let ok = serde_json::to_value(JsonRpcResponse::success(1.into(), json!({"a": 1}))).unwrap();
        assert!(ok.get("result").is_some());
        assert!(ok.get("error").is_none());

        let err = serde_json::to_value(JsonRpcResponse::error(
            1.into(),
            McpError::method_not_found("nope"),
        ))
        .unwrap();
        assert!(err.get("result").is_none());
        assert_eq!(err["error"]["code"], -32601);
    }

    #[test]
    fn test_forbidden_carries_detail() {
        let error = JsonRpcError::from(McpError::forbidden(
            "Insufficient permissions for tool execution",
        ));
        assert_eq!(error.code, -32001);
        assert_eq!(error.message, "Forbidden");
        assert_eq!(
            error.data,
            Some(json!({"detail": "Insufficient permissions for tool execution"}))
        );
    }

    mod id_echo {
        use super::*;
        use proptest::prelude::*;

        fn id_strategy() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<String>().prop_map(Value::from),
                any::<i64>().prop_map(Value::from),
                Just(Value::Null),
            ]
        }

        proptest! {
            #[test]
            fn response_echoes_request_id(id in id_strategy()) {
                let body = json!({"jsonrpc": "2.0", "id": id, "method": "ping"}).to_string();
                let request = JsonRpcRequest::parse(body.as_bytes()).unwrap();
                let response = JsonRpcResponse::success(request.id.unwrap(), json!({}));
                let wire = serde_json::to_value(&response).unwrap();
                prop_assert_eq!(&wire["id"], &id);
            }
        }
    }
}
