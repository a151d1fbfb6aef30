//! RPC message framing
//!
//! One JSON object per message, shared by every transport:
//!
//! - **Request**  `{"id": "<uuid>", "pattern": "<cmd>" | {"cmd": "<cmd>"}, "data": <payload>}`
//! - **Success**  `{"id": "<uuid>", "response": <payload>, "isDisposed": true}`
//! - **Failure**  `{"id": "<uuid>", "err": {"status": 400, "message": "..."}, "isDisposed": true}`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::error::RpcError;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("pattern must be a string or an object with a string \"cmd\"")]
    InvalidPattern,
}

// ── Request ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub pattern: Value,
    #[serde(default)]
    pub data: Value,
}

impl RpcRequest {
    pub fn new(id: impl Into<String>, pattern: &str, data: Value) -> Self {
        Self {
            id: Some(id.into()),
            pattern: Value::String(pattern.to_string()),
            data,
        }
    }

    /// Parse a raw JSON text into a request.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, FrameError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The command name, whichever pattern form the caller used.
    ///
    /// A string holding a serialized `{"cmd": ...}` object is unwrapped too.
    pub fn pattern_name(&self) -> Result<String, FrameError> {
        match &self.pattern {
            Value::String(s) if s.trim_start().starts_with('{') => {
                let inner: Value = serde_json::from_str(s)?;
                cmd_of(&inner)
            }
            Value::String(s) => Ok(s.clone()),
            other => cmd_of(other),
        }
    }
}

fn cmd_of(value: &Value) -> Result<String, FrameError> {
    value
        .get("cmd")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(FrameError::InvalidPattern)
}

// ── Response ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<RpcError>,
    #[serde(rename = "isDisposed", default)]
    pub is_disposed: bool,
}

impl RpcResponse {
    pub fn ok(id: Option<String>, payload: Value) -> Self {
        Self {
            id,
            response: Some(payload),
            err: None,
            is_disposed: true,
        }
    }

    pub fn error(id: Option<String>, err: RpcError) -> Self {
        Self {
            id,
            response: None,
            err: Some(err),
            is_disposed: true,
        }
    }

    pub fn from_result(id: Option<String>, result: Result<Value, RpcError>) -> Self {
        match result {
            Ok(payload) => Self::ok(id, payload),
            Err(err) => Self::error(id, err),
        }
    }

    pub fn parse(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, FrameError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize this frame to a JSON string.
    pub fn serialize(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match (self.err, self.response) {
            (Some(err), _) => Err(err),
            (None, payload) => Ok(payload.unwrap_or(Value::Null)),
        }
    }
}
