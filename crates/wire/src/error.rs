// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `{code, message, data}` error triple carried on the wire (spec
//! §6). Negative codes are reserved for protocol-level failures this
//! crate raises itself (bad framing, unknown method); positive codes
//! come straight from [`dh_core::error::ErrorKind::wire_code`].

use dh_core::error::ToolError;
use serde::{Deserialize, Serialize};

/// A protocol-level failure, not tied to any tool's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
}

impl ProtocolErrorCode {
    pub const fn code(self) -> i64 {
        match self {
            ProtocolErrorCode::ParseError => -32700,
            ProtocolErrorCode::InvalidRequest => -32600,
            ProtocolErrorCode::MethodNotFound => -32601,
            ProtocolErrorCode::InvalidParams => -32602,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn protocol(code: ProtocolErrorCode, message: impl Into<String>) -> Self {
        Self { code: code.code(), message: message.into(), data: None }
    }
}

impl From<&ToolError> for RpcError {
    fn from(err: &ToolError) -> Self {
        let mut data = serde_json::Map::new();
        data.insert("kind".to_string(), serde_json::Value::String(err.kind.as_str().to_string()));
        data.insert("retryable".to_string(), serde_json::Value::Bool(err.retryable));
        if let Some(tool) = &err.tool {
            data.insert("tool".to_string(), serde_json::Value::String(tool.clone()));
        }
        if let Some(stage) = &err.stage {
            data.insert("stage".to_string(), serde_json::Value::String(stage.clone()));
        }
        if let Some(session_id) = &err.session_id {
            data.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        if !err.suggestions.is_empty() {
            data.insert(
                "suggestions".to_string(),
                serde_json::Value::Array(
                    err.suggestions.iter().cloned().map(serde_json::Value::String).collect(),
                ),
            );
        }
        Self { code: err.kind.wire_code(), message: err.message.clone(), data: Some(data.into()) }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
