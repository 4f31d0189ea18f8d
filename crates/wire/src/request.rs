// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound JSON-RPC-style requests (spec §6): `{id, method, params}` with
//! `method` one of the fixed set of recognized names.

use serde::{Deserialize, Serialize};

/// A single request envelope. `id` is echoed back verbatim on the
/// matching [`crate::Response`] so callers can pipeline requests over
/// one connection without waiting for each reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub id: String,
    #[serde(flatten)]
    pub method: Method,
}

impl Request {
    pub fn new(id: impl Into<String>, method: Method) -> Self {
        Self { id: id.into(), method }
    }
}

/// The fixed method set recognized at the boundary (spec §6). Adjacently
/// tagged on `method`/`params` so the wire shape matches conventional
/// JSON-RPC rather than the internally-tagged style used elsewhere in
/// this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", content = "params")]
pub enum Method {
    #[serde(rename = "tools/list")]
    ToolsList,

    #[serde(rename = "tools/call")]
    ToolsCall {
        name: String,
        arguments: serde_json::Value,
        #[serde(default)]
        session_id: Option<String>,
    },

    #[serde(rename = "sessions/list")]
    SessionsList,

    #[serde(rename = "sessions/get")]
    SessionsGet { id: String },

    #[serde(rename = "sessions/delete")]
    SessionsDelete { id: String },

    #[serde(rename = "jobs/status")]
    JobsStatus { job_id: String },

    #[serde(rename = "server/status")]
    ServerStatus,
}

impl Method {
    /// The bare method name, for logging and metrics labels.
    pub const fn name(&self) -> &'static str {
        match self {
            Method::ToolsList => "tools/list",
            Method::ToolsCall { .. } => "tools/call",
            Method::SessionsList => "sessions/list",
            Method::SessionsGet { .. } => "sessions/get",
            Method::SessionsDelete { .. } => "sessions/delete",
            Method::JobsStatus { .. } => "jobs/status",
            Method::ServerStatus => "server/status",
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
