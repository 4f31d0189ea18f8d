// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detail payloads referenced by [`crate::Response`]. Kept as plain DTOs
//! distinct from the substrate's own `Session`/`JobRecord` types so this
//! crate never has to depend on `dh-session` or `dh-engine` — the daemon
//! builds these at the boundary.

use serde::{Deserialize, Serialize};

/// One entry of a `tools/list` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolListEntry {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
    pub result_schema: serde_json::Value,
}

/// Completion state of the ten containerize-pipeline stages for one
/// session, in pipeline order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageEntry {
    pub stage: String,
    pub done: bool,
}

/// Listing-friendly view of a session (`sessions/list`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub expires_at_ms: u64,
    pub stages_done: usize,
    pub error_count: usize,
}

/// Full detail view of a session (`sessions/get`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionDetail {
    pub id: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub expires_at_ms: u64,
    pub workspace_id: String,
    pub stages: Vec<StageEntry>,
    pub errors: Vec<SessionErrorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionErrorEntry {
    pub kind: String,
    pub message: String,
    pub stage: Option<String>,
    pub occurred_at_ms: u64,
}

/// `jobs/status` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStatusBody {
    pub job_id: String,
    pub tool_name: String,
    pub status: String,
    pub submitted_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<crate::error::RpcError>,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
