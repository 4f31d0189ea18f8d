// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Session` entity: identity, workspace ownership, pipeline stage
//! map, accumulated non-fatal errors, and a client metadata bag.

use crate::stage::StageMap;
use dh_core::error::{ErrorKind, Severity, ToolError};
use dh_core::ids::{SessionId, WorkspaceId};
use std::collections::BTreeMap;

/// A serializable summary of a [`ToolError`], retained on the session so
/// non-fatal errors survive a save/load round trip. `ToolError` itself
/// carries a `dyn Error` cause and is not `Serialize`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
    pub severity: Severity,
    pub tool: Option<String>,
    pub stage: Option<String>,
    pub occurred_at_ms: u64,
}

impl SessionError {
    pub fn from_tool_error(err: &ToolError, occurred_at_ms: u64) -> Self {
        Self {
            kind: err.kind,
            message: err.message.clone(),
            severity: err.severity,
            tool: err.tool.clone(),
            stage: err.stage.clone(),
            occurred_at_ms,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub expires_at_ms: u64,
    pub workspace_id: WorkspaceId,
    pub stages: StageMap,
    pub errors: Vec<SessionError>,
    pub metadata: BTreeMap<String, String>,
}

impl Session {
    pub fn new(id: SessionId, workspace_id: WorkspaceId, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            id,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            expires_at_ms: now_ms + ttl_ms,
            workspace_id,
            stages: StageMap::new(),
            errors: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }

    pub fn touch(&mut self, now_ms: u64, ttl_ms: u64) {
        // `updated` is monotone non-decreasing (spec §3); never move it backward.
        self.updated_at_ms = self.updated_at_ms.max(now_ms);
        self.expires_at_ms = now_ms + ttl_ms;
    }

    pub fn record_error(&mut self, err: &ToolError, now_ms: u64) {
        self.errors.push(SessionError::from_tool_error(err, now_ms));
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
