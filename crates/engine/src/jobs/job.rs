// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job specs and the state snapshot returned by `Get` (§4.4).

use super::ring_buffer::RingBuffer;
use crate::descriptor::CallContext;
use dh_core::error::ToolError;
use dh_core::ids::JobId;
use std::time::Duration;

pub const DEFAULT_LOG_CAPACITY: usize = 200;

/// What the caller asked to run. Carried alongside its `JobId` from
/// `Submit` through to the worker that eventually executes it.
#[derive(Clone)]
pub struct JobSpec {
    pub ctx: CallContext,
    pub args: serde_json::Value,
    /// The job's own deadline; the worker composes this with the
    /// manager-level ceiling and uses whichever is shorter.
    pub deadline: Option<Duration>,
}

impl JobSpec {
    pub fn new(ctx: CallContext, args: serde_json::Value) -> Self {
        Self { ctx, args, deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

/// A point-in-time snapshot of a job's state, as returned by `Get`.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub tool_name: String,
    pub status: JobStatus,
    pub submitted_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    pub result: Option<serde_json::Value>,
    pub error: Option<ToolError>,
    pub logs: RingBuffer,
}

impl JobRecord {
    pub(super) fn new(id: JobId, tool_name: String, submitted_at_ms: u64) -> Self {
        Self {
            id,
            tool_name,
            status: JobStatus::Queued,
            submitted_at_ms,
            started_at_ms: None,
            finished_at_ms: None,
            result: None,
            error: None,
            logs: RingBuffer::new(DEFAULT_LOG_CAPACITY),
        }
    }
}
