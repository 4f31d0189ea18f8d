// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `server/status` response body (spec §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerStatusBody {
    pub healthy: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
    pub queued_jobs: usize,
    pub running_jobs: usize,
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
