// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single saga step: execute forward, compensate backward (§4.6).

use async_trait::async_trait;
use dh_core::error::ToolResult;
use dh_core::ids::SessionId;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Outputs steps hand forward to later steps — e.g. the image reference
/// `build` produces is consumed by `push`.
pub type SharedBag = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone)]
pub struct StepContext {
    pub session_id: Option<SessionId>,
    pub test_mode: bool,
    pub test_namespace: Option<String>,
    /// The cancellation source in effect for whatever is currently
    /// running under this context. The saga engine swaps this to a fresh,
    /// independent token for the compensation phase (§4.6) so a step's
    /// own cancellation doesn't also abort compensation.
    pub cancel: CancellationToken,
}

impl StepContext {
    pub fn new(session_id: Option<SessionId>) -> Self {
        Self { session_id, test_mode: false, test_namespace: None, cancel: CancellationToken::new() }
    }

    pub fn test_mode(namespace: impl Into<String>) -> Self {
        Self { session_id: None, test_mode: true, test_namespace: Some(namespace.into()), cancel: CancellationToken::new() }
    }

    /// Namespaces an identifier a step is about to create, per the
    /// test-mode isolation rule: results carry a `test-` prefix and stay
    /// inside the configured namespace rather than touching real
    /// infrastructure.
    pub fn namespaced(&self, raw: &str) -> String {
        if self.test_mode {
            format!("test-{raw}")
        } else {
            raw.to_string()
        }
    }
}

#[async_trait]
pub trait WorkflowStep: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, ctx: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value>;

    async fn compensate(&self, ctx: &StepContext, shared: &mut SharedBag) -> ToolResult<()>;

    /// Whether this step can be compensated at all. Non-compensable
    /// steps are skipped during compensation with a recorded note, not
    /// treated as a failure.
    fn can_compensate(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
