// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A tool's static shape: its name, schema, required capabilities, and
//! the handler that implements it.

use async_trait::async_trait;
use dh_capabilities::Capability;
use dh_core::error::ToolResult;
use dh_core::ids::SessionId;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a middleware layer or handler needs about the in-flight
/// call (§4.3 "context enrichment").
#[derive(Debug, Clone)]
pub struct CallContext {
    pub request_id: String,
    pub tool_name: String,
    pub session_id: Option<SessionId>,
    /// The call's cancellation source. A fresh, never-fired token unless
    /// the caller (e.g. the job manager) attaches the token it actually
    /// controls via [`Self::with_cancel`].
    pub cancel: CancellationToken,
}

impl CallContext {
    pub fn new(request_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            tool_name: tool_name.into(),
            session_id: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A tool's executable body. Arguments and results cross this boundary as
/// `serde_json::Value`; the registry's `Dispatch` decodes/validates
/// against the descriptor before invoking it.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value>;

    /// Strict schema validation hook (§4.1). Default accepts anything;
    /// individual tools override to reject missing/malformed fields.
    fn validate(&self, _args: &serde_json::Value) -> ToolResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentMode {
    Strict,
    Lenient,
}

#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub category: String,
    pub required_capabilities: Vec<Capability>,
    pub argument_mode: ArgumentMode,
    pub timeout: std::time::Duration,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, category: impl Into<String>, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            required_capabilities: Vec::new(),
            argument_mode: ArgumentMode::Strict,
            timeout: std::time::Duration::from_secs(30),
            handler,
        }
    }

    pub fn requires(mut self, capability: Capability) -> Self {
        self.required_capabilities.push(capability);
        self
    }

    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn lenient(mut self) -> Self {
        self.argument_mode = ArgumentMode::Lenient;
        self
    }

    /// A JSON-shaped summary for `ExportSchemas` (§4.1); the actual field
    /// schema lives with each tool's handler, not the shared descriptor.
    pub fn schema_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "category": self.category,
            "requires": self.required_capabilities.iter().map(|c| c.breaker_name()).collect::<Vec<_>>(),
            "timeout_ms": self.timeout.as_millis() as u64,
        })
    }
}
