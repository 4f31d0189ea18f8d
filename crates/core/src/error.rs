// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The structured error model shared by every layer of the substrate.
//!
//! A [`ToolError`] is the single value that flows out of a handler, through
//! middleware, through the workflow engine, and across the wire boundary.
//! Kinds are a closed enum; middleware enriches context but never changes
//! the kind a handler chose.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Closed taxonomy of error kinds. See spec §7 for the authoritative table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArguments,
    ToolNotFound,
    ToolAlreadyRegistered,
    SessionNotFound,
    SessionCapacityExhausted,
    QuotaExceeded,
    QueueFull,
    TimedOut,
    Cancelled,
    CircuitOpen,
    CapabilityFailure,
    ValidationFailed,
    InternalError,
    CompensationFailed,
}

impl ErrorKind {
    /// Default retryability for this kind, absent any override.
    ///
    /// `CapabilityFailure` has no fixed answer ("depends on cause" per
    /// spec §7) — callers that know more should set `retryable` explicitly
    /// on the `ToolError` rather than trust this default.
    pub const fn default_retryable(self) -> bool {
        matches!(self, ErrorKind::TimedOut | ErrorKind::CircuitOpen | ErrorKind::QueueFull)
    }

    /// Stable positive wire code (§6: "positive codes are reserved for
    /// tool-domain errors"). Never renumber; clients depend on these.
    pub const fn wire_code(self) -> i64 {
        match self {
            ErrorKind::InvalidArguments => 1001,
            ErrorKind::ToolNotFound => 1002,
            ErrorKind::ToolAlreadyRegistered => 1003,
            ErrorKind::SessionNotFound => 1004,
            ErrorKind::SessionCapacityExhausted => 1005,
            ErrorKind::QuotaExceeded => 1006,
            ErrorKind::QueueFull => 1007,
            ErrorKind::TimedOut => 1008,
            ErrorKind::Cancelled => 1009,
            ErrorKind::CircuitOpen => 1010,
            ErrorKind::CapabilityFailure => 1011,
            ErrorKind::ValidationFailed => 1012,
            ErrorKind::InternalError => 1013,
            ErrorKind::CompensationFailed => 1014,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArguments => "invalid_arguments",
            ErrorKind::ToolNotFound => "tool_not_found",
            ErrorKind::ToolAlreadyRegistered => "tool_already_registered",
            ErrorKind::SessionNotFound => "session_not_found",
            ErrorKind::SessionCapacityExhausted => "session_capacity_exhausted",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::QueueFull => "queue_full",
            ErrorKind::TimedOut => "timed_out",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::CapabilityFailure => "capability_failure",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::InternalError => "internal_error",
            ErrorKind::CompensationFailed => "compensation_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an error, independent of its kind (a `QuotaExceeded` on a
/// dry run is `Warning`; the same kind mid-deploy is `Error`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

/// A single structured error, carrying everything needed to render the
/// stable `{code, message, data}` triple at the wire boundary (spec §6)
/// and everything the workflow engine needs to decide on compensation.
#[derive(Debug, Clone)]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
    cause: Option<Arc<dyn StdError + Send + Sync + 'static>>,
    pub retryable: bool,
    pub retry_count: u32,
    pub retry_cap: u32,
    pub severity: Severity,
    pub tool: Option<String>,
    pub stage: Option<String>,
    pub session_id: Option<String>,
    pub suggestions: Vec<String>,
    pub context: BTreeMap<String, String>,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            retryable: kind.default_retryable(),
            kind,
            message: message.into(),
            cause: None,
            retry_count: 0,
            retry_cap: 0,
            severity: Severity::Error,
            tool: None,
            stage: None,
            session_id: None,
            suggestions: Vec::new(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_retry(mut self, count: u32, cap: u32) -> Self {
        self.retry_count = count;
        self.retry_cap = cap;
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Enrich with call context without losing the handler-chosen kind
    /// (§4.3: "middleware attaches context ... and leaves the kind
    /// unchanged").
    pub fn enrich(mut self, tool: &str, session_id: Option<&str>) -> Self {
        if self.tool.is_none() {
            self.tool = Some(tool.to_string());
        }
        if self.session_id.is_none() {
            self.session_id = session_id.map(str::to_string);
        }
        self
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Fully-qualified cause chain, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut out = vec![self.message.clone()];
        let mut next = self.cause.as_ref().map(|c| c.as_ref() as &(dyn StdError + 'static));
        while let Some(err) = next {
            out.push(err.to_string());
            next = err.source();
        }
        out
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for ToolError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|c| c.as_ref() as &(dyn StdError + 'static))
    }
}

/// Convenience alias used throughout the substrate.
pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
