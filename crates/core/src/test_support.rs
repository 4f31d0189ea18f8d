// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::error::{ErrorKind, Severity, ToolError};
use crate::progress::Stage;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_error_kind() -> impl Strategy<Value = ErrorKind> {
        prop_oneof![
            Just(ErrorKind::InvalidArguments),
            Just(ErrorKind::ToolNotFound),
            Just(ErrorKind::ToolAlreadyRegistered),
            Just(ErrorKind::SessionNotFound),
            Just(ErrorKind::SessionCapacityExhausted),
            Just(ErrorKind::QuotaExceeded),
            Just(ErrorKind::QueueFull),
            Just(ErrorKind::TimedOut),
            Just(ErrorKind::Cancelled),
            Just(ErrorKind::CircuitOpen),
            Just(ErrorKind::CapabilityFailure),
            Just(ErrorKind::ValidationFailed),
            Just(ErrorKind::InternalError),
            Just(ErrorKind::CompensationFailed),
        ]
    }

    pub fn arb_severity() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Info),
            Just(Severity::Warning),
            Just(Severity::Error),
            Just(Severity::Fatal),
        ]
    }

    /// Stage weights in `(0, 1000]`, biased toward the small end seen in
    /// real workflows.
    pub fn arb_stage_weight() -> impl Strategy<Value = f64> {
        (1u32..=1000u32).prop_map(|n| n as f64 / 10.0)
    }
}

// ── Factory helpers ─────────────────────────────────────────────────────

/// A minimal [`ToolError`] for tests that only care about the kind.
pub fn tool_error(kind: ErrorKind) -> ToolError {
    ToolError::new(kind, format!("test error: {kind}"))
}

/// The three-stage pipeline used by most workflow fixtures:
/// analyze, build, deploy, weighted 1:2:1.
pub fn fixture_stages() -> Vec<Stage> {
    vec![
        Stage::new("analyze", 1.0, "inspect repository"),
        Stage::new("build", 2.0, "build image"),
        Stage::new("deploy", 1.0, "apply manifests"),
    ]
}
