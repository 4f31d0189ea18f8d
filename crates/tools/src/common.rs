// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared plumbing every atomic-tool module builds on: the fields common
//! to every tool's argument object (§6), the bundle of collaborators a
//! tool needs to do its work, and the helpers that turn a raw JSON
//! argument value into a typed struct or a session handle.

use dh_capabilities::adapters::{ClusterAdapter, ContainerRuntimeAdapter, RegistryAdapter, ScannerAdapter};
use dh_capabilities::BreakerRegistry;
use dh_core::clock::Clock;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use dh_core::ids::{SessionId, WorkspaceId};
use dh_engine::workflow::StepContext;
use dh_session::{Session, SessionManager, SharedWorkspaceManager, Stage};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The fields every tool argument object carries (spec §6): an optional
/// session id (empty auto-allocates) and a dry-run flag that suppresses
/// external side effects. `test_mode` is not part of the public tool
/// contract but is accepted here too so a single atomic tool can be
/// exercised the same way the workflow engine exercises it as a step.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct BaseArgs {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub test_mode: bool,
}

/// Parse `args` into `T`, mapping any schema mismatch to `InvalidArguments`
/// (spec §7) rather than letting a `serde_json::Error` escape as-is.
pub fn parse_args<T: DeserializeOwned>(args: &serde_json::Value) -> ToolResult<T> {
    serde_json::from_value(args.clone())
        .map_err(|e| ToolError::new(ErrorKind::InvalidArguments, format!("invalid arguments: {e}")).with_cause(e))
}

/// The collaborators every atomic tool is handed: session/workspace
/// state, the per-capability breaker registry, and the four capability
/// adapters. Handlers and workflow steps both build on this so the two
/// call paths share one implementation of the actual work (see each
/// tool module's `*_core` function).
pub struct ToolContext<C: Clock> {
    pub clock: C,
    pub sessions: Arc<SessionManager<C>>,
    pub workspaces: SharedWorkspaceManager,
    pub breakers: Arc<BreakerRegistry<C>>,
    pub container_runtime: Arc<dyn ContainerRuntimeAdapter>,
    pub cluster: Arc<dyn ClusterAdapter>,
    pub registry: Arc<dyn RegistryAdapter>,
    pub scanner: Arc<dyn ScannerAdapter>,
}

impl<C: Clock> ToolContext<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: C,
        sessions: Arc<SessionManager<C>>,
        workspaces: SharedWorkspaceManager,
        breakers: Arc<BreakerRegistry<C>>,
        container_runtime: Arc<dyn ContainerRuntimeAdapter>,
        cluster: Arc<dyn ClusterAdapter>,
        registry: Arc<dyn RegistryAdapter>,
        scanner: Arc<dyn ScannerAdapter>,
    ) -> Self {
        Self { clock, sessions, workspaces, breakers, container_runtime, cluster, registry, scanner }
    }

    /// Resolve `raw_session_id` to a session handle, creating one if the
    /// id is empty (spec §6: "empty string auto-allocates").
    pub fn resolve_session(&self, raw_session_id: &str) -> ToolResult<Arc<RwLock<Session>>> {
        self.sessions.get_or_create(raw_session_id)
    }

    /// Build the [`StepContext`] a core function runs under, namespacing
    /// test-mode identifiers the same way whether the tool was invoked
    /// directly or as a saga step (spec §4.6, §8 property 12), and
    /// carrying the call's own cancellation token so the step can
    /// observe it.
    pub fn step_context(&self, session_id: SessionId, base: &BaseArgs, cancel: CancellationToken) -> StepContext {
        let mut step = StepContext::new(Some(session_id));
        step.cancel = cancel;
        if base.test_mode {
            step.test_mode = true;
            step.test_namespace = Some("test-namespace".to_string());
        }
        step
    }

    /// The on-disk workspace directory owned by `session_id`.
    pub fn workspace_id(&self, session_id: &str) -> ToolResult<WorkspaceId> {
        Ok(self.sessions.get(session_id)?.read().workspace_id)
    }

    /// Record `stage` as done against the session's stage map (spec §3).
    /// A no-op caller should skip this on `dry_run` so a dry run never
    /// advances pipeline state.
    pub fn mark_stage_done(&self, session_id: &str, stage: Stage) -> ToolResult<()> {
        let now = self.clock.epoch_ms();
        self.sessions.update(session_id, |session| session.stages.mark_done(stage, now))
    }
}

#[cfg(test)]
#[path = "common_tests.rs"]
mod tests;
