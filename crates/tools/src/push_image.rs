// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `push_image`: pushes a tagged image to its registry through the
//! container-runtime capability, guarded by the registry circuit breaker
//! (pushing is a registry-facing operation even though the runtime
//! adapter is what drives it locally).

use crate::common::{parse_args, BaseArgs, ToolContext};
use async_trait::async_trait;
use dh_capabilities::Capability;
use dh_core::clock::Clock;
use dh_core::error::ToolResult;
use dh_core::ids::SessionId;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::sync::Arc;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PushImageArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub image_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PushImageResult {
    pub image_ref: String,
    pub digest: String,
}

pub async fn push_image_core<C: Clock>(
    ctx: &ToolContext<C>,
    session_id: SessionId,
    image_ref: &str,
    dry_run: bool,
) -> ToolResult<PushImageResult> {
    let digest = if dry_run {
        format!("sha256:dry-run-{}", session_id.as_str())
    } else {
        let runtime = ctx.container_runtime.clone();
        let tag = image_ref.to_string();
        let outcome = ctx
            .breakers
            .guard(Capability::Registry.breaker_name(), || async move { runtime.push(&tag).await })
            .await?;
        ctx.mark_stage_done(session_id.as_str(), Stage::Push)?;
        outcome.digest
    };

    Ok(PushImageResult { image_ref: image_ref.to_string(), digest })
}

pub struct PushImageHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> PushImageHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for PushImageHandler<C> {
    async fn call(&self, _ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: PushImageArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let result = push_image_core(&self.ctx, session_id, &args.image_ref, args.base.dry_run).await?;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}

pub struct PushImageStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    dry_run: bool,
}

impl<C: Clock> PushImageStep<C> {
    pub fn new(ctx: Arc<ToolContext<C>>, session_id: SessionId, dry_run: bool) -> Self {
        Self { ctx, session_id, dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for PushImageStep<C> {
    fn name(&self) -> &str {
        "push"
    }

    async fn execute(&self, _step: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        let image_ref = shared
            .get("tag")
            .and_then(|v| v.get("image_ref"))
            .and_then(|v| v.as_str())
            .or_else(|| shared.get("build").and_then(|v| v.get("image_ref")).and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string();
        let result = push_image_core(&self.ctx, self.session_id, &image_ref, self.dry_run).await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("push".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        Ok(())
    }

    /// No unpush primitive exists on the adapter; a pushed image stays in
    /// the registry even if a later stage fails.
    fn can_compensate(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "push_image_tests.rs"]
mod tests;
