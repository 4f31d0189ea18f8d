// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `check_health`: the final pipeline stage. Re-reads the deployment's
//! rollout status through the cluster capability to confirm it is still
//! healthy after `deploy`.

use crate::common::{parse_args, BaseArgs, ToolContext};
use async_trait::async_trait;
use dh_capabilities::adapters::DeploymentStatus;
use dh_capabilities::Capability;
use dh_core::clock::Clock;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use dh_core::ids::SessionId;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::sync::Arc;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CheckHealthArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub deployment_name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CheckHealthResult {
    pub healthy: bool,
    pub status: String,
}

pub async fn check_health_core<C: Clock>(
    ctx: &ToolContext<C>,
    session_id: SessionId,
    deployment_name: &str,
    namespace: &str,
    dry_run: bool,
) -> ToolResult<CheckHealthResult> {
    let status = if dry_run {
        DeploymentStatus::Available
    } else {
        let cluster = ctx.cluster.clone();
        let name = deployment_name.to_string();
        let ns = namespace.to_string();
        let status = ctx
            .breakers
            .guard(Capability::Cluster.breaker_name(), || async move { cluster.deployment_status(&name, &ns).await })
            .await?;
        if status == DeploymentStatus::Failed {
            return Err(ToolError::new(ErrorKind::CapabilityFailure, "deployment is unhealthy")
                .stage(Stage::Verify.as_str())
                .with_context("deployment", deployment_name.to_string()));
        }
        ctx.mark_stage_done(session_id.as_str(), Stage::Verify)?;
        status
    };

    let status_str = match status {
        DeploymentStatus::Progressing => "progressing",
        DeploymentStatus::Available => "available",
        DeploymentStatus::Failed => "failed",
    };

    Ok(CheckHealthResult { healthy: status == DeploymentStatus::Available, status: status_str.to_string() })
}

pub struct CheckHealthHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> CheckHealthHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for CheckHealthHandler<C> {
    async fn call(&self, _ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: CheckHealthArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let result = check_health_core(
            &self.ctx,
            session_id,
            &args.deployment_name,
            &args.namespace,
            args.base.dry_run,
        )
        .await?;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}

pub struct CheckHealthStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    dry_run: bool,
}

impl<C: Clock> CheckHealthStep<C> {
    pub fn new(ctx: Arc<ToolContext<C>>, session_id: SessionId, dry_run: bool) -> Self {
        Self { ctx, session_id, dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for CheckHealthStep<C> {
    fn name(&self) -> &str {
        "verify"
    }

    async fn execute(&self, _step: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        let namespace = shared
            .get("manifest")
            .and_then(|v| v.get("namespace"))
            .and_then(|v| v.as_str())
            .unwrap_or("default")
            .to_string();
        let deployment_name = shared
            .get("manifest")
            .and_then(|v| v.get("deployment_name"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let result = check_health_core(&self.ctx, self.session_id, &deployment_name, &namespace, self.dry_run).await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("verify".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        Ok(())
    }

    /// A health check is a pure read; nothing to undo.
    fn can_compensate(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "check_health_tests.rs"]
mod tests;
