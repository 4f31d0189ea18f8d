// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `deploy`: applies the rendered manifests to the cluster (`Stage::Cluster`)
//! and then reads back the resulting rollout status (`Stage::Deploy`),
//! both guarded by the cluster circuit breaker. The two halves are split
//! into separate saga steps so a failed rollout check can compensate the
//! apply without having to also retry it.

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
pub struct DeployArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub manifests: Vec<String>,
    pub namespace: String,
    pub deployment_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ApplyResult {
    pub namespace: String,
    pub applied: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeployResult {
    pub status: String,
    pub available: bool,
}

pub async fn apply_manifests_core<C: Clock>(
    ctx: &ToolContext<C>,
    session_id: SessionId,
    manifests: &[String],
    namespace: &str,
    dry_run: bool,
) -> ToolResult<ApplyResult> {
    let applied = if dry_run {
        Vec::new()
    } else {
        let cluster = ctx.cluster.clone();
        let docs = manifests.to_vec();
        let ns = namespace.to_string();
        let outcome = ctx
            .breakers
            .guard(Capability::Cluster.breaker_name(), || async move { cluster.apply_manifests(&docs, &ns).await })
            .await?;
        ctx.mark_stage_done(session_id.as_str(), Stage::Cluster)?;
        outcome.applied
    };

    Ok(ApplyResult { namespace: namespace.to_string(), applied })
}

pub async fn deploy_status_core<C: Clock>(
    ctx: &ToolContext<C>,
    session_id: SessionId,
    deployment_name: &str,
    namespace: &str,
    dry_run: bool,
) -> ToolResult<DeployResult> {
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
            return Err(ToolError::new(ErrorKind::CapabilityFailure, "deployment rollout failed")
                .stage(Stage::Deploy.as_str())
                .with_context("deployment", deployment_name.to_string()));
        }
        ctx.mark_stage_done(session_id.as_str(), Stage::Deploy)?;
        status
    };

    let status_str = match status {
        DeploymentStatus::Progressing => "progressing",
        DeploymentStatus::Available => "available",
        DeploymentStatus::Failed => "failed",
    };

    Ok(DeployResult { status: status_str.to_string(), available: status == DeploymentStatus::Available })
}

pub struct DeployHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> DeployHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for DeployHandler<C> {
    async fn call(&self, _ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: DeployArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        apply_manifests_core(&self.ctx, session_id, &args.manifests, &args.namespace, args.base.dry_run).await?;
        let result = deploy_status_core(
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

pub struct ClusterApplyStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    dry_run: bool,
}

impl<C: Clock> ClusterApplyStep<C> {
    pub fn new(ctx: Arc<ToolContext<C>>, session_id: SessionId, dry_run: bool) -> Self {
        Self { ctx, session_id, dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for ClusterApplyStep<C> {
    fn name(&self) -> &str {
        "cluster"
    }

    async fn execute(&self, _step: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        let manifest_output = shared.get("manifest").cloned().unwrap_or_default();
        let namespace = manifest_output.get("namespace").and_then(|v| v.as_str()).unwrap_or("default").to_string();
        let manifests: Vec<String> = manifest_output
            .get("manifests")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let result = apply_manifests_core(&self.ctx, self.session_id, &manifests, &namespace, self.dry_run).await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("cluster".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, shared: &mut SharedBag) -> ToolResult<()> {
        if self.dry_run {
            return Ok(());
        }
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
        self.ctx
            .breakers
            .guard(Capability::Cluster.breaker_name(), || {
                let cluster = self.ctx.cluster.clone();
                async move { cluster.rollback(&deployment_name, &namespace).await }
            })
            .await
    }
}

pub struct DeployStatusStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    dry_run: bool,
}

impl<C: Clock> DeployStatusStep<C> {
    pub fn new(ctx: Arc<ToolContext<C>>, session_id: SessionId, dry_run: bool) -> Self {
        Self { ctx, session_id, dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for DeployStatusStep<C> {
    fn name(&self) -> &str {
        "deploy"
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
        let result =
            deploy_status_core(&self.ctx, self.session_id, &deployment_name, &namespace, self.dry_run).await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("deploy".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        Ok(())
    }

    /// Reading rollout status has no side effect; any necessary rollback
    /// already happened in `ClusterApplyStep::compensate`.
    fn can_compensate(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
