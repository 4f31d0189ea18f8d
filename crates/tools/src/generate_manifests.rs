// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `generate_manifests`: renders a Deployment + Service manifest pair for
//! the pushed image and writes them into the session's workspace. No
//! capability adapter is involved; the cluster only sees these documents
//! once `deploy` applies them.

use crate::common::{parse_args, BaseArgs, ToolContext};
use async_trait::async_trait;
use dh_core::clock::Clock;
use dh_core::error::ToolResult;
use dh_core::ids::SessionId;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::path::Path;
use std::sync::Arc;

fn default_replicas() -> u32 {
    1
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct GenerateManifestsArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub image_ref: String,
    pub namespace: Option<String>,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenerateManifestsResult {
    pub namespace: String,
    pub deployment_name: String,
    pub manifests: Vec<String>,
}

fn render_deployment(name: &str, namespace: &str, image_ref: &str, replicas: u32) -> String {
    format!(
        "apiVersion: apps/v1\n\
kind: Deployment\n\
metadata:\n\
  name: {name}\n\
  namespace: {namespace}\n\
spec:\n\
  replicas: {replicas}\n\
  selector:\n\
    matchLabels:\n\
      app: {name}\n\
  template:\n\
    metadata:\n\
      labels:\n\
        app: {name}\n\
    spec:\n\
      containers:\n\
        - name: {name}\n\
          image: {image_ref}\n\
          ports:\n\
            - containerPort: 8080\n"
    )
}

fn render_service(name: &str, namespace: &str) -> String {
    format!(
        "apiVersion: v1\n\
kind: Service\n\
metadata:\n\
  name: {name}\n\
  namespace: {namespace}\n\
spec:\n\
  selector:\n\
    app: {name}\n\
  ports:\n\
    - port: 80\n\
      targetPort: 8080\n"
    )
}

pub async fn generate_manifests_core<C: Clock>(
    ctx: &ToolContext<C>,
    step: &StepContext,
    session_id: SessionId,
    image_ref: &str,
    namespace_override: Option<&str>,
    replicas: u32,
    dry_run: bool,
) -> ToolResult<GenerateManifestsResult> {
    let namespace = match (step.test_mode, &step.test_namespace) {
        (true, Some(namespace)) => namespace.clone(),
        (true, None) => "test-namespace".to_string(),
        (false, _) => namespace_override.unwrap_or("default").to_string(),
    };
    let deployment_name = format!("dockhand-{}", session_id.as_str());

    let deployment = render_deployment(&deployment_name, &namespace, image_ref, replicas);
    let service = render_service(&deployment_name, &namespace);
    let manifests = vec![deployment, service];

    if !dry_run {
        let workspace_id = ctx.workspace_id(session_id.as_str())?;
        let joined = manifests.join("---\n");
        ctx.workspaces.write(workspace_id, Path::new("manifests.yaml"), joined.as_bytes())?;
        ctx.mark_stage_done(session_id.as_str(), Stage::Manifest)?;
    }

    Ok(GenerateManifestsResult { namespace, deployment_name, manifests })
}

pub struct GenerateManifestsHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> GenerateManifestsHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for GenerateManifestsHandler<C> {
    async fn call(&self, ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: GenerateManifestsArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let step = self.ctx.step_context(session_id, &args.base, ctx.cancel.clone());
        let result = generate_manifests_core(
            &self.ctx,
            &step,
            session_id,
            &args.image_ref,
            args.namespace.as_deref(),
            args.replicas,
            args.base.dry_run,
        )
        .await?;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}

pub struct GenerateManifestsStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    namespace: Option<String>,
    replicas: u32,
    dry_run: bool,
}

impl<C: Clock> GenerateManifestsStep<C> {
    pub fn new(
        ctx: Arc<ToolContext<C>>,
        session_id: SessionId,
        namespace: Option<String>,
        replicas: u32,
        dry_run: bool,
    ) -> Self {
        Self { ctx, session_id, namespace, replicas, dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for GenerateManifestsStep<C> {
    fn name(&self) -> &str {
        "manifest"
    }

    async fn execute(&self, step: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        let image_ref = shared
            .get("push")
            .and_then(|v| v.get("image_ref"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let result = generate_manifests_core(
            &self.ctx,
            step,
            self.session_id,
            &image_ref,
            self.namespace.as_deref(),
            self.replicas,
            self.dry_run,
        )
        .await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("manifest".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        if !self.dry_run {
            if let Ok(workspace_id) = self.ctx.workspace_id(self.session_id.as_str()) {
                if let Ok(path) = self.ctx.workspaces.resolve_within(workspace_id, Path::new("manifests.yaml")) {
                    let _ = std::fs::remove_file(path);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "generate_manifests_tests.rs"]
mod tests;
