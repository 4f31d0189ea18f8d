// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the fixed, 11-entry tool namespace (spec §6) and registers it
//! into a [`ToolRegistry`], freezing it so `dh-daemon` serves a stable
//! `tools/list` for the life of the process.

use crate::analyze_repository::AnalyzeRepositoryHandler;
use crate::build_image::BuildImageHandler;
use crate::chat::ChatHandler;
use crate::check_health::CheckHealthHandler;
use crate::containerize_and_deploy::ContainerizeAndDeployHandler;
use crate::deploy::DeployHandler;
use crate::generate_dockerfile::GenerateDockerfileHandler;
use crate::generate_manifests::GenerateManifestsHandler;
use crate::push_image::PushImageHandler;
use crate::scan_image::ScanImageHandler;
use crate::tag_image::TagImageHandler;
use crate::ToolContext;
use dh_capabilities::Capability;
use dh_core::clock::Clock;
use dh_core::error::ToolResult;
use dh_engine::descriptor::ToolDescriptor;
use dh_engine::registry::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;

/// Registers all 11 tools into `registry` and freezes it. Callers that
/// need to register additional tools first should not call this —
/// freezing is final for the process lifetime.
pub fn register_all_tools<C: Clock + 'static>(
    registry: &ToolRegistry,
    ctx: Arc<ToolContext<C>>,
) -> ToolResult<()> {
    for descriptor in descriptors(ctx) {
        registry.register(descriptor)?;
    }
    registry.freeze();
    Ok(())
}

/// The same descriptors `register_all_tools` registers, without the
/// side effect — useful for tests that want to inspect the namespace
/// without freezing a shared registry.
pub fn descriptors<C: Clock + 'static>(ctx: Arc<ToolContext<C>>) -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "analyze_repository",
            "analysis",
            Arc::new(AnalyzeRepositoryHandler::new(ctx.clone())),
        )
        .timeout(Duration::from_secs(60)),
        ToolDescriptor::new(
            "generate_dockerfile",
            "generation",
            Arc::new(GenerateDockerfileHandler::new(ctx.clone())),
        )
        .timeout(Duration::from_secs(30)),
        ToolDescriptor::new(
            "build_image",
            "container_runtime",
            Arc::new(BuildImageHandler::new(ctx.clone())),
        )
        .requires(Capability::ContainerRuntime)
        .timeout(Duration::from_secs(600)),
        ToolDescriptor::new(
            "scan_image",
            "security",
            Arc::new(ScanImageHandler::new(ctx.clone())),
        )
        .requires(Capability::Scanner)
        .timeout(Duration::from_secs(300)),
        ToolDescriptor::new(
            "tag_image",
            "container_runtime",
            Arc::new(TagImageHandler::new(ctx.clone())),
        )
        .requires(Capability::ContainerRuntime)
        .timeout(Duration::from_secs(30)),
        ToolDescriptor::new(
            "push_image",
            "registry",
            Arc::new(PushImageHandler::new(ctx.clone())),
        )
        .requires(Capability::Registry)
        .timeout(Duration::from_secs(600)),
        ToolDescriptor::new(
            "generate_manifests",
            "generation",
            Arc::new(GenerateManifestsHandler::new(ctx.clone())),
        )
        .timeout(Duration::from_secs(30)),
        ToolDescriptor::new(
            "deploy",
            "cluster",
            Arc::new(DeployHandler::new(ctx.clone())),
        )
        .requires(Capability::Cluster)
        .timeout(Duration::from_secs(300)),
        ToolDescriptor::new(
            "check_health",
            "cluster",
            Arc::new(CheckHealthHandler::new(ctx.clone())),
        )
        .requires(Capability::Cluster)
        .timeout(Duration::from_secs(60)),
        ToolDescriptor::new("chat", "assistant", Arc::new(ChatHandler::new(ctx.clone())))
            .lenient()
            .timeout(Duration::from_secs(30)),
        ToolDescriptor::new(
            "containerize_and_deploy",
            "saga",
            Arc::new(ContainerizeAndDeployHandler::new(ctx)),
        )
        .requires(Capability::ContainerRuntime)
        .requires(Capability::Scanner)
        .requires(Capability::Registry)
        .requires(Capability::Cluster)
        .timeout(Duration::from_secs(1800)),
    ]
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
