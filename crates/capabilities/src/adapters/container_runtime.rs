// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The container-runtime capability: build, tag, and push images locally.

use async_trait::async_trait;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use std::path::Path;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub image_id: String,
    pub logs: String,
}

#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub digest: String,
}

#[async_trait]
pub trait ContainerRuntimeAdapter: Send + Sync {
    async fn build(&self, context_dir: &Path, dockerfile: &Path, tag: &str) -> ToolResult<BuildOutcome>;

    async fn tag(&self, source: &str, target: &str) -> ToolResult<()>;

    async fn push(&self, tag: &str) -> ToolResult<PushOutcome>;
}

/// Shells out to a local `docker` or `podman` binary via
/// `tokio::process::Command`, matching the CLI-as-capability pattern used
/// by the rest of the substrate's adapters.
pub struct LocalDockerAdapter {
    binary: String,
}

impl LocalDockerAdapter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn docker() -> Self {
        Self::new("docker")
    }

    pub fn podman() -> Self {
        Self::new("podman")
    }

    async fn run(&self, args: &[&str]) -> ToolResult<std::process::Output> {
        let output = Command::new(&self.binary).args(args).output().await.map_err(|e| {
            ToolError::new(
                ErrorKind::CapabilityFailure,
                format!("failed to spawn {}", self.binary),
            )
            .with_cause(e)
        })?;
        if !output.status.success() {
            return Err(ToolError::new(
                ErrorKind::CapabilityFailure,
                format!("{} {} exited with {}", self.binary, args.join(" "), output.status),
            )
            .with_context("stderr", String::from_utf8_lossy(&output.stderr).to_string()));
        }
        Ok(output)
    }
}

#[async_trait]
impl ContainerRuntimeAdapter for LocalDockerAdapter {
    async fn build(&self, context_dir: &Path, dockerfile: &Path, tag: &str) -> ToolResult<BuildOutcome> {
        let context = context_dir.to_string_lossy();
        let dockerfile = dockerfile.to_string_lossy();
        let output = self.run(&["build", "-t", tag, "-f", &dockerfile, &context]).await?;
        let logs = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        Ok(BuildOutcome { image_id: tag.to_string(), logs })
    }

    async fn tag(&self, source: &str, target: &str) -> ToolResult<()> {
        self.run(&["tag", source, target]).await?;
        Ok(())
    }

    async fn push(&self, tag: &str) -> ToolResult<PushOutcome> {
        let output = self.run(&["push", tag]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(PushOutcome { digest: parse_push_digest(&stdout, tag) })
    }
}

/// Pulls the digest out of `docker push` / `podman push` stdout, falling
/// back to a placeholder keyed on `tag` when the output format changes.
fn parse_push_digest(stdout: &str, tag: &str) -> String {
    stdout
        .lines()
        .find_map(|line| line.split_once("digest: ").map(|(_, d)| d.trim().to_string()))
        .unwrap_or_else(|| format!("unknown:{tag}"))
}

#[cfg(test)]
#[path = "container_runtime_tests.rs"]
mod tests;
