// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory stand-ins for every capability adapter, used by tool and
//! workflow tests that need deterministic, network-free outcomes.

use super::cluster::{ApplyOutcome, ClusterAdapter, DeploymentStatus};
use super::container_runtime::{BuildOutcome, ContainerRuntimeAdapter, PushOutcome};
use super::registry::{RegistryAdapter, RegistryPushOutcome};
use super::scanner::{ScannerAdapter, VulnerabilitySummary};
use async_trait::async_trait;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use parking_lot::Mutex;
use std::path::Path;

/// A scripted outcome: succeed with a value, or fail with the given kind.
#[derive(Clone)]
pub enum Scripted<T: Clone> {
    Succeed(T),
    Fail(ErrorKind),
}

pub struct MockContainerRuntime {
    pub build_result: Mutex<Scripted<BuildOutcome>>,
    pub push_result: Mutex<Scripted<PushOutcome>>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for MockContainerRuntime {
    fn default() -> Self {
        Self {
            build_result: Mutex::new(Scripted::Succeed(BuildOutcome {
                image_id: "sha256:mock".to_string(),
                logs: String::new(),
            })),
            push_result: Mutex::new(Scripted::Succeed(PushOutcome { digest: "sha256:mockpush".to_string() })),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContainerRuntimeAdapter for MockContainerRuntime {
    async fn build(&self, _context_dir: &Path, _dockerfile: &Path, tag: &str) -> ToolResult<BuildOutcome> {
        self.calls.lock().push(format!("build:{tag}"));
        match &*self.build_result.lock() {
            Scripted::Succeed(outcome) => Ok(outcome.clone()),
            Scripted::Fail(kind) => Err(ToolError::new(*kind, "mock build failure")),
        }
    }

    async fn tag(&self, source: &str, target: &str) -> ToolResult<()> {
        self.calls.lock().push(format!("tag:{source}->{target}"));
        Ok(())
    }

    async fn push(&self, tag: &str) -> ToolResult<PushOutcome> {
        self.calls.lock().push(format!("push:{tag}"));
        match &*self.push_result.lock() {
            Scripted::Succeed(outcome) => Ok(outcome.clone()),
            Scripted::Fail(kind) => Err(ToolError::new(*kind, "mock push failure")),
        }
    }
}

pub struct MockClusterAdapter {
    pub status: Mutex<DeploymentStatus>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for MockClusterAdapter {
    fn default() -> Self {
        Self { status: Mutex::new(DeploymentStatus::Available), calls: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl ClusterAdapter for MockClusterAdapter {
    async fn apply_manifests(&self, manifests: &[String], namespace: &str) -> ToolResult<ApplyOutcome> {
        self.calls.lock().push(format!("apply:{namespace}"));
        Ok(ApplyOutcome { applied: manifests.iter().map(|_| namespace.to_string()).collect() })
    }

    async fn deployment_status(&self, name: &str, _namespace: &str) -> ToolResult<DeploymentStatus> {
        self.calls.lock().push(format!("status:{name}"));
        Ok(*self.status.lock())
    }

    async fn rollback(&self, name: &str, _namespace: &str) -> ToolResult<()> {
        self.calls.lock().push(format!("rollback:{name}"));
        Ok(())
    }
}

pub struct MockRegistryAdapter {
    pub digest: Mutex<String>,
}

impl Default for MockRegistryAdapter {
    fn default() -> Self {
        Self { digest: Mutex::new("sha256:mockregistry".to_string()) }
    }
}

#[async_trait]
impl RegistryAdapter for MockRegistryAdapter {
    async fn push(&self, _image_ref: &str) -> ToolResult<RegistryPushOutcome> {
        Ok(RegistryPushOutcome { digest: self.digest.lock().clone(), size_bytes: 1024 })
    }

    async fn image_digest(&self, _image_ref: &str) -> ToolResult<String> {
        Ok(self.digest.lock().clone())
    }
}

pub struct MockScannerAdapter {
    pub summary: Mutex<VulnerabilitySummary>,
}

impl Default for MockScannerAdapter {
    fn default() -> Self {
        Self { summary: Mutex::new(VulnerabilitySummary::default()) }
    }
}

#[async_trait]
impl ScannerAdapter for MockScannerAdapter {
    async fn scan(&self, _image_ref: &str) -> ToolResult<VulnerabilitySummary> {
        Ok(*self.summary.lock())
    }
}

#[cfg(test)]
#[path = "mock_tests.rs"]
mod tests;
