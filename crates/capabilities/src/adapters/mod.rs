// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod cluster;
pub mod container_runtime;
pub mod mock;
pub mod registry;
pub mod scanner;

pub use cluster::{ApplyOutcome, ClusterAdapter, DeploymentStatus, KubeClusterAdapter};
pub use container_runtime::{BuildOutcome, ContainerRuntimeAdapter, LocalDockerAdapter, PushOutcome};
pub use registry::{HttpRegistryAdapter, RegistryAdapter, RegistryPushOutcome};
pub use scanner::{CliScannerAdapter, ScannerAdapter, VulnerabilitySummary};
