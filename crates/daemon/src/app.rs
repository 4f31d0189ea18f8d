// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assembles every long-lived collaborator the daemon hands requests
//! to: sessions/workspaces, capability adapters behind their breakers,
//! and the frozen tool registry wired to a job manager.

use crate::config::Config;
use dh_capabilities::{
    BreakerConfig, BreakerRegistry, CliScannerAdapter, ClusterAdapter, ContainerRuntimeAdapter,
    HttpRegistryAdapter, KubeClusterAdapter, LocalDockerAdapter, RegistryAdapter, ScannerAdapter,
};
use dh_core::clock::SystemClock;
use dh_core::error::ToolError;
use dh_engine::{Dispatcher, JobManager, JobManagerConfig, ToolRegistry};
use dh_session::{SessionManager, SessionManagerConfig, SessionStore, WorkspaceConfig, WorkspaceManager};
use dh_tools::{register_all_tools, ToolContext};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),
    #[error("failed to build cluster adapter: {0}")]
    Cluster(ToolError),
}

/// Every collaborator a connection handler needs to turn a wire
/// `Method` into a `ToolRegistry`/`JobManager`/`SessionManager` call.
pub struct AppContext {
    pub sessions: Arc<SessionManager<SystemClock>>,
    pub registry: Arc<ToolRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub jobs: Arc<JobManager<SystemClock>>,
    pub started_at: std::time::Instant,
}

pub async fn build(config: &Config) -> Result<AppContext, AppError> {
    let clock = SystemClock;

    let workspaces = Arc::new(WorkspaceManager::new(WorkspaceConfig {
        base_dir: config.workspaces_path(),
        per_session_cap_bytes: 256 * 1024 * 1024,
        global_cap_bytes: 4 * 1024 * 1024 * 1024,
    }));
    let store = Arc::new(SessionStore::new(config.sessions_path())?);
    let sessions = Arc::new(SessionManager::new(
        clock.clone(),
        SessionManagerConfig::default(),
        workspaces.clone(),
        store,
    ));

    let breakers = Arc::new(BreakerRegistry::new(clock.clone(), BreakerConfig::default()));

    let container_runtime: Arc<dyn ContainerRuntimeAdapter> =
        Arc::new(LocalDockerAdapter::new(config.container_runtime.docker_binary.clone()));
    let cluster: Arc<dyn ClusterAdapter> = Arc::new(
        KubeClusterAdapter::try_default().await.map_err(AppError::Cluster)?,
    );
    let registry_adapter: Arc<dyn RegistryAdapter> =
        Arc::new(HttpRegistryAdapter::new(config.container_runtime.registry_base_url.clone()));
    let scanner: Arc<dyn ScannerAdapter> =
        Arc::new(CliScannerAdapter::new(config.container_runtime.scanner_binary.clone()));

    let ctx = Arc::new(ToolContext::new(
        clock.clone(),
        sessions.clone(),
        workspaces,
        breakers,
        container_runtime,
        cluster,
        registry_adapter,
        scanner,
    ));

    let registry = Arc::new(ToolRegistry::new());
    register_all_tools(&registry, ctx)?;

    let dispatcher = Arc::new(Dispatcher::new(registry.clone()));
    let jobs = Arc::new(JobManager::new(
        dispatcher.clone(),
        clock,
        JobManagerConfig {
            max_workers: config.worker.max_workers,
            queue_capacity: config.worker.queue_capacity,
            max_job_duration: Duration::from_secs(config.worker.max_job_duration_secs),
            job_ttl_ms: config.worker.job_ttl_secs * 1000,
            shutdown_deadline: Duration::from_secs(30),
        },
    ));

    Ok(AppContext { sessions, registry, dispatcher, jobs, started_at: std::time::Instant::now() })
}
