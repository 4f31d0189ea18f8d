// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: env vars (`DOCKHAND_<GROUP>__<FIELD>`, double
//! underscore separating the group from the field) over a YAML file
//! over built-in defaults (spec §6, §9 — replaces the ad-hoc
//! `env::var()` reads an earlier iteration of this daemon used).

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root state directory (sessions store, workspaces). Defaults to
    /// `$XDG_STATE_HOME/dockhand` or `~/.local/state/dockhand`.
    pub state_dir: PathBuf,
    pub socket_name: String,
    pub lock_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            socket_name: "dockhand.sock".to_string(),
            lock_name: "dockhand.pid".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub clone_timeout_secs: u64,
    pub max_repo_size_bytes: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { clone_timeout_secs: 120, max_repo_size_bytes: 512 * 1024 * 1024 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub tcp_port: Option<u16>,
    pub auth_token: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { tcp_port: None, auth_token: None, request_timeout_ms: 30_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerRuntimeConfig {
    pub docker_binary: String,
    pub registry_base_url: String,
    pub scanner_binary: String,
}

impl Default for ContainerRuntimeConfig {
    fn default() -> Self {
        Self {
            docker_binary: "docker".to_string(),
            registry_base_url: "https://registry.local".to_string(),
            scanner_binary: "trivy".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub max_workers: usize,
    pub queue_capacity: usize,
    pub max_job_duration_secs: u64,
    pub job_ttl_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { max_workers: 4, queue_capacity: 64, max_job_duration_secs: 600, job_ttl_secs: 3600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub analyzer: AnalyzerConfig,
    pub transport: TransportConfig,
    pub container_runtime: ContainerRuntimeConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration at `{field}`: {message}")]
    InvalidField { field: String, message: String },
    #[error("could not determine home directory to resolve default state dir")]
    NoHomeDir,
}

impl Config {
    /// Load env > `yaml_path` (if given) > `./dockhand.yaml` >
    /// `~/.config/dockhand/config.yaml` > built-in defaults.
    pub fn load(yaml_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = yaml_path {
            figment = figment.merge(Yaml::file(path));
        } else if Path::new("./dockhand.yaml").exists() {
            figment = figment.merge(Yaml::file("./dockhand.yaml"));
        } else if let Some(path) = default_user_config_path() {
            if path.exists() {
                figment = figment.merge(Yaml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed("DOCKHAND_").split("__"));

        figment.extract().map_err(|e| field_error(&e))
    }

    pub fn socket_path(&self) -> PathBuf {
        self.server.state_dir.join(&self.server.socket_name)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.server.state_dir.join(&self.server.lock_name)
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.server.state_dir.join("sessions")
    }

    pub fn workspaces_path(&self) -> PathBuf {
        self.server.state_dir.join("workspaces")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.transport.request_timeout_ms)
    }
}

fn field_error(err: &figment::Error) -> ConfigError {
    let field = if err.path.is_empty() { "<root>".to_string() } else { err.path.join(".") };
    ConfigError::InvalidField { field, message: err.to_string() }
}

fn default_state_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("dockhand");
    }
    dirs_home().map(|h| h.join(".local/state/dockhand")).unwrap_or_else(|| PathBuf::from("/tmp/dockhand"))
}

fn default_user_config_path() -> Option<PathBuf> {
    dirs_home().map(|h| h.join(".config/dockhand/config.yaml"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
