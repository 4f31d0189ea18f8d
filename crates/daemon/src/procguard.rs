// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level startup sequencing: state directories, the exclusive
//! lock/PID file that keeps a second daemon from starting against the
//! same state dir, and cleanup on a failed startup.

use crate::config::Config;
use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another dockhandd is already running against this state directory")]
    LockFailed(#[source] std::io::Error),
    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(std::path::PathBuf, std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Holds the lock file open for the process lifetime; the OS releases
/// the exclusive lock when this (and the fd) is dropped.
pub struct LockGuard {
    #[allow(dead_code)]
    file: File,
}

/// Create state directories and acquire the exclusive lock file,
/// writing this process's PID into it. Mirrors the teacher's
/// try_lock_exclusive-then-truncate-then-write sequencing so a crash
/// between open and lock can never corrupt a running daemon's PID file.
pub fn acquire(config: &Config) -> Result<LockGuard, LifecycleError> {
    std::fs::create_dir_all(&config.server.state_dir)?;
    std::fs::create_dir_all(config.sessions_path())?;
    std::fs::create_dir_all(config.workspaces_path())?;

    let lock_path = config.lock_path();
    let lock_file = std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(&lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    Ok(LockGuard { file: lock_file })
}

/// Remove the socket and lock files this process created. Not called
/// when `acquire` itself failed on `LockFailed` — those files belong to
/// the daemon already holding the lock.
pub fn cleanup(config: &Config) {
    let socket_path = config.socket_path();
    if socket_path.exists() {
        let _ = std::fs::remove_file(&socket_path);
    }
    let lock_path = config.lock_path();
    if lock_path.exists() {
        let _ = std::fs::remove_file(&lock_path);
    }
}

#[cfg(test)]
#[path = "procguard_tests.rs"]
mod tests;
