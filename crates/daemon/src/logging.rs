// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup: a non-blocking file appender plus an
//! `EnvFilter` read from `RUST_LOG` (default `info`).

use crate::config::Config;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Holding this alive keeps the non-blocking writer's background thread
/// running; dropping it (e.g. at the end of `main`) flushes and joins it.
pub fn init(config: &Config) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_path = config.server.state_dir.join("dockhand.log");
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = log_appender(&log_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

fn log_appender(log_path: &std::path::Path) -> tracing_appender::rolling::RollingFileAppender {
    let dir = log_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let name = log_path.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("dockhand.log"));
    tracing_appender::rolling::never(dir, name)
}
