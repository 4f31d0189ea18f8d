// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DOCKHAND daemon (`dockhandd`): owns the tool registry, the session
//! table, and the bounded job queue, and serves `dh-wire` requests over
//! a Unix socket (plus an optional loopback TCP listener).
//!
//! Exit codes: `0` clean shutdown, `1` startup validation failed, `2`
//! fatal runtime error, `130` cancelled by signal.

mod app;
mod config;
mod connection;
mod logging;
mod procguard;
mod transport;

use clap::Parser;
use config::Config;
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "dockhandd", version, about = "DOCKHAND tool-execution daemon")]
struct Cli {
    /// Path to a YAML configuration file. Defaults to `./dockhand.yaml`
    /// or `~/.config/dockhand/config.yaml` when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

const EXIT_OK: i32 = 0;
const EXIT_STARTUP_FAILED: i32 = 1;
const EXIT_RUNTIME_FAILED: i32 = 2;
const EXIT_SIGNALLED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("dockhandd: invalid configuration: {err}");
            std::process::exit(EXIT_STARTUP_FAILED);
        }
    };

    let log_guard = match logging::init(&config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("dockhandd: failed to initialize logging: {err}");
            std::process::exit(EXIT_STARTUP_FAILED);
        }
    };

    let code = run(config).await;
    drop(log_guard);
    std::process::exit(code);
}

async fn run(config: Config) -> i32 {
    let _lock = match procguard::acquire(&config) {
        Ok(lock) => lock,
        Err(err) => {
            eprintln!("dockhandd: {err}");
            return EXIT_STARTUP_FAILED;
        }
    };

    let app = match app::build(&config).await {
        Ok(app) => std::sync::Arc::new(app),
        Err(err) => {
            error!(%err, "failed to assemble daemon state");
            procguard::cleanup(&config);
            return EXIT_STARTUP_FAILED;
        }
    };

    let tcp_addr = config.transport.tcp_port.map(|port| format!("127.0.0.1:{port}"));
    let transport = match transport::Transport::bind(&config.socket_path(), tcp_addr.as_deref(), app).await {
        Ok(transport) => transport,
        Err(err) => {
            error!(%err, "failed to bind transport");
            procguard::cleanup(&config);
            return EXIT_RUNTIME_FAILED;
        }
    };

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(err) => {
            error!(%err, "failed to install SIGTERM handler");
            procguard::cleanup(&config);
            return EXIT_RUNTIME_FAILED;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(err) => {
            error!(%err, "failed to install SIGINT handler");
            procguard::cleanup(&config);
            return EXIT_RUNTIME_FAILED;
        }
    };

    let shutdown = CancellationToken::new();
    let transport_task = tokio::spawn(transport.run(shutdown.clone()));

    info!(socket = %config.socket_path().display(), "dockhandd ready");
    println!("READY");

    let exit_code = tokio::select! {
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
            EXIT_SIGNALLED
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down");
            EXIT_SIGNALLED
        }
    };

    shutdown.cancel();
    if let Err(err) = transport_task.await {
        error!(%err, "transport task panicked");
    }

    procguard::cleanup(&config);
    info!("dockhandd stopped");
    exit_code
}
