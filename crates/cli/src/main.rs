// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dockhand`: a thin client for `dockhandd`, speaking `dh-wire` framing
//! over its Unix socket.

mod client;
mod color;
mod commands;
mod exit_error;
mod output;

use clap::Parser;
use client::DaemonClient;
use commands::{jobs::JobsCommand, sessions::SessionsCommand, tools::ToolsCommand};
use exit_error::ExitError;
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockhand", version, about = "Client for the DOCKHAND tool-execution daemon", styles = color::styles())]
struct Cli {
    /// Path to the daemon's Unix socket. Defaults to
    /// `$XDG_RUNTIME_DIR/dockhand/dockhand.sock`.
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Inspect and invoke registered tools.
    Tools {
        #[command(subcommand)]
        command: ToolsCommand,
    },
    /// Inspect and manage sessions.
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },
    /// Inspect background jobs.
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
    /// Show daemon health and load.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let socket_path = cli.socket.unwrap_or_else(DaemonClient::default_socket_path);
    let client = DaemonClient::new(socket_path);

    let result = match cli.command {
        Command::Tools { command } => commands::tools::run(command, &client, cli.format).await,
        Command::Sessions { command } => commands::sessions::run(command, &client, cli.format).await,
        Command::Jobs { command } => commands::jobs::run(command, &client, cli.format).await,
        Command::Status => commands::status::run(&client, cli.format).await,
    };

    if let Err(err) = result {
        let code = err.downcast_ref::<ExitError>().map(|e| e.code).unwrap_or(1);
        eprintln!("dockhand: {err}");
        std::process::exit(code);
    }
}
