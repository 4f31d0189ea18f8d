// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::client::DaemonClient;
use crate::output::{format_or_json, format_time_ago, handle_list, OutputFormat};
use clap::Subcommand;
use dh_wire::{Method, SessionDetail, SessionSummary};
use std::io::Write;

#[derive(Subcommand)]
pub enum SessionsCommand {
    /// List active sessions.
    List,
    /// Show a session's stage progress and error history.
    Get { id: String },
    /// Delete a session and release its workspace.
    Delete { id: String },
}

pub async fn run(command: SessionsCommand, client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        SessionsCommand::List => list(client, format).await,
        SessionsCommand::Get { id } => get(id, client, format).await,
        SessionsCommand::Delete { id } => delete(id, client, format).await,
    }
}

async fn list(client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    let result = client.call(Method::SessionsList).await?;
    let entries: Vec<SessionSummary> = serde_json::from_value(result)?;
    handle_list(format, &entries, "No active sessions", |entries, w: &mut dyn Write| {
        for entry in entries {
            let _ = writeln!(
                w,
                "{}  {} stage(s) done, {} error(s), last updated {}",
                crate::color::header(&entry.id),
                entry.stages_done,
                entry.error_count,
                format_time_ago(entry.updated_at_ms),
            );
        }
    })
}

async fn get(id: String, client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    let result = client.call(Method::SessionsGet { id }).await?;
    let detail: SessionDetail = serde_json::from_value(result)?;
    format_or_json(format, &detail, || {
        println!("session {}", crate::color::header(&detail.id));
        println!("workspace  {}", detail.workspace_id);
        println!("created    {} ago", format_time_ago(detail.created_at_ms));
        println!("updated    {} ago", format_time_ago(detail.updated_at_ms));
        println!();
        println!("stages:");
        for stage in &detail.stages {
            let mark = if stage.done { "x" } else { " " };
            println!("  [{mark}] {}", stage.stage);
        }
        if !detail.errors.is_empty() {
            println!();
            println!("errors:");
            for err in &detail.errors {
                println!("  {} {}", crate::color::header(&err.kind), err.message);
            }
        }
    })
}

async fn delete(id: String, client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    let id_for_message = id.clone();
    let result = client.call(Method::SessionsDelete { id }).await?;
    format_or_json(format, &result, || {
        println!("session {} deleted", crate::color::header(&id_for_message));
    })
}
