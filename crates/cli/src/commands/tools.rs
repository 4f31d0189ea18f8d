// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::client::DaemonClient;
use crate::output::{format_or_json, handle_list, OutputFormat};
use clap::{Args, Subcommand};
use dh_wire::Method;
use std::io::Write;

#[derive(Subcommand)]
pub enum ToolsCommand {
    /// List every tool the daemon has registered, with its argument and result schemas.
    List,
    /// Submit a tool call as a background job and print its initial status.
    Call(CallArgs),
}

#[derive(Args)]
pub struct CallArgs {
    /// Tool name, e.g. `build_image`.
    pub name: String,
    /// Tool arguments as a JSON object. Defaults to `{}`.
    #[arg(long, default_value = "{}")]
    pub args: String,
    /// Attach the call to an existing session instead of creating one.
    #[arg(long)]
    pub session: Option<String>,
}

pub async fn run(command: ToolsCommand, client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        ToolsCommand::List => list(client, format).await,
        ToolsCommand::Call(args) => call(args, client, format).await,
    }
}

async fn list(client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    let result = client.call(Method::ToolsList).await?;
    let entries: Vec<dh_wire::ToolListEntry> = serde_json::from_value(result)?;
    handle_list(format, &entries, "No tools registered", |entries, w: &mut dyn Write| {
        for entry in entries {
            let _ = writeln!(w, "{}  {}", crate::color::header(&entry.name), entry.description);
        }
    })
}

async fn call(args: CallArgs, client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    let arguments: serde_json::Value = serde_json::from_str(&args.args)
        .map_err(|err| anyhow::anyhow!("--args must be a JSON object: {err}"))?;
    let method = Method::ToolsCall { name: args.name, arguments, session_id: args.session };
    let result = client.call(method).await?;
    format_or_json(format, &result, || {
        let job_id = result["job_id"].as_str().unwrap_or("?");
        let status = result["status"].as_str().unwrap_or("?");
        println!("job {} submitted ({})", crate::color::header(job_id), status);
        println!("check progress with `dockhand jobs status {job_id}`");
    })
}
