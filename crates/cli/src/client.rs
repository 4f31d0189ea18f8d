// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin client that speaks `dh-wire` framing to `dockhandd` over a
//! Unix domain socket.

use dh_wire::{decode, encode, read_message, write_message, Method, Request, Response, RpcError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to dockhandd at {path}: {source}\nis the daemon running? start it with `dockhandd`")]
    Connect { path: PathBuf, source: std::io::Error },
    #[error("wire protocol error: {0}")]
    Protocol(#[from] dh_wire::ProtocolError),
    #[error("dockhandd returned an error ({}): {}", .0.code, .0.message)]
    Rpc(RpcError),
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl DaemonClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    /// `$XDG_RUNTIME_DIR/dockhand/dockhand.sock`, falling back to the
    /// system temp directory when no runtime directory is configured.
    pub fn default_socket_path() -> PathBuf {
        let base = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
        base.join("dockhand").join("dockhand.sock")
    }

    pub async fn call(&self, method: Method) -> Result<serde_json::Value, ClientError> {
        let mut stream =
            UnixStream::connect(&self.socket_path).await.map_err(|source| ClientError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed).to_string();
        let request = Request::new(id, method);
        let payload = encode(&request)?;
        write_message(&mut stream, &payload).await?;

        let bytes = read_message(&mut stream).await?;
        let response: Response = decode(&bytes)?;
        match response.error {
            Some(err) => Err(ClientError::Rpc(err)),
            None => Ok(response.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
