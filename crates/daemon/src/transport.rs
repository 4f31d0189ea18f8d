// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accept loop for the daemon's Unix socket (and, if configured, a
//! loopback TCP listener). Each accepted connection is handed to
//! [`crate::connection::serve`] on its own task; the loop itself exits
//! as soon as `shutdown` is cancelled.

use crate::app::AppContext;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind unix socket at {path}: {source}")]
    BindUnix { path: PathBuf, source: std::io::Error },
    #[error("failed to bind tcp listener on {addr}: {source}")]
    BindTcp { addr: String, source: std::io::Error },
}

pub struct Transport {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    app: Arc<AppContext>,
}

impl Transport {
    /// Bind the Unix socket at `socket_path`, removing a stale socket
    /// file left behind by a process that did not clean up after itself.
    pub async fn bind(socket_path: &std::path::Path, tcp_addr: Option<&str>, app: Arc<AppContext>) -> Result<Self, TransportError> {
        if socket_path.exists() {
            let _ = std::fs::remove_file(socket_path);
        }
        let unix = UnixListener::bind(socket_path)
            .map_err(|source| TransportError::BindUnix { path: socket_path.to_path_buf(), source })?;

        let tcp = match tcp_addr {
            Some(addr) => Some(
                TcpListener::bind(addr)
                    .await
                    .map_err(|source| TransportError::BindTcp { addr: addr.to_string(), source })?,
            ),
            None => None,
        };

        Ok(Self { unix, tcp, app })
    }

    /// Accept connections until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        match self.tcp {
            Some(tcp) => self.run_dual(tcp, shutdown).await,
            None => self.run_unix_only(shutdown).await,
        }
    }

    async fn run_unix_only(self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("transport shutting down");
                    return;
                }
                accepted = self.unix.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => spawn_connection(stream, self.app.clone()),
                        Err(err) => error!(%err, "unix accept error"),
                    }
                }
            }
        }
    }

    async fn run_dual(self, tcp: TcpListener, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("transport shutting down");
                    return;
                }
                accepted = self.unix.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => spawn_connection(stream, self.app.clone()),
                        Err(err) => error!(%err, "unix accept error"),
                    }
                }
                accepted = tcp.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!(%addr, "tcp connection accepted");
                            spawn_connection(stream, self.app.clone());
                        }
                        Err(err) => error!(%err, "tcp accept error"),
                    }
                }
            }
        }
    }
}

fn spawn_connection<S>(stream: S, app: Arc<AppContext>)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    tokio::spawn(async move {
        crate::connection::serve(reader, writer, app).await;
    });
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
