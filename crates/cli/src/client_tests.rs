// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dh_wire::{read_request, write_response, RpcError, Response};
use tokio::net::UnixListener;

async fn spawn_echo_server(socket_path: PathBuf, response: Response) {
    let listener = UnixListener::bind(&socket_path).expect("bind echo server");
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let _request = read_request(&mut stream).await.expect("read request");
        write_response(&mut stream, &response).await.expect("write response");
    });
}

#[tokio::test]
async fn call_returns_the_result_on_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("dockhand.sock");
    let response = Response::ok("1", serde_json::json!({"healthy": true}));
    spawn_echo_server(socket_path.clone(), response).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let client = DaemonClient::new(socket_path);
    let result = client.call(Method::ServerStatus).await.expect("call");
    assert_eq!(result["healthy"], serde_json::json!(true));
}

#[tokio::test]
async fn call_surfaces_an_rpc_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("dockhand.sock");
    let err = RpcError::protocol(dh_wire::ProtocolErrorCode::MethodNotFound, "no such method");
    let response = Response::err("1", err);
    spawn_echo_server(socket_path.clone(), response).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let client = DaemonClient::new(socket_path);
    let result = client.call(Method::ServerStatus).await;
    assert!(matches!(result, Err(ClientError::Rpc(_))));
}

#[tokio::test]
async fn call_fails_cleanly_when_nothing_is_listening() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("missing.sock");
    let client = DaemonClient::new(socket_path);
    let result = client.call(Method::ServerStatus).await;
    assert!(matches!(result, Err(ClientError::Connect { .. })));
}
