// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn tools_call_round_trips_through_json() {
    let req = Request::new(
        "req-1",
        Method::ToolsCall {
            name: "build_image".to_string(),
            arguments: serde_json::json!({"dry_run": true}),
            session_id: Some("ses-abc".to_string()),
        },
    );
    let json = serde_json::to_string(&req).expect("serialize failed");
    assert!(json.contains("\"method\":\"tools/call\""));
    let back: Request = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(back, req);
    assert_eq!(back.method.name(), "tools/call");
}

#[test]
fn unit_variant_methods_omit_params() {
    let req = Request::new("req-2", Method::ServerStatus);
    let value = serde_json::to_value(&req).expect("serialize failed");
    assert_eq!(value["method"], "server/status");
    assert!(value.get("params").is_none() || value["params"].is_null());
}

#[test]
fn unknown_method_name_fails_to_parse() {
    let raw = r#"{"id":"req-3","method":"tools/delete","params":{}}"#;
    let result: Result<Request, _> = serde_json::from_str(raw);
    assert!(result.is_err());
}
