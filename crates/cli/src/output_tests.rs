// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn format_time_ago_renders_zero_as_a_dash() {
    assert_eq!(format_time_ago(0), "-");
}

#[test]
fn format_time_ago_buckets_by_unit() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    assert_eq!(format_time_ago(now_ms - 5_000), "5s");
    assert_eq!(format_time_ago(now_ms - 120_000), "2m");
    assert_eq!(format_time_ago(now_ms - 7_200_000), "2h");
    assert_eq!(format_time_ago(now_ms - 172_800_000), "2d");
}

#[test]
fn handle_list_prints_the_empty_message_for_an_empty_slice() {
    let items: Vec<u32> = vec![];
    let result = handle_list(OutputFormat::Text, &items, "nothing here", |_items, _w| {
        panic!("render_text should not run for an empty list");
    });
    assert!(result.is_ok());
}

#[test]
fn handle_list_invokes_render_text_for_a_nonempty_slice() {
    let items = vec![1, 2, 3];
    let mut rendered = false;
    let result = handle_list(OutputFormat::Text, &items, "nothing here", |slice, _w| {
        assert_eq!(slice.len(), 3);
        rendered = true;
    });
    assert!(result.is_ok());
    assert!(rendered);
}
