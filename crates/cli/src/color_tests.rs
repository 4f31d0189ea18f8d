// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn no_color_env_var_disables_colorization() {
    std::env::set_var("NO_COLOR", "1");
    std::env::remove_var("COLOR");
    assert!(!should_colorize());
    std::env::remove_var("NO_COLOR");
}

#[test]
fn color_env_var_forces_colorization() {
    std::env::remove_var("NO_COLOR");
    std::env::set_var("COLOR", "1");
    assert!(should_colorize());
    std::env::remove_var("COLOR");
}

#[test]
fn plain_text_passthrough_without_colorization() {
    std::env::set_var("NO_COLOR", "1");
    assert_eq!(header("hello"), "hello");
    assert_eq!(literal("hello"), "hello");
    std::env::remove_var("NO_COLOR");
}
