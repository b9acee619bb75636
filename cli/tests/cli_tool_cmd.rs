//! End-to-end tests: spawn the `weft` binary.
//!
//! Each run gets an empty working directory and XDG config home so no `.env` or user
//! config leaks in, and `LLM_BACKEND=mock` so nothing touches the network.

use std::process::{Command, Output};

fn run_weft(args: &[&str]) -> Output {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::new(env!("CARGO_BIN_EXE_weft"))
        .args(args)
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env("LLM_BACKEND", "mock")
        .env_remove("LOG_FILE")
        .env_remove("MAX_TURNS")
        .output()
        .expect("failed to run weft binary")
}

#[test]
fn cli_help_succeeds() {
    let out = run_weft(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("weft"));
    assert!(stdout.contains("tool"));
    assert!(stdout.contains("--simulate-tool"));
}

#[test]
fn cli_tool_list_json_succeeds() {
    let out = run_weft(&["--json", "tool", "list"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"get_weather"));
    assert!(names.contains(&"web_search"));
}

#[test]
fn cli_tool_show_existing_succeeds() {
    let out = run_weft(&["tool", "show", "get_weather"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("name: get_weather"));
}

#[test]
fn cli_tool_show_missing_fails() {
    let out = run_weft(&["tool", "show", "no_such_tool"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("tool not found"));
}

/// **Scenario**: the default run uses the mock model and prints the weather round trip.
#[test]
fn cli_mock_run_prints_transcript() {
    let out = run_weft(&["what is the weather in sf?"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("[tool get_weather] It's sunny"));
    assert!(stdout.contains("Final answer using tool output:"));
}

#[test]
fn cli_unknown_backend_fails() {
    let out = run_weft(&["--backend", "nope", "hi"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid configuration"));
}
