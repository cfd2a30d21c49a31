#![allow(dead_code)]

use assert_cmd::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use std::process::Command;

/// `qbank` with an isolated config lookup: the working directory and the
/// user config dir both point into `dir`.
pub fn qbank_in(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("qbank").expect("qbank binary is built");
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .env_remove("SOURCE_DATE_EPOCH")
        .env("NO_COLOR", "1");
    cmd
}

pub fn question(id: &str, task: &str, stem: &str) -> Value {
    json!({
        "id": id,
        "taskId": task,
        "stem": stem,
        "choices": [
            {"id": "A", "text": "Постоянный ток"},
            {"id": "B", "text": "Переменный ток"}
        ],
        "correctId": "A",
        "difficulty": 2
    })
}

pub fn write_json(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Parse the single JSON document a `--format json` run prints on stdout.
pub fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{stdout}"))
}

fn has_ansi(s: &str) -> bool {
    s.bytes().any(|b| b == 0x1B)
}

/// Substring check that prints the head of the haystack on failure.
pub fn assert_contains_with_context(haystack: &str, needle: &str, context_msg: &str) {
    if haystack.contains(needle) {
        return;
    }
    let head = haystack.lines().take(10).collect::<Vec<_>>().join("\n");
    panic!(
        "{}\n--- needle ---\n{}\n--- head(10) ---\n{}",
        context_msg, needle, head
    );
}

/// Fail when `s` carries ANSI escapes (for `--no-color`).
pub fn assert_no_ansi(s: &str, context_msg: &str) {
    if has_ansi(s) {
        let sample = s.lines().take(8).collect::<Vec<_>>().join("\n");
        panic!(
            "{}\nANSI escapes detected\n--- sample (first 8 lines) ---\n{}",
            context_msg, sample
        );
    }
}
