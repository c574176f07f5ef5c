//! End-to-end tests for the `lumenc` binary.
//!
//! Each test writes a program as JSON into a temporary directory, runs the
//! compiled driver on it and inspects the exit code and stderr.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use lumen_ast::{Builder, Module, Program};

// ── Helpers ────────────────────────────────────────────────────────────

fn lumenc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lumenc"))
}

/// Write `modules` as `program.json` inside `dir`.
fn write_program(dir: &Path, modules: Vec<Module>) -> PathBuf {
    let path = dir.join("program.json");
    let json = serde_json::to_string(&Program { modules }).unwrap();
    std::fs::write(&path, json).unwrap();
    path
}

fn run(args: &[&str], program: &Path) -> Output {
    lumenc()
        .args(args)
        .arg(program)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run lumenc")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn area_module(b: &Builder) -> Module {
    let area = b.function_def(
        "area",
        vec![b.param("w", Some(b.ty("i32"))), b.param("h", Some(b.ty("i32")))],
        Some(b.ty("i32")),
        vec![b.expr_stmt(b.int(0))],
    );
    b.module_in("geo", "geo.lm", vec![], vec![b.item(area)])
}

fn broken_module(b: &Builder, path: &str) -> Module {
    b.module_in("app", path, vec![], vec![b.break_stmt(None, None)])
}

// ── Exit codes ─────────────────────────────────────────────────────────

#[test]
fn clean_program_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let b = Builder::new();
    let program = write_program(dir.path(), vec![area_module(&b)]);
    let output = run(&[], &program);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).is_empty(), "stderr: {}", stderr(&output));
}

#[test]
fn diagnostics_exit_one() {
    let dir = tempfile::tempdir().unwrap();
    let b = Builder::new();
    let program = write_program(dir.path(), vec![broken_module(&b, "missing/app.lm")]);
    let output = run(&["--no-color"], &program);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(
        err.contains("missing/app.lm:1:1: typechecker: break statement must appear inside a loop"),
        "stderr: {err}"
    );
}

#[test]
fn import_cycle_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let b = Builder::new();
    let a = b.module_in("a", "a.lm", vec![b.import("b", vec![])], vec![]);
    let other = b.module_in("b", "b.lm", vec![b.import("a", vec![])], vec![]);
    let program = write_program(dir.path(), vec![a, other]);
    let output = run(&[], &program);
    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).starts_with("error: typechecker: import cycle detected:"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn unreadable_program_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&[], &dir.path().join("absent.json"));
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).starts_with("error: failed to read"), "stderr: {}", stderr(&output));
}

#[test]
fn malformed_program_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.json");
    std::fs::write(&path, "{ not json").unwrap();
    let output = run(&[], &path);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("failed to parse program"), "stderr: {}", stderr(&output));
}

// ── Output formats ─────────────────────────────────────────────────────

#[test]
fn json_diagnostics_one_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let b = Builder::new();
    let program = write_program(dir.path(), vec![broken_module(&b, "app.lm")]);
    let output = run(&["--json"], &program);
    assert_eq!(output.status.code(), Some(1));

    let err = stderr(&output);
    let lines: Vec<&str> = err.lines().collect();
    assert_eq!(lines.len(), 1, "stderr: {err}");
    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(value["code"], "E0008");
    assert_eq!(value["package"], "app");
    assert_eq!(value["path"], "app.lm");
    assert_eq!(value["line"], 1);
}

#[test]
fn json_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&["--json"], &dir.path().join("absent.json"));
    assert_eq!(output.status.code(), Some(2));
    let value: serde_json::Value = serde_json::from_str(stderr(&output).trim()).unwrap();
    assert_eq!(value["severity"], "fatal");
}

#[test]
fn source_reports_when_the_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("app.lm");
    std::fs::write(&source, "break\n").unwrap();
    let b = Builder::new();
    let program = write_program(dir.path(), vec![broken_module(&b, source.to_str().unwrap())]);
    let output = lumenc()
        .arg("--no-color")
        .arg("--root")
        .arg(dir.path())
        .arg(&program)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("E0008"), "stderr: {err}");
    assert!(err.contains("break statement must appear inside a loop"), "stderr: {err}");
    assert!(err.contains("app.lm"), "stderr: {err}");
    assert!(!err.contains(dir.path().to_str().unwrap()), "stderr: {err}");
}

// ── Summaries and configuration ────────────────────────────────────────

#[test]
fn emit_summary_writes_packages() {
    let dir = tempfile::tempdir().unwrap();
    let b = Builder::new();
    let program = write_program(dir.path(), vec![area_module(&b)]);
    let summary_path = dir.path().join("summary.json");
    let output = run(&["--emit-summary", summary_path.to_str().unwrap()], &program);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let summaries: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summaries[0]["package"], "geo");
    assert_eq!(summaries[0]["symbols"]["area"], "fn(i32, i32) -> i32");
}

#[test]
fn config_file_beside_the_program_is_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lumen.toml"), "[diagnostics]\ncolour = false\n").unwrap();
    let b = Builder::new();
    let program = write_program(dir.path(), vec![area_module(&b)]);
    let output = run(&[], &program);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("lumen.toml"), "stderr: {}", stderr(&output));
}

#[test]
fn explicit_config_sets_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("settings.toml");
    std::fs::write(&config, "[diagnostics]\nroot = \"project\"\ncolor = false\n").unwrap();
    let b = Builder::new();
    let program = write_program(dir.path(), vec![broken_module(&b, "project/src/app.lm")]);
    let output = run(&["--config", config.to_str().unwrap()], &program);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("src/app.lm:1:1:"), "stderr: {err}");
    assert!(!err.contains("project/src"), "stderr: {err}");
}
