//! CLI tests for `checkrun run` and `checkrun formatters`.
//!
//! Spawns the checkrun binary in a throwaway workspace and verifies exit codes
//! and printed output.

use std::path::Path;
use std::process::{Command, Output};

use checkrun::exit_codes;
use checkrun::test_support::TestWorkspace;

const TEXT_CONFIG: &str = r#"
extensions = ["txt"]

[[scope]]
title = "docs"

[[scope.checkers]]
type = "text"
title = "style"
final_newline = true
trailing_whitespace = true
"#;

fn checkrun(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_checkrun"))
        .current_dir(dir)
        .env_remove("NO_COLOR")
        .args(args)
        .output()
        .expect("spawn checkrun")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn clean_targets_exit_ok() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("checkrun.toml", TEXT_CONFIG).expect("write");
    ws.write("notes/a.txt", "fine\n").expect("write");

    let output = checkrun(ws.path(), &["run", "--no-colors"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("  1 passing ("), "{out}");
    assert!(!out.contains("problem"), "{out}");
}

#[test]
fn error_diagnostics_exit_with_failures() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("checkrun.toml", TEXT_CONFIG).expect("write");
    ws.write("a.txt", "no newline").expect("write");
    ws.write("b.txt", "trailing \n").expect("write");

    let output = checkrun(ws.path(), &["run", "--no-colors"]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILURES));
    let out = stdout(&output);
    assert!(
        out.contains("a.txt: line 1, col 11, Error - Missing line feed at file end (final-newline)"),
        "{out}"
    );
    assert!(
        out.contains("b.txt: line 1, col 9, Error - Illegal trailing whitespace (trailing-whitespace)"),
        "{out}"
    );
    assert!(out.contains("\n2 problems"), "{out}");
    assert!(out.contains("1 passing"), "{out}");
}

#[test]
fn json_formatter_prints_machine_readable_results() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("checkrun.toml", TEXT_CONFIG).expect("write");
    ws.write("a.txt", "no newline").expect("write");

    let output = checkrun(ws.path(), &["run", "-F", "json", "a.txt"]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILURES));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(value["summary"]["errors"], 1);
    assert_eq!(value["results"][0]["rule_id"], "final-newline");
    assert_eq!(value["results"][0]["checker"], "docs style");
    assert!(stderr(&output).contains("1 passing"));
}

#[test]
fn silent_prints_nothing() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("checkrun.toml", TEXT_CONFIG).expect("write");
    ws.write("a.txt", "no newline").expect("write");

    let output = checkrun(ws.path(), &["run", "--silent"]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILURES));
    assert!(output.stdout.is_empty());
}

#[test]
fn explicit_config_and_cwd() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("conf/lint.toml", TEXT_CONFIG).expect("write");
    ws.write("project/a.txt", "ok\n").expect("write");

    let project = ws.path().join("project");
    let config = ws.path().join("conf/lint.toml");
    let output = checkrun(
        ws.path(),
        &[
            "run",
            "--cwd",
            project.to_str().expect("utf8 path"),
            "-c",
            config.to_str().expect("utf8 path"),
        ],
    );
    assert_eq!(output.status.code(), Some(exit_codes::OK), "{}", stderr(&output));
}

#[test]
fn missing_configuration_is_invalid() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("a.txt", "x\n").expect("write");

    let output = checkrun(ws.path(), &["run"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(stderr(&output).contains("no checkers declared"));
}

#[test]
fn unknown_formatter_is_invalid() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("checkrun.toml", TEXT_CONFIG).expect("write");

    let output = checkrun(ws.path(), &["run", "-F", "tap"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(stderr(&output).contains("invalid formatter \"tap\""));
}

#[test]
fn unresolvable_target_is_invalid() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("checkrun.toml", TEXT_CONFIG).expect("write");

    let output = checkrun(ws.path(), &["run", "missing/*.txt"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(stderr(&output).contains("cannot resolve path (or pattern)"));
}

#[test]
fn grep_narrows_the_run() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write(
        "checkrun.toml",
        r#"
[[scope]]
title = "data"

[[scope.checkers]]
type = "json"
title = "package"
required = ["name"]

[[scope.checkers]]
type = "text"
title = "lines"
maximum_line_length = 80
"#,
    )
    .expect("write");
    ws.write("pkg.json", "{\"version\": 1}\n").expect("write");

    let all = checkrun(ws.path(), &["run", "--no-colors", "pkg.json"]);
    assert_eq!(all.status.code(), Some(exit_codes::FAILURES));
    assert!(stdout(&all).contains("Missing required key 'name'"));

    let lines_only = checkrun(ws.path(), &["run", "--no-colors", "-g", "lines$", "pkg.json"]);
    assert_eq!(lines_only.status.code(), Some(exit_codes::OK));
    assert!(stdout(&lines_only).contains("1 passing"));

    let inverted = checkrun(
        ws.path(),
        &["run", "--no-colors", "-f", "package", "-i", "pkg.json"],
    );
    assert_eq!(inverted.status.code(), Some(exit_codes::OK));
}

#[test]
fn scope_excludes_filter_targets() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write(
        "checkrun.toml",
        r#"
extensions = ["txt"]

[[scope]]
title = "docs"
excludes = ["vendor/**"]

[[scope.checkers]]
type = "text"
final_newline = true
"#,
    )
    .expect("write");
    ws.write("a.txt", "ok\n").expect("write");
    ws.write("vendor/b.txt", "no newline").expect("write");

    let output = checkrun(ws.path(), &["run", "--no-colors"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK), "{}", stdout(&output));
}

#[cfg(unix)]
#[test]
fn failing_hook_is_reported_and_fails_the_run() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write(
        "checkrun.toml",
        r#"
[[scope]]
title = "docs"

[[scope.hooks]]
stage = "before_all"
name = "prepare"
command = ["sh", "-c", "echo not ready; exit 3"]

[[scope.checkers]]
type = "text"
"#,
    )
    .expect("write");
    ws.write("a.txt", "ok\n").expect("write");

    let output = checkrun(ws.path(), &["run", "--no-colors", "a.txt"]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILURES));
    let out = stdout(&output);
    assert!(out.contains("  0 passing"), "{out}");
    assert!(out.contains("  1 failing"), "{out}");
    assert!(out.contains("1) docs \"before all\" hook: prepare:"), "{out}");
    assert!(out.contains("exit code 3: not ready"), "{out}");
}

#[cfg(unix)]
#[test]
fn hook_commands_see_context_fixtures() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write(
        "checkrun.toml",
        r#"
[[scope]]
title = "docs"
fixtures = { owner = "docs-team" }

[[scope.hooks]]
stage = "before_each"
command = ["sh", "-c", "test \"$CHECKRUN_CTX_OWNER\" = docs-team && test \"$CHECKRUN_CHECKER\" = text"]

[[scope.checkers]]
type = "text"
"#,
    )
    .expect("write");
    ws.write("a.txt", "ok\n").expect("write");

    let output = checkrun(ws.path(), &["run", "--no-colors", "a.txt"]);
    assert_eq!(
        output.status.code(),
        Some(exit_codes::OK),
        "{}",
        stdout(&output)
    );
}

#[test]
fn formatters_are_listed() {
    let ws = TestWorkspace::new().expect("workspace");
    let output = checkrun(ws.path(), &["formatters"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let out = stdout(&output);
    assert!(out.contains("compact - default formatter"));
    assert!(out.contains("json - "));
}
