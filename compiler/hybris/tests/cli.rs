// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Tests of the `hybris` binary: exit codes, stdout and error reports.

use std::io::Write;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn script(source: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".hy").tempfile().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn hybris(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hybris"))
        .args(args)
        .env_remove("HYBRIS_LOG")
        .output()
        .expect("spawn hybris")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn runs_a_script_file() {
    let file = script("function add(a, b) { return a + b; }\nprintln(add(2, 3));\n");
    let path = file.path().to_str().unwrap();

    let output = hybris(&["run", path]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "5\n");

    let shorthand = hybris(&[path]);
    assert_eq!(stdout(&shorthand), "5\n");
}

#[test]
fn passes_arguments_to_the_script() {
    let file = script("println(argc, \" \", argv[1], \" \", argv[2]);\n");
    let path = file.path().to_str().unwrap();

    let output = hybris(&["run", path, "one", "--", "--two"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "3 one --two\n");
}

#[test]
fn unhandled_exception_exits_with_failure() {
    let file = script("println(\"start\");\nthrow \"boom\";\n");
    let path = file.path().to_str().unwrap();

    let output = hybris(&["run", path]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "start\n");
    let report = stderr(&output);
    assert!(report.starts_with("unhandled exception: boom\n"), "{report}");
    assert!(report.contains(":2:1"), "{report}");
}

#[test]
fn trace_flag_prints_the_call_stack() {
    let file = script("function f() { return 1 / 0; }\nf();\n");
    let path = file.path().to_str().unwrap();

    let output = hybris(&["run", "--trace", path]);
    assert_eq!(output.status.code(), Some(1));
    let report = stderr(&output);
    assert!(report.starts_with("error: division by zero\n"), "{report}");
    assert!(report.contains("stack trace:\n  0: f"), "{report}");
}

#[test]
fn syntax_errors_are_reported() {
    let file = script("x = ;\n");
    let output = hybris(&["run", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: parse error:"), "{}", stderr(&output));
}

#[test]
fn missing_file_and_bad_options() {
    let output = hybris(&["run", "/nonexistent/script.hy"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: cannot read"));

    let output = hybris(&["run", "--fast", "main.hy"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: unknown option '--fast'"));
}

#[test]
fn lex_and_parse_commands_dump_the_front_end() {
    let file = script("x = 1;\n");
    let path = file.path().to_str().unwrap();

    let lexed = hybris(&["lex", path]);
    assert!(lexed.status.success());
    assert_eq!(stdout(&lexed).lines().count(), 4);
    assert!(stdout(&lexed).starts_with("1:1\t"));

    let parsed = hybris(&["parse", path]);
    assert!(parsed.status.success());
    assert!(stdout(&parsed).contains("Assign"), "{}", stdout(&parsed));
}
