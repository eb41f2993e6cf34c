use std::path::PathBuf;

use pretty_assertions::assert_eq;

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

#[test]
fn defaults_follow_the_runtime() {
    let config = Config::default();
    assert_eq!(config.runtime(), RuntimeConfig::default());
    assert!(!config.print_ast);
}

#[test]
fn path_only() {
    let options = parse_run_options(&args(&["main.hy"])).unwrap();
    assert_eq!(options.path, PathBuf::from("main.hy"));
    assert_eq!(options.config, Config::default());
    assert!(options.script_args.is_empty());
}

#[test]
fn all_flags() {
    let options = parse_run_options(&args(&[
        "--gc-threshold=10",
        "--max-depth=64",
        "--trace",
        "--print-ast",
        "main.hy",
    ]))
    .unwrap();
    assert_eq!(
        options.config,
        Config {
            gc_threshold: 10,
            max_recursion_depth: 64,
            stack_trace: true,
            print_ast: true,
        }
    );
}

#[test]
fn script_arguments_after_path_and_separator() {
    let options = parse_run_options(&args(&["main.hy", "a", "--", "--trace", "b"])).unwrap();
    assert_eq!(options.script_args, args(&["a", "--trace", "b"]));
    assert!(!options.config.stack_trace);
    assert_eq!(options.argv(), args(&["main.hy", "a", "--trace", "b"]));
}

#[test]
fn missing_path() {
    assert_eq!(parse_run_options(&args(&["--trace"])), Err(UsageError::MissingPath));
}

#[test]
fn unknown_option() {
    assert_eq!(
        parse_run_options(&args(&["--fast", "main.hy"])),
        Err(UsageError::UnknownOption("--fast".to_string()))
    );
}

#[test]
fn invalid_number() {
    let err = parse_run_options(&args(&["--max-depth=deep", "main.hy"])).unwrap_err();
    assert_eq!(err.to_string(), "invalid value 'deep' for --max-depth");
}
