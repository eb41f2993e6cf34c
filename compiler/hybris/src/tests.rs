use hybris_eval::{buffer_handler, Completion, EvalErrorKind};
use pretty_assertions::assert_eq;

use super::*;

type Outcome = (Result<Completion, RunError>, String);

fn run(source: &str) -> Outcome {
    run_with(source, &Config::default(), &[])
}

fn run_with(source: &str, config: &Config, argv: &[String]) -> Outcome {
    let print = buffer_handler();
    let result = run_source(source, config, argv, print.clone());
    (result, print.get_output())
}

#[test]
fn statements_run_before_a_later_syntax_error() {
    let (result, output) = run("println(\"first\"); x = ;");
    assert_eq!(output, "first\n");
    assert!(matches!(result, Err(RunError::Parse(_))));
}

#[test]
fn lexical_errors_stop_before_running() {
    let (result, output) = run("println(\"first\"); x = 1 @ 2;");
    assert_eq!(output, "");
    assert!(matches!(result, Err(RunError::Parse(_))));
}

#[test]
fn unterminated_comment_stops_before_running() {
    let (result, output) = run("println(\"first\"); /* no end");
    assert_eq!(output, "");
    let Err(err) = result else {
        panic!("expected a lexical error");
    };
    assert!(err.to_string().contains("unterminated block comment"), "{err}");
}

#[test]
fn top_level_return_stops_the_script() {
    let (result, output) = run("println(1); return 7; println(2);");
    assert_eq!(output, "1\n");
    let Ok(Completion::Return(value)) = result else {
        panic!("expected a return completion, got {result:?}");
    };
    assert_eq!(value.read().to_string(), "7");
}

#[test]
fn script_arguments_are_visible() {
    let argv = vec!["main.hy".to_string(), "x".to_string()];
    let (result, output) = run_with("println(argc, \" \", argv[1]);", &Config::default(), &argv);
    result.unwrap();
    assert_eq!(output, "2 x\n");
}

#[test]
fn unjoined_threads_finish_before_returning() {
    let source = "
        function work() { i = 0; while (i < 100) { i++; } println(\"done\"); }
        pthread_create(work);
    ";
    let (result, output) = run(source);
    result.unwrap();
    assert_eq!(output, "done\n");
}

#[test]
fn recursion_limit_comes_from_the_config() {
    let config = Config {
        max_recursion_depth: 16,
        ..Config::default()
    };
    let (result, _) = run_with("function f(n) { return f(n + 1); } f(0);", &config, &[]);
    let Err(RunError::Eval(err)) = result else {
        panic!("expected an engine error");
    };
    assert!(matches!(err.kind, EvalErrorKind::RecursionLimit { limit: 16 }));
}

#[test]
fn stack_trace_is_attached_when_enabled() {
    let config = Config {
        stack_trace: true,
        ..Config::default()
    };
    let (result, _) = run_with("function f() { return 1 / 0; } f();", &config, &[]);
    let Err(RunError::Eval(err)) = result else {
        panic!("expected an engine error");
    };
    let backtrace = err.backtrace.expect("backtrace attached");
    assert_eq!(backtrace.frames()[0].name, "f");
}

#[test]
fn missing_file_is_an_io_error() {
    let err = run_file(Path::new("/nonexistent/script.hy"), &Config::default(), &[]).unwrap_err();
    assert!(matches!(err, RunError::Io { .. }));
    assert!(err.to_string().starts_with("cannot read '/nonexistent/script.hy'"));
}
