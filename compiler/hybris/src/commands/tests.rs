use std::path::Path;

use hybris_ir::Span;
use hybris_value::{
    division_by_zero, recursion_limit, unhandled_exception, BacktraceFrame, EvalBacktrace,
};
use pretty_assertions::assert_eq;

use super::render_error;
use crate::RunError;

#[test]
fn engine_errors_show_location() {
    let source = "x = 1;\ny = x / 0;\n";
    let err = RunError::Eval(division_by_zero().with_span(Span::new(11, 16)));
    assert_eq!(
        render_error(&err, Path::new("main.hy"), Some(source)),
        "error: division by zero\n  --> main.hy:2:5\n"
    );
}

#[test]
fn unhandled_exception_leads_with_its_category() {
    let err = RunError::Eval(unhandled_exception("boom"));
    assert_eq!(render_error(&err, Path::new("main.hy"), None), "unhandled exception: boom\n");
}

#[test]
fn recursion_limit_suggests_the_flag() {
    let err = RunError::Eval(recursion_limit(8));
    let rendered = render_error(&err, Path::new("main.hy"), None);
    assert!(rendered.ends_with("  = note: raise the limit with --max-depth=N\n"), "{rendered}");
}

#[test]
fn backtrace_follows_the_message() {
    let backtrace = EvalBacktrace::new(vec![BacktraceFrame {
        name: "f".to_string(),
        span: None,
    }]);
    let err = RunError::Eval(division_by_zero().with_backtrace(backtrace));
    assert_eq!(
        render_error(&err, Path::new("main.hy"), None),
        "error: division by zero\nstack trace:\n  0: f\n"
    );
}

#[test]
fn other_failures_get_an_error_prefix() {
    let err = RunError::Io {
        path: "gone.hy".into(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    };
    assert_eq!(
        render_error(&err, Path::new("gone.hy"), None),
        "error: cannot read 'gone.hy': not found\n"
    );
}
