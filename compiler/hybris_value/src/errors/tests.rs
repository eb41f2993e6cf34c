use super::*;
use pretty_assertions::assert_eq;

#[test]
fn me_gets_special_message() {
    let err = undeclared_identifier("me");
    assert_eq!(err.kind, EvalErrorKind::MeOutsideInstance);
    assert_eq!(err.category(), ErrorCategory::Syntax);
}

#[test]
fn arity_message_mentions_variadic_minimum() {
    assert_eq!(
        arity_mismatch("f", 2, true, 1).message,
        "'f' requires at least 2 arguments, 1 given"
    );
    assert_eq!(
        arity_mismatch("g", 1, false, 3).message,
        "'g' requires 1 argument, 3 given"
    );
}

#[test]
fn categories() {
    assert_eq!(recursion_limit(10).category(), ErrorCategory::Generic);
    assert_eq!(invalid_range("int", "char").category(), ErrorCategory::Type);
    assert_eq!(
        unsupported_operation("+", "alias").category(),
        ErrorCategory::Unsupported
    );
    assert_eq!(unhandled_exception("boom").category(), ErrorCategory::Exception);
}

#[test]
fn display_prefixes_category() {
    let err = unsupported_operation("-", "string");
    assert_eq!(
        err.to_string(),
        "unsupported operation: '-' operator not supported for type 'string'"
    );
}

#[test]
fn unhandled_exception_shows_the_value_once() {
    assert_eq!(unhandled_exception("boom").to_string(), "unhandled exception: boom");
}

#[test]
fn first_span_wins() {
    let err = division_by_zero()
        .with_span(Span::new(1, 2))
        .with_span(Span::new(5, 9));
    assert_eq!(err.span, Some(Span::new(1, 2)));
}

#[test]
fn backtrace_display() {
    let bt = EvalBacktrace::new(vec![
        BacktraceFrame {
            name: "inner".to_string(),
            span: Some(Span::new(10, 20)),
        },
        BacktraceFrame {
            name: "outer".to_string(),
            span: None,
        },
    ]);
    assert_eq!(bt.len(), 2);
    assert_eq!(bt.to_string(), "stack trace:\n  0: inner at 10..20\n  1: outer\n");
}
