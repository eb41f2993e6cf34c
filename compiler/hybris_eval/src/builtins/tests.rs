use hybris_parse::parse_program;
use hybris_value::{EvalErrorKind, EvalResult};
use pretty_assertions::assert_eq;

use super::BuiltinRegistry;
use crate::interpreter::InterpreterBuilder;
use crate::print_handler::buffer_handler;

fn run(source: &str) -> (EvalResult<()>, String) {
    let print = buffer_handler();
    let mut interpreter = InterpreterBuilder::new()
        .print_handler(print.clone())
        .build();
    let program = parse_program(source).unwrap_or_else(|e| panic!("parse error: {e:?}"));
    let result = program
        .iter()
        .try_for_each(|node| interpreter.execute(node).map(|_| ()));
    (result, print.get_output())
}

fn output(source: &str) -> String {
    let (result, out) = run(source);
    if let Err(err) = result {
        panic!("script failed: {err}");
    }
    out
}

fn error_kind(source: &str) -> EvalErrorKind {
    match run(source).0 {
        Ok(()) => panic!("expected an error from {source:?}"),
        Err(err) => err.kind,
    }
}

#[test]
fn default_library_is_registered() {
    let registry = BuiltinRegistry::with_defaults();
    for name in [
        "print", "println", "typeof", "toint", "tofloat", "tostring", "tochar", "binary", "call",
        "gc", "size", "push", "pop", "remove", "contains", "map", "unmap", "ismapped", "keys",
        "values", "matrix", "pthread_create", "pthread_join", "pthread_exit", "dllopen", "dlllink",
        "dllcall",
    ] {
        assert!(registry.contains(name), "missing builtin {name}");
    }
    let names = registry.names();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert!(BuiltinRegistry::new().is_empty());
}

#[test]
fn print_concatenates_display_forms() {
    assert_eq!(
        output(r#"print("a", 1, 2.5, 'c', true); println(); println([1, "x"]);"#),
        "a12.5ctrue\n[1, \"x\"]\n"
    );
}

#[test]
fn typeof_names_kinds_and_declared_types() {
    let source = r#"
        struct Pair { a, b; }
        println(typeof(1), " ", typeof(1.5), " ", typeof("s"), " ", typeof([1]));
        println(typeof(new Pair()));
    "#;
    assert_eq!(output(source), "int float string vector\nPair\n");
}

#[test]
fn conversions() {
    let source = r#"
        println(toint("42") + 1, " ", toint(3.9), " ", tofloat(2), " ", tostring(12) + "!");
        println(tochar(65), tochar("xyz"));
    "#;
    assert_eq!(output(source), "43 3 2.0 12!\nAx\n");
}

#[test]
fn tostring_uses_class_hook() {
    let source = r#"
        class Money { method __to_string() { return "$5"; } }
        m = new Money();
        println(tostring(m) + " each");
    "#;
    assert_eq!(output(source), "$5 each\n");
}

#[test]
fn binary_buffers() {
    assert_eq!(
        output(r#"b = binary([1, 255, 256]); println(b, " ", size(b)); println(binary("hi"));"#),
        "binary(01 ff 00) 3\nbinary(68 69)\n"
    );
}

#[test]
fn vector_builtins() {
    let source = "
        v = [1];
        push(v, 2, 3);
        println(v);
        println(pop(v), \" \", v);
        println(remove(v, 0), \" \", v, \" \", contains(v, 2), contains(v, 9));
    ";
    assert_eq!(output(source), "[1, 2, 3]\n3 [1, 2]\n1 [2] truefalse\n");
}

#[test]
fn map_builtins() {
    let source = r#"
        m = map("a", 1, "b", 2);
        println(keys(m), " ", values(m), " ", ismapped(m, "a"));
        println(unmap(m, "a"), unmap(m, "a"), " ", m);
    "#;
    assert_eq!(
        output(source),
        "[\"a\", \"b\"] [1, 2] true\ntruefalse [\"b\" : 2]\n"
    );
}

#[test]
fn map_requires_key_value_pairs() {
    assert!(matches!(
        error_kind(r#"map("a");"#),
        EvalErrorKind::ArityMismatch { .. }
    ));
}

#[test]
fn matrix_is_zero_filled() {
    assert_eq!(
        output("m = matrix(2, 3); m[1][2] = 7; println(m);"),
        "[[0, 0, 0], [0, 0, 7]]\n"
    );
}

#[test]
fn fixed_arity_builtins_check_argument_count() {
    assert!(matches!(
        error_kind("size();"),
        EvalErrorKind::ArityMismatch {
            expected: 1,
            got: 0,
            ..
        }
    ));
    assert!(matches!(
        error_kind("push([1]);"),
        EvalErrorKind::ArityMismatch { variadic: true, .. }
    ));
}

#[test]
fn size_of_unsized_kind_is_unsupported() {
    assert!(matches!(
        error_kind("size(3);"),
        EvalErrorKind::UnsupportedOperation { .. }
    ));
}

#[test]
fn pthread_join_unknown_id_fails() {
    assert!(matches!(
        error_kind("pthread_join(99);"),
        EvalErrorKind::Thread { .. }
    ));
}

#[test]
fn threads_receive_copies_of_arguments() {
    let source = "
        function fill(v) { push(v, 1); return size(v); }
        v = [];
        t = pthread_create(fill, v);
        println(pthread_join(t), \" \", size(v));
    ";
    assert_eq!(output(source), "1 0\n");
}

#[test]
fn dlllink_unknown_symbol_fails() {
    assert!(matches!(
        error_kind(r#"dlllink(dllopen("libm"), "nope");"#),
        EvalErrorKind::Extern { .. }
    ));
}

#[test]
fn extern_results_are_flagged() {
    let print = buffer_handler();
    let mut interpreter = InterpreterBuilder::new().print_handler(print).build();
    let program = parse_program(r#"f = dlllink(dllopen("libm"), "floor"); r = dllcall(f, 2.7);"#)
        .unwrap_or_else(|e| panic!("parse error: {e:?}"));
    for node in &program {
        interpreter.execute(node).expect("statement runs");
    }
    let global = interpreter.runtime().global().clone();
    let f = global.get("f").expect("f is bound");
    assert!(f.is_extern());
    assert_eq!(global.get("r").expect("r is bound").read().to_string(), "2.0");
}
