// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end scripts run through the driver with a captured print buffer.

use hybris::{run_source, Config, RunError};
use hybris_eval::{buffer_handler, Completion, EvalErrorKind, Value};
use pretty_assertions::assert_eq;

struct Run {
    result: Result<Completion, RunError>,
    output: String,
}

fn run(source: &str) -> Run {
    let print = buffer_handler();
    let result = run_source(source, &Config::default(), &[], print.clone());
    Run {
        result,
        output: print.get_output(),
    }
}

/// Output of a script that must succeed.
fn output(source: &str) -> String {
    let run = run(source);
    if let Err(err) = &run.result {
        panic!("script failed: {err}\noutput so far: {}", run.output);
    }
    run.output
}

fn returned(source: &str) -> Value {
    match run(source).result {
        Ok(Completion::Return(value)) => value.read().clone(),
        other => panic!("expected a top-level return, got {other:?}"),
    }
}

#[test]
fn function_call_returns_sum() {
    let value = returned("function add(a, b) { return a + b; } return add(2, 3);");
    assert!(matches!(value, Value::Integer(5)));
}

#[test]
fn for_loop_breaks_at_second_iteration() {
    let source = "
        for (i = 0; i < 3; i++) {
            println(i);
            if (i == 1) { break; }
        }
        println(\"after \", i);
    ";
    assert_eq!(output(source), "0\n1\nafter 1\n");
}

#[test]
fn caught_throw_is_returned() {
    let value = returned(r#"try { throw "boom"; } catch (e) { return e; }"#);
    assert_eq!(value.as_str(), Some("boom"));
}

#[test]
fn point_addition_through_overloaded_operator() {
    let source = r#"
        class Point {
            public x, y;
            method Point(x, y) { me.x = x; me.y = y; }
            operator + (other) { return new Point(me.x + other.x, me.y + other.y); }
        }
        p = new Point(1, 2) + new Point(3, 4);
        println(typeof(p), " ", p.x, " ", p.y);
    "#;
    assert_eq!(output(source), "Point 4 6\n");
}

#[test]
fn unmapped_key_is_gone_and_others_remain() {
    let source = r#"
        map m;
        m["a"] = 1;
        m["b"] = 2;
        m.unmap("a");
        println(m["b"]);
        println(m["a"]);
    "#;
    let run = run(source);
    assert_eq!(run.output, "2\n");
    let Err(RunError::Eval(err)) = run.result else {
        panic!("expected a fatal lookup error");
    };
    assert!(matches!(err.kind, EvalErrorKind::NoMappedValue { .. }));
}

#[test]
fn unmapped_key_cannot_be_caught() {
    let source = r#"
        map m;
        m["a"] = 1;
        m.unmap("a");
        try { m["a"]; } catch (e) { println("caught"); }
    "#;
    let run = run(source);
    assert_eq!(run.output, "");
    assert!(run.result.is_err());
}

#[test]
fn switch_runs_only_the_first_matching_case() {
    let source = r#"
        function pick(x) {
            switch (x) {
                case 1: return "one";
                case 2: return "two";
                case 2: return "second two";
                default: return "other";
            }
        }
        println(pick(1), " ", pick(2), " ", pick(9));
    "#;
    assert_eq!(output(source), "one two other\n");
}

#[test]
fn ranges_ascend_in_both_directions() {
    assert_eq!(output("println(1..5, \" \", 5..1);"), "[1, 2, 3, 4, 5] [1, 2, 3, 4, 5]\n");
}

#[test]
fn modulo_by_powers_of_two_masks() {
    assert_eq!(output("println(13 % 8, \" \", -1 % 2, \" \", 9 % 1, \" \", 9 % 0);"), "5 1 0 0\n");
}

#[test]
fn exception_skips_side_effects_up_to_the_handler() {
    let source = r#"
        log = [];
        function inner() { throw "stop"; log.push("inner"); }
        function outer() { inner(); log.push("outer"); }
        try { outer(); log.push("try"); } catch (e) { log.push(e); }
        println(log);
    "#;
    assert_eq!(output(source), "[\"stop\"]\n");
}

#[test]
fn foreach_walks_strings_and_map_pairs() {
    let source = r#"
        word = "";
        foreach (c of "abc") { word = c + word; }
        ages = ["ann" : 31, "bob" : 27];
        foreach (name -> age of ages) { println(name, " ", age); }
        println(word);
    "#;
    assert_eq!(output(source), "ann 31\nbob 27\ncba\n");
}

#[test]
fn subclass_overrides_inherited_method() {
    let source = r#"
        class Animal {
            protected name = "animal";
            method speak() { return me.name + " makes a sound"; }
        }
        class Dog extends Animal {
            method Dog(name) { me.name = name; }
            method speak() { return me.name + " barks"; }
        }
        d = new Dog("rex");
        println(d.speak());
    "#;
    assert_eq!(output(source), "rex barks\n");
}

#[test]
fn threads_share_output_and_join() {
    let source = "
        function square(n) { return n * n; }
        a = pthread_create(square, 3);
        b = pthread_create(square, 4);
        println(pthread_join(a) + pthread_join(b));
    ";
    assert_eq!(output(source), "25\n");
}
