use std::cmp::Ordering;

use hybris_ir::{BinaryOp, UnaryOp};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::errors::EvalErrorKind;
use crate::value::{Attribute, StructValue};

fn int(heap: &Heap, n: i64) -> Object {
    heap.alloc(Value::Integer(n))
}

fn string(heap: &Heap, s: &str) -> Object {
    heap.alloc(Value::String(s.to_string()))
}

fn vector(heap: &Heap, items: &[i64]) -> Object {
    heap.alloc(Value::Vector(items.iter().map(|&n| int(heap, n)).collect()))
}

fn ints(object: &Object) -> Vec<i64> {
    match &*object.read() {
        Value::Vector(items) => items
            .iter()
            .map(|o| o.read().as_int().unwrap_or(i64::MIN))
            .collect(),
        other => panic!("expected vector, got {other:?}"),
    }
}

fn eval(heap: &Heap, op: BinaryOp, a: Value, b: Value) -> EvalResult<String> {
    binary(heap, op, &heap.alloc(a), &heap.alloc(b)).map(|o| o.read().to_string())
}

// Conversions

#[test]
fn conversions_parse_strings() {
    assert_eq!(to_int(&Value::String("42".into())).ok(), Some(42));
    assert_eq!(to_int(&Value::String("0x1f".into())).ok(), Some(31));
    assert_eq!(to_int(&Value::String("2.9".into())).ok(), Some(2));
    assert_eq!(to_int(&Value::String("nope".into())).ok(), Some(0));
    assert_eq!(to_float(&Value::Integer(3)).ok(), Some(3.0));
    assert_eq!(to_int(&Value::Char('A')).ok(), Some(65));
}

#[test]
fn conversion_of_vector_to_int_is_unsupported() {
    let err = to_int(&Value::Vector(Vec::new())).map(|_| ()).err();
    assert_eq!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::UnsupportedOperation {
            op: "toint".into(),
            type_name: "vector".into(),
        })
    );
}

#[test]
fn truthiness() {
    assert!(to_bool(&Value::Integer(-1)));
    assert!(!to_bool(&Value::Integer(0)));
    assert!(!to_bool(&Value::String(String::new())));
    assert!(to_bool(&Value::Vector(vec![Heap::new().alloc(Value::Integer(0))])));
}

// Clone

#[test]
fn deep_clone_copies_elements() {
    let heap = Heap::new();
    let original = vector(&heap, &[1, 2]);
    let copy = clone(&heap, &original);
    push(&heap, &copy, &int(&heap, 3)).ok();

    assert_eq!(ints(&original), vec![1, 2]);
    assert_eq!(ints(&copy), vec![1, 2, 3]);
}

#[test]
fn deep_clone_shares_static_attributes() {
    let heap = Heap::new();
    let shared = int(&heap, 1);
    let mut counter = Attribute::public("count", shared.clone());
    counter.is_static = true;
    let original = heap.alloc(Value::Struct(StructValue {
        name: "S".into(),
        attributes: vec![counter, Attribute::public("x", int(&heap, 5))],
    }));
    let copy = clone(&heap, &original);

    let guard = copy.read();
    let attrs = guard.attributes().unwrap_or_default();
    assert!(attrs[0].value.ptr_eq(&shared));
    assert!(!attrs[1].value.ptr_eq(&original.read().attributes().unwrap_or_default()[1].value));
}

#[test]
fn clone_of_constant_is_mutable() {
    let heap = Heap::new();
    let constant = heap.constant(Value::Integer(1));
    assert!(!clone(&heap, &constant).is_constant());
}

#[test]
fn assign_to_constant_fails() {
    let heap = Heap::new();
    let constant = heap.constant(Value::Integer(1));
    let err = assign(&heap, &constant, &int(&heap, 2)).err();
    assert_eq!(err.map(|e| e.kind), Some(EvalErrorKind::ConstantModification));
}

// Comparison

#[test]
fn compare_across_numeric_kinds() {
    assert_eq!(compare_values(&Value::Integer(1), &Value::Float(1.0)), Ordering::Equal);
    assert_eq!(compare_values(&Value::Char('a'), &Value::Integer(97)), Ordering::Equal);
    assert_eq!(compare_values(&Value::Integer(2), &Value::Float(1.5)), Ordering::Greater);
    assert_eq!(
        compare_values(&Value::String("abc".into()), &Value::String("abd".into())),
        Ordering::Less
    );
}

#[test]
fn compare_vectors_elementwise_then_length() {
    let heap = Heap::new();
    assert_eq!(compare(&vector(&heap, &[1, 2]), &vector(&heap, &[1, 3])), Ordering::Less);
    assert_eq!(compare(&vector(&heap, &[1, 2]), &vector(&heap, &[1])), Ordering::Greater);
    assert_eq!(compare(&vector(&heap, &[4]), &vector(&heap, &[4])), Ordering::Equal);
}

#[test]
fn compare_unrelated_kinds_orders_by_kind() {
    assert_eq!(
        compare_values(&Value::Integer(100), &Value::String("a".into())),
        Ordering::Less
    );
}

// Arithmetic

#[test]
fn arithmetic_and_promotion() {
    let heap = Heap::new();
    assert_eq!(
        eval(&heap, BinaryOp::Add, Value::Integer(2), Value::Integer(3)).ok(),
        Some("5".into())
    );
    assert_eq!(
        eval(&heap, BinaryOp::Mul, Value::Integer(2), Value::Float(1.5)).ok(),
        Some("3.0".into())
    );
    assert_eq!(
        eval(&heap, BinaryOp::Div, Value::Integer(7), Value::Integer(2)).ok(),
        Some("3".into())
    );
    assert_eq!(
        eval(&heap, BinaryOp::Add, Value::Integer(i64::MAX), Value::Integer(1)).ok(),
        Some(i64::MIN.to_string())
    );
}

#[test]
fn string_and_char_addition() {
    let heap = Heap::new();
    assert_eq!(
        eval(&heap, BinaryOp::Add, Value::String("n=".into()), Value::Integer(4)).ok(),
        Some("n=4".into())
    );
    assert_eq!(
        eval(&heap, BinaryOp::Add, Value::Char('a'), Value::Integer(2)).ok(),
        Some("c".into())
    );
    assert_eq!(
        eval(&heap, BinaryOp::Add, Value::Char('a'), Value::Char('b')).ok(),
        Some("ab".into())
    );
}

#[test]
fn vector_addition_concatenates_and_appends() {
    let heap = Heap::new();
    let joined = binary(&heap, BinaryOp::Add, &vector(&heap, &[1]), &vector(&heap, &[2, 3]));
    assert_eq!(joined.map(|o| ints(&o)).ok(), Some(vec![1, 2, 3]));

    let appended = binary(&heap, BinaryOp::Add, &vector(&heap, &[1]), &int(&heap, 9));
    assert_eq!(appended.map(|o| ints(&o)).ok(), Some(vec![1, 9]));
}

#[test]
fn integer_division_by_zero() {
    let heap = Heap::new();
    let err = eval(&heap, BinaryOp::Div, Value::Integer(1), Value::Integer(0)).err();
    assert_eq!(err.map(|e| e.kind), Some(EvalErrorKind::DivisionByZero));
}

#[test]
fn unsupported_operator_names_operator_and_type() {
    let heap = Heap::new();
    let err = eval(&heap, BinaryOp::Sub, Value::String("a".into()), Value::Integer(1)).err();
    assert_eq!(
        err.map(|e| e.message),
        Some("'-' operator not supported for type 'string'".to_string())
    );
}

#[test]
fn comparison_operators_yield_booleans() {
    let heap = Heap::new();
    assert_eq!(
        eval(&heap, BinaryOp::Lt, Value::Integer(1), Value::Integer(2)).ok(),
        Some("true".into())
    );
    assert_eq!(
        eval(&heap, BinaryOp::GtEq, Value::Integer(1), Value::Integer(2)).ok(),
        Some("false".into())
    );
    assert_eq!(
        eval(&heap, BinaryOp::Eq, Value::Float(2.0), Value::Integer(2)).ok(),
        Some("true".into())
    );
}

#[test]
fn modulo_special_cases() {
    assert_eq!(modulo(17, 0), 0);
    assert_eq!(modulo(17, 1), 0);
    assert_eq!(modulo(17, 8), 1);
    assert_eq!(modulo(-3, 4), 1);
    assert_eq!(modulo(-7, 3), -1);
}

// Range

#[test]
fn range_is_ascending() {
    let heap = Heap::new();
    let up = range(&heap, &int(&heap, 1), &int(&heap, 5));
    let down = range(&heap, &int(&heap, 5), &int(&heap, 1));
    assert_eq!(up.map(|o| ints(&o)).ok(), Some(vec![1, 2, 3, 4, 5]));
    assert_eq!(down.map(|o| ints(&o)).ok(), Some(vec![1, 2, 3, 4, 5]));
}

#[test]
fn char_range() {
    let heap = Heap::new();
    let r = range(&heap, &heap.alloc(Value::Char('c')), &heap.alloc(Value::Char('a')));
    assert_eq!(r.map(|o| o.read().to_string()).ok(), Some("['a', 'b', 'c']".into()));
}

#[test]
fn range_rejects_mixed_kinds() {
    let heap = Heap::new();
    let err = range(&heap, &int(&heap, 1), &heap.alloc(Value::Char('a'))).err();
    assert_eq!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::InvalidRange {
            left: "int".into(),
            right: "char".into(),
        })
    );
}

// Unary and in-place

#[test]
fn increment_mutates_in_place() {
    let heap = Heap::new();
    let n = int(&heap, 41);
    let result = unary(&heap, UnaryOp::Increment, &n);
    assert!(result.is_ok_and(|r| r.ptr_eq(&n)));
    assert_eq!(n.read().as_int(), Some(42));
}

#[test]
fn increment_through_reference() {
    let heap = Heap::new();
    let target = int(&heap, 1);
    let reference = heap.alloc(Value::Reference(target.clone()));
    step(UnaryOp::Increment, &reference).ok();
    assert_eq!(target.read().as_int(), Some(2));
}

#[test]
fn inplace_keeps_target_kind() {
    let heap = Heap::new();
    let n = int(&heap, 3);
    inplace(&heap, BinaryOp::Mul, &n, &heap.alloc(Value::Float(1.5))).ok();
    assert_eq!(n.read().as_int(), Some(4));

    let x = heap.alloc(Value::Float(1.0));
    inplace(&heap, BinaryOp::Add, &x, &int(&heap, 2)).ok();
    assert_eq!(x.read().to_string(), "3.0");

    let c = heap.alloc(Value::Char('a'));
    let err = inplace(&heap, BinaryOp::Add, &c, &heap.alloc(Value::Char('b'))).err();
    assert_eq!(err.map(|e| e.category()), Some(crate::ErrorCategory::Type));
}

#[test]
fn inplace_append_keeps_element_identity() {
    let heap = Heap::new();
    let v = vector(&heap, &[1]);
    let first = at(&heap, &v, &int(&heap, 0)).ok();
    inplace(&heap, BinaryOp::Add, &v, &int(&heap, 2)).ok();

    assert_eq!(ints(&v), vec![1, 2]);
    let again = at(&heap, &v, &int(&heap, 0)).ok();
    assert!(matches!((first, again), (Some(a), Some(b)) if a.ptr_eq(&b)));
}

// Collections

#[test]
fn index_read_and_write() {
    let heap = Heap::new();
    let v = vector(&heap, &[10, 20, 30]);
    set(&heap, &v, &int(&heap, 1), &int(&heap, 99)).ok();
    assert_eq!(ints(&v), vec![10, 99, 30]);

    let s = string(&heap, "hey");
    let c = at(&heap, &s, &int(&heap, 1)).map(|o| o.read().to_string());
    assert_eq!(c.ok(), Some("e".into()));
}

#[test]
fn index_out_of_bounds() {
    let heap = Heap::new();
    let v = vector(&heap, &[1]);
    let err = at(&heap, &v, &int(&heap, 3)).err();
    assert_eq!(err.map(|e| e.kind), Some(EvalErrorKind::IndexOutOfBounds { index: 3, size: 1 }));

    let err = at(&heap, &v, &int(&heap, -1)).err();
    assert_eq!(err.map(|e| e.kind), Some(EvalErrorKind::IndexOutOfBounds { index: -1, size: 1 }));
}

#[test]
fn push_pop_remove() {
    let heap = Heap::new();
    let v = vector(&heap, &[1, 2, 3]);
    push(&heap, &v, &int(&heap, 4)).ok();
    let popped = pop(&heap, &v).map(|o| o.read().as_int());
    let removed = remove(&heap, &v, &int(&heap, 0)).map(|o| o.read().as_int());

    assert_eq!(popped.ok().flatten(), Some(4));
    assert_eq!(removed.ok().flatten(), Some(1));
    assert_eq!(ints(&v), vec![2, 3]);
    assert_eq!(size(&v.read()).ok(), Some(2));
}

#[test]
fn contains_checks_elements_and_substrings() {
    let heap = Heap::new();
    assert_eq!(contains(&vector(&heap, &[1, 2]), &int(&heap, 2)).ok(), Some(true));
    assert_eq!(contains(&string(&heap, "hello"), &string(&heap, "ell")).ok(), Some(true));
    assert_eq!(contains(&string(&heap, "hello"), &heap.alloc(Value::Char('z'))).ok(), Some(false));
}

#[test]
fn map_set_get_unmap() {
    let heap = Heap::new();
    let m = heap.alloc(Value::Map(MapValue::new()));
    map_set(&heap, &m, &string(&heap, "a"), &int(&heap, 1)).ok();
    map_set(&heap, &m, &string(&heap, "b"), &int(&heap, 2)).ok();
    map_set(&heap, &m, &string(&heap, "a"), &int(&heap, 3)).ok();

    assert_eq!(size(&m.read()).ok(), Some(2));
    assert_eq!(m.read().to_string(), "[\"a\" : 3, \"b\" : 2]");

    assert_eq!(unmap(&m, &string(&heap, "a")).ok(), Some(true));
    assert_eq!(unmap(&m, &string(&heap, "a")).ok(), Some(false));
    assert_eq!(is_mapped(&m, &string(&heap, "b")).ok(), Some(true));

    let err = at(&heap, &m, &string(&heap, "a")).err();
    assert_eq!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::NoMappedValue { key: "\"a\"".into() })
    );
    let b = at(&heap, &m, &string(&heap, "b")).map(|o| o.read().as_int());
    assert_eq!(b.ok().flatten(), Some(2));
}

#[test]
fn keys_and_values_keep_insertion_order() {
    let heap = Heap::new();
    let m = heap.alloc(Value::Map(MapValue::new()));
    for (k, v) in [(3, 30), (1, 10), (2, 20)] {
        map_set(&heap, &m, &int(&heap, k), &int(&heap, v)).ok();
    }
    assert_eq!(keys(&heap, &m).map(|o| ints(&o)).ok(), Some(vec![3, 1, 2]));
    assert_eq!(values(&heap, &m).map(|o| ints(&o)).ok(), Some(vec![30, 10, 20]));
}

#[test]
fn matrix_rows_share_cells() {
    let heap = Heap::new();
    let m = matrix(&heap, 2, 3);
    let row = at(&heap, &m, &int(&heap, 1));
    let row = row.ok();
    if let Some(row) = &row {
        set(&heap, row, &int(&heap, 2), &int(&heap, 7)).ok();
    }
    assert_eq!(m.read().to_string(), "[[0, 0, 0], [0, 0, 7]]");
}

#[test]
fn writes_to_constants_fail() {
    let heap = Heap::new();
    let v = heap.constant(Value::Vector(Vec::new()));
    let err = push(&heap, &v, &int(&heap, 1)).err();
    assert_eq!(err.map(|e| e.kind), Some(EvalErrorKind::ConstantModification));
}

#[test]
fn static_attribute_assignment_is_shared() {
    let heap = Heap::new();
    let shared = int(&heap, 0);
    let mut count = Attribute::public("count", shared.clone());
    count.is_static = true;
    let a = heap.alloc(Value::Struct(StructValue {
        name: "S".into(),
        attributes: vec![count],
    }));
    let b = clone(&heap, &a);

    set_attribute(&heap, &a, "count", &int(&heap, 5)).ok();
    let seen = b.read().attributes().map(|attrs| attrs[0].value.read().as_int());
    assert_eq!(seen.flatten(), Some(5));
}

#[test]
fn undefined_attribute() {
    let heap = Heap::new();
    let s = heap.alloc(Value::Struct(StructValue {
        name: "S".into(),
        attributes: Vec::new(),
    }));
    let err = set_attribute(&heap, &s, "nope", &int(&heap, 1)).err();
    assert_eq!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::UndefinedAttribute {
            type_name: "S".into(),
            attribute: "nope".into(),
        })
    );
}

proptest! {
    #[test]
    fn modulo_by_power_of_two_is_mask(a in any::<i64>(), k in 0u32..63) {
        let b = 1i64 << k;
        prop_assert_eq!(modulo(a, b), a & (b - 1));
    }

    #[test]
    fn range_is_symmetric_and_ascending(a in -200i64..200, b in -200i64..200) {
        let heap = Heap::new();
        let forward = range(&heap, &int(&heap, a), &int(&heap, b)).map(|o| ints(&o));
        let backward = range(&heap, &int(&heap, b), &int(&heap, a)).map(|o| ints(&o));
        let expected: Vec<i64> = (a.min(b)..=a.max(b)).collect();
        prop_assert_eq!(forward.ok(), Some(expected.clone()));
        prop_assert_eq!(backward.ok(), Some(expected));
    }
}
