//! Typed operations over objects.
//!
//! This module is the single dispatch point for every operation on runtime
//! values: conversions, deep clone, comparison, arithmetic, bitwise and
//! logical operators, in-place operators, ranges and collection access. Each
//! operation matches on the operand kinds; a kind that does not implement
//! the operation fails with an unsupported-operation error naming the
//! operator and the type.
//!
//! Operands of kind `Reference` are followed to their target first. Class
//! operands are expected to have been routed to their operator overloads by
//! the evaluator before reaching these functions.

mod collection;

use std::cmp::Ordering;

use hybris_ir::{BinaryOp, UnaryOp};

use crate::errors::{
    constant_modification, division_by_zero, invalid_range, type_mismatch, unsupported_operation,
    EvalResult,
};
use crate::object::Attributes;
use crate::value::{Attribute, ClassValue, MapValue, MatrixValue, StructValue, Value};
use crate::{Heap, Object};

pub use collection::{
    at, contains, is_mapped, keys, map_get, map_set, matrix, pop, push, remove, set,
    set_attribute, size, unmap, values,
};

/// Longest reference chain followed by [`deref`].
const MAX_REFERENCE_DEPTH: usize = 64;

/// Follow a chain of references to the referenced object.
pub fn deref(object: &Object) -> Object {
    let mut current = object.clone();
    for _ in 0..MAX_REFERENCE_DEPTH {
        let next = match &*current.read() {
            Value::Reference(target) => Some(target.clone()),
            _ => None,
        };
        let Some(next) = next else {
            return current;
        };
        current = next;
    }
    current
}

// Clone

/// Deep clone.
///
/// Static attributes and reference targets are shared with the original.
/// The copy is never `CONSTANT`.
pub fn clone(heap: &Heap, object: &Object) -> Object {
    let value = clone_value(heap, &object.read());
    heap.alloc_with(value, object.attributes() & Attributes::EXTERN)
}

pub fn clone_value(heap: &Heap, value: &Value) -> Value {
    let clone_all = |items: &[Object]| items.iter().map(|o| clone(heap, o)).collect::<Vec<_>>();
    match value {
        Value::Vector(items) => Value::Vector(clone_all(items)),
        Value::Map(map) => Value::Map(MapValue {
            keys: clone_all(&map.keys),
            values: clone_all(&map.values),
        }),
        Value::Matrix(matrix) => Value::Matrix(MatrixValue {
            columns: matrix.columns,
            rows: clone_all(&matrix.rows),
        }),
        Value::Struct(s) => Value::Struct(StructValue {
            name: s.name.clone(),
            attributes: clone_attributes(heap, &s.attributes),
        }),
        Value::Class(c) => Value::Class(ClassValue {
            name: c.name.clone(),
            attributes: clone_attributes(heap, &c.attributes),
            methods: c.methods.clone(),
            expiry: c.expiry.clone(),
        }),
        scalar => scalar.clone(),
    }
}

fn clone_attributes(heap: &Heap, attributes: &[Attribute]) -> Vec<Attribute> {
    attributes
        .iter()
        .map(|a| Attribute {
            name: a.name.clone(),
            value: if a.is_static {
                a.value.clone()
            } else {
                clone(heap, &a.value)
            },
            access: a.access,
            is_static: a.is_static,
        })
        .collect()
}

/// Overwrite `target`'s payload with a deep copy of `source`'s.
///
/// This is how a binding holding a reference is re-targeted, and how a
/// same-kind binding is updated in place.
pub fn assign(heap: &Heap, target: &Object, source: &Object) -> EvalResult<()> {
    if target.ptr_eq(source) {
        return Ok(());
    }
    if target.is_constant() {
        return Err(constant_modification());
    }
    let value = clone_value(heap, &source.read());
    *target.write() = value;
    Ok(())
}

// Conversions

pub fn to_int(value: &Value) -> EvalResult<i64> {
    match value {
        Value::Integer(n) => Ok(*n),
        #[allow(clippy::cast_possible_truncation)]
        Value::Float(x) => Ok(*x as i64),
        Value::Char(c) => Ok(i64::from(u32::from(*c))),
        Value::Boolean(b) => Ok(i64::from(*b)),
        Value::String(s) => Ok(parse_number(s).map_or(0, |n| match n {
            Number::Int(n) => n,
            #[allow(clippy::cast_possible_truncation)]
            Number::Float(x) => x as i64,
        })),
        Value::Reference(target) => to_int(&target.read()),
        other => Err(unsupported_operation("toint", &other.type_name())),
    }
}

pub fn to_float(value: &Value) -> EvalResult<f64> {
    match value {
        #[allow(clippy::cast_precision_loss)]
        Value::Integer(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        Value::Char(c) => Ok(f64::from(u32::from(*c))),
        Value::Boolean(b) => Ok(f64::from(u8::from(*b))),
        Value::String(s) => Ok(parse_number(s).map_or(0.0, |n| match n {
            #[allow(clippy::cast_precision_loss)]
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        })),
        Value::Reference(target) => to_float(&target.read()),
        other => Err(unsupported_operation("tofloat", &other.type_name())),
    }
}

/// Truth value. Every kind has one.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Integer(n) => *n != 0,
        Value::Float(x) => *x != 0.0,
        Value::Char(c) => *c != '\0',
        Value::Boolean(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Binary(bytes) => !bytes.is_empty(),
        Value::Vector(items) => !items.is_empty(),
        Value::Map(map) => !map.is_empty(),
        Value::Matrix(matrix) => !matrix.rows.is_empty(),
        Value::Reference(target) => to_bool(&target.read()),
        Value::Struct(_) | Value::Class(_) | Value::Alias(_) | Value::Extern(_) => true,
    }
}

/// Display form, as printed.
pub fn to_string(value: &Value) -> String {
    value.to_string()
}

enum Number {
    Int(i64),
    Float(f64),
}

fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(Number::Int(n));
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if let Ok(n) = i64::from_str_radix(hex, 16) {
            return Some(Number::Int(n));
        }
    }
    s.parse::<f64>().ok().map(Number::Float)
}

// Comparison

/// Three-way comparison used by every relational operator, `switch` and map
/// key lookup.
///
/// Integers and floats compare numerically, chars against integers by code
/// point, strings lexicographically, collections element-wise then by
/// length, structs and classes attribute-wise. Values of unrelated kinds
/// order by kind.
pub fn compare(a: &Object, b: &Object) -> Ordering {
    if a.ptr_eq(b) {
        return Ordering::Equal;
    }
    compare_values(&a.read(), &b.read())
}

#[allow(clippy::cast_precision_loss)]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    use Value::{
        Alias, Binary, Boolean, Char, Class, Extern, Float, Integer, Map, Matrix, Reference,
        Struct, Vector,
    };

    let float_cmp = |x: f64, y: f64| x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    match (a, b) {
        (Reference(x), _) => compare_values(&x.read(), b),
        (_, Reference(y)) => compare_values(a, &y.read()),

        (Integer(x), Integer(y)) => x.cmp(y),
        (Integer(x), Float(y)) => float_cmp(*x as f64, *y),
        (Float(x), Integer(y)) => float_cmp(*x, *y as f64),
        (Float(x), Float(y)) => float_cmp(*x, *y),
        (Char(x), Char(y)) => x.cmp(y),
        (Char(x), Integer(y)) => i64::from(u32::from(*x)).cmp(y),
        (Integer(x), Char(y)) => x.cmp(&i64::from(u32::from(*y))),
        (Boolean(x), Boolean(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Binary(x), Binary(y)) => x.cmp(y),

        (Vector(x), Vector(y)) => compare_sequences(x, y),
        (Matrix(x), Matrix(y)) => compare_sequences(&x.rows, &y.rows),
        (Map(x), Map(y)) => compare_sequences(&x.keys, &y.keys)
            .then_with(|| compare_sequences(&x.values, &y.values)),
        (Struct(x), Struct(y)) => x
            .name
            .cmp(&y.name)
            .then_with(|| compare_attributes(&x.attributes, &y.attributes)),
        (Class(x), Class(y)) => x
            .name
            .cmp(&y.name)
            .then_with(|| compare_attributes(&x.attributes, &y.attributes)),
        (Alias(x), Alias(y)) => x.name.cmp(&y.name),
        (Extern(x), Extern(y)) => (&x.library, &x.name).cmp(&(&y.library, &y.name)),

        _ => a.kind().cmp(&b.kind()),
    }
}

fn compare_sequences(x: &[Object], y: &[Object]) -> Ordering {
    for (a, b) in x.iter().zip(y) {
        match compare(a, b) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    x.len().cmp(&y.len())
}

fn compare_attributes(x: &[Attribute], y: &[Attribute]) -> Ordering {
    for (a, b) in x.iter().zip(y) {
        let ord = a.name.cmp(&b.name).then_with(|| compare(&a.value, &b.value));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    x.len().cmp(&y.len())
}

// Binary operators

/// Integer modulo with the interpreter's special cases: `a % 0` and `a % 1`
/// are 0, and a power-of-two divisor uses the bit mask `a & (b - 1)`.
pub fn modulo(a: i64, b: i64) -> i64 {
    if b == 0 || b == 1 {
        0
    } else if b > 0 && b & (b - 1) == 0 {
        a & (b - 1)
    } else {
        a.wrapping_rem(b)
    }
}

/// Evaluate a binary operator into a new object.
pub fn binary(heap: &Heap, op: BinaryOp, lhs: &Object, rhs: &Object) -> EvalResult<Object> {
    let (lhs, rhs) = (deref(lhs), deref(rhs));
    if op == BinaryOp::Range {
        return range(heap, &lhs, &rhs);
    }
    let value = {
        let a = lhs.read();
        let b = rhs.read();
        binary_value(heap, op, &a, &b)?
    };
    Ok(heap.alloc(value))
}

/// Evaluate a binary operator over payloads.
pub fn binary_value(heap: &Heap, op: BinaryOp, a: &Value, b: &Value) -> EvalResult<Value> {
    use BinaryOp::{
        Add, And, BitAnd, BitOr, BitXor, Div, Eq, Gt, GtEq, Lt, LtEq, Mod, Mul, NotEq, Or, Range,
        Shl, Shr, Sub,
    };
    match op {
        Add => add(heap, a, b),
        Sub | Mul | Div | Mod => arithmetic(op, a, b),
        BitAnd | BitOr | BitXor | Shl | Shr => bitwise(op, a, b),
        And => Ok(Value::Boolean(to_bool(a) && to_bool(b))),
        Or => Ok(Value::Boolean(to_bool(a) || to_bool(b))),
        Eq => Ok(Value::Boolean(compare_values(a, b) == Ordering::Equal)),
        NotEq => Ok(Value::Boolean(compare_values(a, b) != Ordering::Equal)),
        Lt => Ok(Value::Boolean(compare_values(a, b) == Ordering::Less)),
        LtEq => Ok(Value::Boolean(compare_values(a, b) != Ordering::Greater)),
        Gt => Ok(Value::Boolean(compare_values(a, b) == Ordering::Greater)),
        GtEq => Ok(Value::Boolean(compare_values(a, b) != Ordering::Less)),
        Range => range_value(heap, a, b),
    }
}

/// The operand blamed in an unsupported-operation error.
fn offender(a: &Value, b: &Value) -> String {
    if matches!(a, Value::Integer(_) | Value::Float(_)) {
        b.type_name()
    } else {
        a.type_name()
    }
}

fn shift_char(c: char, delta: i64) -> EvalResult<Value> {
    i64::from(u32::from(c))
        .checked_add(delta)
        .and_then(|n| u32::try_from(n).ok())
        .and_then(char::from_u32)
        .map(Value::Char)
        .ok_or_else(|| type_mismatch("char code point", "out of range value"))
}

fn add(heap: &Heap, a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            arithmetic(BinaryOp::Add, a, b)
        }
        (Value::String(s), other) => Ok(Value::String(format!("{s}{other}"))),
        (Value::Char(c), Value::String(s)) => Ok(Value::String(format!("{c}{s}"))),
        (Value::Char(x), Value::Char(y)) => Ok(Value::String(format!("{x}{y}"))),
        (Value::Char(c), Value::Integer(n)) => shift_char(*c, *n),
        (Value::Integer(n), Value::Char(c)) => {
            Ok(Value::Integer(n.wrapping_add(i64::from(u32::from(*c)))))
        }
        (Value::Vector(x), Value::Vector(y)) => Ok(Value::Vector(
            x.iter().chain(y).map(|o| clone(heap, o)).collect(),
        )),
        (Value::Vector(x), other) => {
            let mut items: Vec<Object> = x.iter().map(|o| clone(heap, o)).collect();
            items.push(heap.alloc(clone_value(heap, other)));
            Ok(Value::Vector(items))
        }
        (Value::Binary(x), Value::Binary(y)) => {
            Ok(Value::Binary([x.as_slice(), y.as_slice()].concat()))
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        (Value::Binary(x), Value::Integer(n)) => {
            let mut bytes = x.clone();
            bytes.push(*n as u8);
            Ok(Value::Binary(bytes))
        }
        _ => Err(unsupported_operation("+", &offender(a, b))),
    }
}

#[allow(clippy::cast_precision_loss)]
fn arithmetic(op: BinaryOp, a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => int_arithmetic(op, *x, *y).map(Value::Integer),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(float_arithmetic(op, *x, *y))),
        (Value::Integer(x), Value::Float(y)) => {
            Ok(Value::Float(float_arithmetic(op, *x as f64, *y)))
        }
        (Value::Float(x), Value::Integer(y)) => {
            Ok(Value::Float(float_arithmetic(op, *x, *y as f64)))
        }
        (Value::Char(c), Value::Integer(n)) if op == BinaryOp::Sub => {
            shift_char(*c, n.wrapping_neg())
        }
        (Value::String(s), Value::Integer(n)) if op == BinaryOp::Mul => {
            Ok(Value::String(s.repeat(usize::try_from(*n).unwrap_or(0))))
        }
        _ => Err(unsupported_operation(op.as_symbol(), &offender(a, b))),
    }
}

fn int_arithmetic(op: BinaryOp, x: i64, y: i64) -> EvalResult<i64> {
    match op {
        BinaryOp::Add => Ok(x.wrapping_add(y)),
        BinaryOp::Sub => Ok(x.wrapping_sub(y)),
        BinaryOp::Mul => Ok(x.wrapping_mul(y)),
        BinaryOp::Div if y == 0 => Err(division_by_zero()),
        BinaryOp::Div => Ok(x.wrapping_div(y)),
        BinaryOp::Mod => Ok(modulo(x, y)),
        _ => Err(unsupported_operation(op.as_symbol(), "int")),
    }
}

fn float_arithmetic(op: BinaryOp, x: f64, y: f64) -> f64 {
    match op {
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::Mod => x % y,
        _ => x + y,
    }
}

fn bitwise(op: BinaryOp, a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        (Value::Integer(x), Value::Integer(y)) => Ok(Value::Integer(match op {
            BinaryOp::BitAnd => x & y,
            BinaryOp::BitOr => x | y,
            BinaryOp::BitXor => x ^ y,
            BinaryOp::Shl => x.wrapping_shl(*y as u32),
            _ => x.wrapping_shr(*y as u32),
        })),
        (Value::Boolean(x), Value::Boolean(y)) => match op {
            BinaryOp::BitAnd => Ok(Value::Boolean(x & y)),
            BinaryOp::BitOr => Ok(Value::Boolean(x | y)),
            BinaryOp::BitXor => Ok(Value::Boolean(x ^ y)),
            _ => Err(unsupported_operation(op.as_symbol(), "boolean")),
        },
        _ => Err(unsupported_operation(op.as_symbol(), &offender(a, b))),
    }
}

// Range

/// `a..b`: ascending inclusive sequence; endpoints are swapped when `a > b`.
///
/// Both operands must have the same kind, either int or char.
pub fn range(heap: &Heap, lhs: &Object, rhs: &Object) -> EvalResult<Object> {
    let value = {
        let a = lhs.read();
        let b = rhs.read();
        range_value(heap, &a, &b)?
    };
    Ok(heap.alloc(value))
}

fn range_value(heap: &Heap, a: &Value, b: &Value) -> EvalResult<Value> {
    let items = match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => {
            let (lo, hi) = if x > y { (*y, *x) } else { (*x, *y) };
            (lo..=hi).map(|n| heap.alloc(Value::Integer(n))).collect()
        }
        (Value::Char(x), Value::Char(y)) => {
            let (lo, hi) = if x > y { (*y, *x) } else { (*x, *y) };
            (lo..=hi).map(|c| heap.alloc(Value::Char(c))).collect()
        }
        _ => return Err(invalid_range(&a.type_name(), &b.type_name())),
    };
    Ok(Value::Vector(items))
}

// Unary operators

/// Evaluate `-x`, `!x` or `~x` into a new object; `++`/`--` step the operand
/// in place and return it.
pub fn unary(heap: &Heap, op: UnaryOp, operand: &Object) -> EvalResult<Object> {
    let operand = deref(operand);
    let value = match op {
        UnaryOp::Increment | UnaryOp::Decrement => {
            step(op, &operand)?;
            return Ok(operand);
        }
        UnaryOp::Not => Value::Boolean(!to_bool(&operand.read())),
        UnaryOp::Neg => match &*operand.read() {
            Value::Integer(n) => Value::Integer(n.wrapping_neg()),
            Value::Float(x) => Value::Float(-x),
            other => return Err(unsupported_operation("-", &other.type_name())),
        },
        UnaryOp::BitNot => match &*operand.read() {
            Value::Integer(n) => Value::Integer(!n),
            other => return Err(unsupported_operation("~", &other.type_name())),
        },
    };
    Ok(heap.alloc(value))
}

/// Increment or decrement in place.
pub fn step(op: UnaryOp, object: &Object) -> EvalResult<()> {
    let object = deref(object);
    if object.is_constant() {
        return Err(constant_modification());
    }
    let delta: i64 = if op == UnaryOp::Decrement { -1 } else { 1 };
    let mut guard = object.write();
    let next = match &*guard {
        Value::Integer(n) => Value::Integer(n.wrapping_add(delta)),
        #[allow(clippy::cast_precision_loss)]
        Value::Float(x) => Value::Float(x + delta as f64),
        Value::Char(c) => shift_char(*c, delta)?,
        other => return Err(unsupported_operation(op.as_symbol(), &other.type_name())),
    };
    *guard = next;
    Ok(())
}

// In-place operators

/// `lhs op= rhs`: update the target of `lhs` in place and return it.
///
/// The target keeps its kind: int targets truncate float results, float
/// targets widen int results, and any other kind change is a type error.
pub fn inplace(heap: &Heap, op: BinaryOp, lhs: &Object, rhs: &Object) -> EvalResult<Object> {
    let target = deref(lhs);
    if target.is_constant() {
        return Err(constant_modification());
    }
    let rhs_value = deref(rhs).snapshot();

    // Appending keeps the identity of the existing elements.
    if op == BinaryOp::Add && matches!(&*target.read(), Value::Vector(_)) {
        let appended: Vec<Object> = match &rhs_value {
            Value::Vector(items) => items.iter().map(|o| clone(heap, o)).collect(),
            other => vec![heap.alloc(clone_value(heap, other))],
        };
        if let Value::Vector(items) = &mut *target.write() {
            items.extend(appended);
        }
        return Ok(target);
    }

    let result = {
        let current = target.read();
        binary_value(heap, op, &current, &rhs_value)?
    };
    let kind = target.kind();
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let result = match result {
        Value::Float(x) if kind == crate::Kind::Integer => Value::Integer(x as i64),
        Value::Integer(n) if kind == crate::Kind::Float => Value::Float(n as f64),
        other if other.kind() == kind => other,
        other => {
            return Err(type_mismatch(kind.name(), other.kind().name()));
        }
    };
    *target.write() = result;
    Ok(target)
}

#[cfg(test)]
mod tests;
