//! Vectors, maps, strings and matrices.

use hybris_value::{arity_mismatch, ops, EvalResult, MapValue, Object, Value};

use super::{at_least, exactly, usize_arg, BuiltinRegistry};
use crate::frame::Frame;
use crate::interpreter::Interpreter;

pub(super) fn register(registry: &mut BuiltinRegistry) {
    registry.register("size", size);
    registry.register("push", push);
    registry.register("pop", pop);
    registry.register("remove", remove);
    registry.register("contains", contains);
    registry.register("map", map);
    registry.register("unmap", unmap);
    registry.register("ismapped", is_mapped);
    registry.register("keys", keys);
    registry.register("values", values);
    registry.register("matrix", matrix);
}

fn boolean(interp: &Interpreter, value: bool) -> Object {
    interp.heap().alloc(Value::Boolean(value))
}

fn size(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("size", &args, 1)?;
    let n = ops::size(&args[0].read())?;
    Ok(interp.heap().alloc(Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))))
}

/// `push(v, items...)`: append copies of `items`; returns `v`.
fn push(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    at_least("push", &args, 2)?;
    for item in &args[1..] {
        ops::push(interp.heap(), &args[0], item)?;
    }
    Ok(ops::deref(&args[0]))
}

fn pop(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("pop", &args, 1)?;
    ops::pop(interp.heap(), &args[0])
}

/// `remove(v, index)` or `remove(map, key)`: returns the removed element.
fn remove(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("remove", &args, 2)?;
    ops::remove(interp.heap(), &args[0], &args[1])
}

fn contains(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("contains", &args, 2)?;
    let found = ops::contains(&args[0], &args[1])?;
    Ok(boolean(interp, found))
}

/// `map(k1, v1, k2, v2, ...)`: a map from alternating keys and values.
fn map(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    if args.len() % 2 != 0 {
        return Err(arity_mismatch("map", args.len() + 1, true, args.len()));
    }
    let map = interp.heap().alloc(Value::Map(MapValue::new()));
    for pair in args.chunks_exact(2) {
        ops::map_set(interp.heap(), &map, &pair[0], &pair[1])?;
    }
    Ok(map)
}

fn unmap(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("unmap", &args, 2)?;
    let removed = ops::unmap(&args[0], &args[1])?;
    Ok(boolean(interp, removed))
}

fn is_mapped(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("ismapped", &args, 2)?;
    let mapped = ops::is_mapped(&args[0], &args[1])?;
    Ok(boolean(interp, mapped))
}

fn keys(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("keys", &args, 1)?;
    ops::keys(interp.heap(), &args[0])
}

fn values(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("values", &args, 1)?;
    ops::values(interp.heap(), &args[0])
}

/// `matrix(rows, columns)`: a zero-filled matrix.
fn matrix(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("matrix", &args, 2)?;
    let rows = usize_arg(&args, 0)?;
    let columns = usize_arg(&args, 1)?;
    Ok(ops::matrix(interp.heap(), rows, columns))
}
