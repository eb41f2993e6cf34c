//! Output, type inspection, conversions and runtime control.

use hybris_ir::Span;
use hybris_value::{ops, type_mismatch, EvalResult, Object, Value};

use super::{at_least, exactly, BuiltinRegistry};
use crate::frame::Frame;
use crate::interpreter::Interpreter;

pub(super) fn register(registry: &mut BuiltinRegistry) {
    registry.register("print", print);
    registry.register("println", println);
    registry.register("typeof", type_of);
    registry.register("toint", to_int);
    registry.register("tofloat", to_float);
    registry.register("tostring", to_string);
    registry.register("tochar", to_char);
    registry.register("binary", binary);
    registry.register("call", call);
    registry.register("gc", gc);
}

fn render(interp: &mut Interpreter, frame: &Frame, args: &[Object]) -> EvalResult<String> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&interp.display(frame, arg)?);
    }
    Ok(out)
}

/// `print(args...)`: display forms of every argument, concatenated.
fn print(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    let text = render(interp, frame, &args)?;
    interp.runtime().print_handler().print(&text);
    Ok(interp.null())
}

fn println(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    let text = render(interp, frame, &args)?;
    interp.runtime().print_handler().println(&text);
    Ok(interp.null())
}

/// `typeof(x)`: the kind name, or the declared name of a struct or class.
fn type_of(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("typeof", &args, 1)?;
    let name = ops::deref(&args[0]).read().type_name();
    Ok(interp.heap().alloc(Value::String(name)))
}

fn to_int(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("toint", &args, 1)?;
    let n = ops::to_int(&args[0].read())?;
    Ok(interp.heap().alloc(Value::Integer(n)))
}

fn to_float(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("tofloat", &args, 1)?;
    let x = ops::to_float(&args[0].read())?;
    Ok(interp.heap().alloc(Value::Float(x)))
}

fn to_string(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("tostring", &args, 1)?;
    let text = interp.display(frame, &args[0])?;
    Ok(interp.heap().alloc(Value::String(text)))
}

/// `tochar(x)`: an int as a code point, or the first char of a string.
fn to_char(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("tochar", &args, 1)?;
    let object = ops::deref(&args[0]);
    let c = match &*object.read() {
        Value::Char(c) => *c,
        Value::Integer(n) => u32::try_from(*n)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| type_mismatch("code point", &n.to_string()))?,
        Value::String(s) => s.chars().next().unwrap_or('\0'),
        other => return Err(type_mismatch("int, char or string", &other.type_name())),
    };
    Ok(interp.heap().alloc(Value::Char(c)))
}

/// `binary(x)`: a byte buffer from a vector of ints or a string.
fn binary(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    let bytes = match args.first().map(ops::deref) {
        None => Vec::new(),
        Some(object) => match &*object.read() {
            Value::Binary(bytes) => bytes.clone(),
            Value::String(s) => s.as_bytes().to_vec(),
            Value::Vector(items) => items
                .iter()
                .map(|item| ops::to_int(&item.read()).map(|n| n.to_le_bytes()[0]))
                .collect::<EvalResult<_>>()?,
            other => return Err(type_mismatch("vector or string", &other.type_name())),
        },
    };
    Ok(interp.heap().alloc(Value::Binary(bytes)))
}

/// `call(f, args...)`: call a function value, extern or function name.
fn call(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let mut args = frame.values();
    at_least("call", &args, 1)?;
    let callee = args.remove(0);
    interp.call_value(frame, &callee, args, Span::DUMMY)
}

/// `gc()`: run the collector; returns the number of objects released.
///
/// Does nothing while other script threads are running.
fn gc(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    exactly("gc", &frame.values(), 0)?;
    let freed = if interp.runtime().threads().running() == 0 {
        interp.collect_garbage().collected
    } else {
        0
    };
    let freed = i64::try_from(freed).unwrap_or(i64::MAX);
    Ok(interp.heap().alloc(Value::Integer(freed)))
}
