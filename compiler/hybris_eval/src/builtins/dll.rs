//! Native calls through the host extern registry.
//!
//! `dllopen` checks that a library is registered and returns a handle,
//! `dlllink` resolves a function in it, and `dllcall` marshals arguments
//! as plain values and wraps the result. Every object coming back from
//! the native side is flagged `EXTERN`.

use hybris_value::{
    extern_error, ops, type_mismatch, Attributes, EvalResult, Object, Value,
};

use super::{at_least, exactly, string_arg, BuiltinRegistry};
use crate::frame::Frame;
use crate::interpreter::Interpreter;

pub(super) fn register(registry: &mut BuiltinRegistry) {
    registry.register("dllopen", dllopen);
    registry.register("dlllink", dlllink);
    registry.register("dllcall", dllcall);
}

/// `dllopen(name)`: a handle (the library name) for `dlllink`.
fn dllopen(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("dllopen", &args, 1)?;
    let library = string_arg(&args, 0)?;
    if !interp.runtime().externs().has_library(&library) {
        return Err(extern_error(format!("unable to open library '{library}'")));
    }
    tracing::debug!(%library, "opened library");
    Ok(interp
        .heap()
        .alloc_with(Value::String(library), Attributes::EXTERN))
}

/// `dlllink(handle, name)`: a callable extern.
fn dlllink(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("dlllink", &args, 2)?;
    let library = string_arg(&args, 0)?;
    let name = string_arg(&args, 1)?;
    let function = interp
        .runtime()
        .externs()
        .link(&library, &name)
        .ok_or_else(|| extern_error(format!("unable to find symbol '{name}' in '{library}'")))?;
    Ok(interp
        .heap()
        .alloc_with(Value::Extern(function), Attributes::EXTERN))
}

/// `dllcall(fn, args...)`.
fn dllcall(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    at_least("dllcall", &args, 1)?;
    let function = match &*ops::deref(&args[0]).read() {
        Value::Extern(function) => function.clone(),
        other => return Err(type_mismatch("extern", &other.type_name())),
    };
    let values: Vec<Value> = args[1..]
        .iter()
        .map(|arg| ops::deref(arg).snapshot())
        .collect();
    tracing::trace!(library = %function.library, function = %function.name, "dllcall");
    let result = (function.function)(&values).map_err(|message| {
        extern_error(format!("{}.{}: {message}", function.library, function.name))
    })?;
    Ok(interp.heap().alloc_with(result, Attributes::EXTERN))
}
