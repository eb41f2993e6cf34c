//! Script threads: `pthread_create`, `pthread_join`, `pthread_exit`.

use std::sync::Arc;

use hybris_ir::FunctionDecl;
use hybris_value::{not_callable, ops, thread_error, undeclared_function, EvalResult, Object, Value};

use super::{at_least, exactly, BuiltinRegistry};
use crate::frame::Frame;
use crate::interpreter::{check_arity, Interpreter};

pub(super) fn register(registry: &mut BuiltinRegistry) {
    registry.register("pthread_create", pthread_create);
    registry.register("pthread_join", pthread_join);
    registry.register("pthread_exit", pthread_exit);
}

fn thread_function(interp: &Interpreter, callee: &Object) -> EvalResult<Arc<FunctionDecl>> {
    let callee = ops::deref(callee);
    let guard = callee.read();
    match &*guard {
        Value::Alias(decl) => Ok(Arc::clone(decl)),
        Value::String(name) => interp
            .runtime()
            .function(name)
            .ok_or_else(|| undeclared_function(name)),
        other => Err(not_callable(&other.type_name())),
    }
}

/// `pthread_create(f, args...)`: run `f` on a new thread with copies of
/// `args`; returns the thread id.
fn pthread_create(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    at_least("pthread_create", &args, 1)?;
    let decl = thread_function(interp, &args[0])?;
    check_arity(&decl.name, &decl.params, args.len() - 1)?;

    // The callee copy at index 0 is dropped; the thread gets the rest.
    let values = frame.deep_clone(interp.heap()).values().split_off(1);
    let name = decl.name.clone();
    let mut worker = interp.fork();
    let id = interp
        .runtime()
        .threads()
        .spawn(&name, move || worker.run_thread(&decl, values))
        .map_err(|e| thread_error(format!("unable to start thread: {e}")))?;
    Ok(interp.heap().alloc(Value::Integer(id)))
}

/// `pthread_join(id)`: wait for a thread and return its function's value.
fn pthread_join(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    let args = frame.values();
    exactly("pthread_join", &args, 1)?;
    let id = ops::to_int(&args[0].read())?;
    match interp.runtime().threads().join(id) {
        None => Err(thread_error(format!("no running thread with id {id}"))),
        Some(Err(_)) => Err(thread_error(format!("thread {id} panicked"))),
        Some(Ok(result)) => result,
    }
}

/// `pthread_exit()`: end the calling thread.
fn pthread_exit(interp: &mut Interpreter, frame: &Frame) -> EvalResult<Object> {
    exactly("pthread_exit", &frame.values(), 0)?;
    interp.exit_thread();
    Ok(interp.null())
}
