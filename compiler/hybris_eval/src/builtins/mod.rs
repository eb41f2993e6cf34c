//! Builtin functions.
//!
//! A builtin receives the interpreter and a frame holding its evaluated
//! arguments (bound as `__arg_0`, `__arg_1`, ...). It may raise a script
//! exception by throwing in that frame; the caller's frame receives it.
//! Fatal errors are returned as `Err`.

mod collections;
mod dll;
mod general;
mod threads;

use rustc_hash::FxHashMap;

use hybris_value::{arity_mismatch, type_mismatch, EvalResult, Object};

use crate::frame::Frame;
use crate::interpreter::Interpreter;

/// Signature of a builtin function.
pub type BuiltinFn = fn(&mut Interpreter, &Frame) -> EvalResult<Object>;

/// Name table of builtin functions.
#[derive(Clone, Default)]
pub struct BuiltinRegistry {
    functions: FxHashMap<String, BuiltinFn>,
}

impl BuiltinRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard library.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        general::register(&mut registry);
        collections::register(&mut registry);
        threads::register(&mut registry);
        dll::register(&mut registry);
        registry
    }

    pub fn register(&mut self, name: &str, function: BuiltinFn) {
        self.functions.insert(name.to_owned(), function);
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.functions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl std::fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

// Argument helpers

fn exactly(name: &str, args: &[Object], count: usize) -> EvalResult<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(arity_mismatch(name, count, false, args.len()))
    }
}

fn at_least(name: &str, args: &[Object], count: usize) -> EvalResult<()> {
    if args.len() >= count {
        Ok(())
    } else {
        Err(arity_mismatch(name, count, true, args.len()))
    }
}

/// String payload of an argument.
fn string_arg(args: &[Object], index: usize) -> EvalResult<String> {
    let object = hybris_value::ops::deref(&args[index]);
    let guard = object.read();
    guard
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| type_mismatch("string", &guard.type_name()))
}

fn usize_arg(args: &[Object], index: usize) -> EvalResult<usize> {
    let object = hybris_value::ops::deref(&args[index]);
    let guard = object.read();
    guard
        .as_int()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| type_mismatch("non-negative int", &guard.type_name()))
}

#[cfg(test)]
mod tests;
