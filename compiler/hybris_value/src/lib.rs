#![allow(
    clippy::result_large_err,
    reason = "EvalError is fundamental, boxing would add complexity across the crate"
)]
//! Hybris Value - object model for the Hybris interpreter.
//!
//! This crate provides:
//! - Runtime objects (`Object`) holding a tagged payload (`Value`)
//! - Struct and class descriptors with method tables for overloading
//! - The single dispatch point for typed operations (`ops`)
//! - The allocator and cycle collector (`Heap`)
//! - Evaluation error types (`EvalError`, `EvalResult`)
//!
//! # Object Handles
//!
//! Objects are shared, thread-safe cells:
//! - All allocations go through `Heap::alloc` / `Heap::constant`
//! - The cell constructor is private, so every object is visible to the collector
//! - Payloads sit behind an `RwLock`; attributes and pins are atomics

mod errors;
mod heap;
mod object;
pub mod ops;
mod value;

pub use errors::{
    BacktraceFrame, ErrorCategory, EvalBacktrace, EvalError, EvalErrorKind, EvalNote, EvalResult,
};
pub use heap::{GcStats, Heap};
pub use object::{Attributes, Object, PinGuard};
pub use value::{
    format_float, Attribute, ClassValue, Expiry, ExternFn, ExternValue, Kind, MapValue,
    MatrixValue, MethodTable, Overloads, StructValue, Value, DESTRUCTOR,
};

// Re-export error constructors for use by the engine
pub use errors::{
    // Syntax errors
    arity_mismatch,
    duplicate_function,
    duplicate_type,
    illegal_access,
    invalid_assignment,
    missing_overload,
    not_callable,
    too_many_initializers,
    undeclared_function,
    undeclared_identifier,
    undeclared_type,
    undefined_attribute,
    undefined_method,
    // Generic errors
    constant_modification,
    division_by_zero,
    extern_error,
    index_out_of_bounds,
    no_mapped_value,
    recursion_limit,
    thread_error,
    // Type errors
    invalid_range,
    type_mismatch,
    // Unsupported operations
    unsupported_operation,
    // Exceptions
    unhandled_exception,
};
