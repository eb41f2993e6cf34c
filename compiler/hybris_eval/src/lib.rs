#![allow(
    clippy::result_large_err,
    reason = "EvalError carries span, backtrace and notes; boxing would obscure the API"
)]
//! Hybris Eval - tree-walking engine for Hybris scripts.
//!
//! # Architecture
//!
//! The engine uses:
//! - `Runtime`: per-run shared state (heap, global tables, frame stack,
//!   print handler, thread and extern registries)
//! - `Interpreter`: one evaluator per script thread over a shared runtime
//! - `Frame`/`MemoryFrame`: ordered variable bindings plus a control-flow
//!   state (`BREAK`, `NEXT`, `RETURN`, `EXCEPTION`)
//! - `BuiltinRegistry`: the builtin function library
//! - `CallStack`: recursion guard and backtraces for fatal errors
//!
//! # Re-exports
//!
//! Value types and error constructors come from `hybris_value`:
//! - `Value`, `Object`, `Heap`, `Kind`
//! - `EvalError`, `EvalResult`

mod builtins;
pub mod diagnostics;
mod frame;
pub mod interpreter;
mod print_handler;
mod runtime;

// Re-export value types from hybris_value
pub use hybris_value::{
    ops, ErrorCategory, EvalError, EvalErrorKind, EvalNote, EvalResult, GcStats, Heap, Kind, Object,
    Value,
};

pub use builtins::{BuiltinFn, BuiltinRegistry};
pub use diagnostics::{CallFrame, CallStack};
pub use frame::{Frame, FrameStack, FrameState, MemoryFrame};
pub use interpreter::{CallScope, Completion, Interpreter, InterpreterBuilder};
pub use runtime::{ExternRegistry, Runtime, RuntimeConfig, ThreadRegistry, VERSION};

// Print handler
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler, StdoutPrintHandler,
};
