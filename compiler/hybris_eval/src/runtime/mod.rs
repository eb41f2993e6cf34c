//! The runtime context shared by every interpreter of a script.
//!
//! One [`Runtime`] exists per script run and is shared (`Arc`) by the main
//! interpreter and every thread started with `pthread_create`. It owns the
//! heap, the global tables (constants, builtins, functions, types), the
//! frame stack with the global frame at its bottom, the print handler and
//! the thread and extern registries. Nothing here is a process-wide
//! singleton: embedders may run several runtimes side by side.

mod externs;
mod threads;

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use hybris_ir::{FunctionDecl, Literal};
use hybris_value::{Heap, Object, Value};

use crate::builtins::BuiltinRegistry;
use crate::frame::{Frame, FrameStack};
use crate::print_handler::SharedPrintHandler;

pub use externs::ExternRegistry;
pub use threads::ThreadRegistry;

/// Version string exposed to scripts as `HYBRIS_VERSION`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine limits and collector policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Allocations between two collector runs at statement safepoints.
    pub gc_threshold: usize,
    /// Deepest allowed nesting of user function and method calls.
    pub max_recursion_depth: usize,
    /// Attach the script call stack to fatal errors.
    pub stack_trace: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            gc_threshold: 4096,
            max_recursion_depth: 10_000,
            stack_trace: false,
        }
    }
}

/// Shared state of one script run.
pub struct Runtime {
    heap: Heap,
    config: RuntimeConfig,
    /// Named constants (`null`, `PI`, ...), resolved before any variable.
    constants: FxHashMap<String, Object>,
    /// Interned literal constants, keyed by literal.
    literals: RwLock<FxHashMap<Literal, Object>>,
    builtins: BuiltinRegistry,
    functions: RwLock<FxHashMap<String, Arc<FunctionDecl>>>,
    /// Struct and class descriptors, flattened at declaration.
    types: RwLock<FxHashMap<String, Object>>,
    frames: FrameStack,
    print: SharedPrintHandler,
    threads: ThreadRegistry,
    externs: ExternRegistry,
    null: Object,
}

impl Runtime {
    pub(crate) fn new(
        config: RuntimeConfig,
        builtins: BuiltinRegistry,
        externs: ExternRegistry,
        print: SharedPrintHandler,
    ) -> Self {
        let heap = Heap::new();
        let null = heap.constant(Value::Integer(0));
        let constants = [
            ("null", null.clone()),
            ("PI", heap.constant(Value::Float(std::f64::consts::PI))),
            ("E", heap.constant(Value::Float(std::f64::consts::E))),
            ("HYBRIS_VERSION", heap.constant(Value::String(VERSION.to_string()))),
        ]
        .into_iter()
        .map(|(name, object)| (name.to_string(), object))
        .collect();

        Self {
            heap,
            config,
            constants,
            literals: RwLock::new(FxHashMap::default()),
            builtins,
            functions: RwLock::new(FxHashMap::default()),
            types: RwLock::new(FxHashMap::default()),
            frames: FrameStack::new(),
            print,
            threads: ThreadRegistry::new(),
            externs,
            null,
        }
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }

    pub fn frames(&self) -> &FrameStack {
        &self.frames
    }

    #[inline]
    pub fn global(&self) -> &Frame {
        self.frames.global()
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    pub fn threads(&self) -> &ThreadRegistry {
        &self.threads
    }

    pub fn externs(&self) -> &ExternRegistry {
        &self.externs
    }

    /// The constant returned by statements and calls without a value.
    #[inline]
    pub fn null(&self) -> Object {
        self.null.clone()
    }

    pub fn constant(&self, name: &str) -> Option<Object> {
        self.constants.get(name).cloned()
    }

    /// The shared constant object for a literal.
    pub fn literal(&self, literal: &Literal) -> Object {
        if let Some(object) = self.literals.read().get(literal) {
            return object.clone();
        }
        let value = match literal {
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Float(bits) => Value::Float(f64::from_bits(*bits)),
            Literal::Char(c) => Value::Char(*c),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::String(s) => Value::String(s.clone()),
        };
        self.literals
            .write()
            .entry(literal.clone())
            .or_insert_with(|| self.heap.constant(value))
            .clone()
    }

    // Functions

    pub fn function(&self, name: &str) -> Option<Arc<FunctionDecl>> {
        self.functions.read().get(name).cloned()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    /// Register a user function; returns `false` if the name is taken.
    pub(crate) fn define_function(&self, decl: Arc<FunctionDecl>) -> bool {
        let mut functions = self.functions.write();
        if functions.contains_key(&decl.name) {
            return false;
        }
        functions.insert(decl.name.clone(), decl);
        true
    }

    // Types

    /// The descriptor of a declared struct or class.
    pub fn type_descriptor(&self, name: &str) -> Option<Object> {
        self.types.read().get(name).cloned()
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Register a type descriptor; returns `false` if the name is taken.
    pub(crate) fn define_type(&self, name: &str, descriptor: Object) -> bool {
        let mut types = self.types.write();
        if types.contains_key(name) {
            return false;
        }
        types.insert(name.to_string(), descriptor);
        true
    }
}
