//! Builder for configuring Interpreter instances.

use std::sync::Arc;

use hybris_value::ExternFn;

use super::Interpreter;
use crate::builtins::{BuiltinFn, BuiltinRegistry};
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::runtime::{ExternRegistry, Runtime, RuntimeConfig};

/// Builder for creating an [`Interpreter`] over a fresh [`Runtime`].
///
/// Starts from the default builtin library, the host extern libraries and
/// a stdout print handler.
pub struct InterpreterBuilder {
    config: RuntimeConfig,
    print_handler: Option<SharedPrintHandler>,
    builtins: BuiltinRegistry,
    externs: ExternRegistry,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            print_handler: None,
            builtins: BuiltinRegistry::with_defaults(),
            externs: ExternRegistry::with_host_libraries(),
        }
    }

    /// Replace the whole runtime configuration.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn gc_threshold(mut self, threshold: usize) -> Self {
        self.config.gc_threshold = threshold;
        self
    }

    #[must_use]
    pub fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.config.max_recursion_depth = depth;
        self
    }

    #[must_use]
    pub fn stack_trace(mut self, enabled: bool) -> Self {
        self.config.stack_trace = enabled;
        self
    }

    /// Set the print handler for output.
    ///
    /// Use `buffer_handler()` for tests, `stdout_handler()` for the CLI.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Register an extra builtin, replacing any builtin of the same name.
    #[must_use]
    pub fn builtin(mut self, name: &str, function: BuiltinFn) -> Self {
        self.builtins.register(name, function);
        self
    }

    /// Register a host function that scripts can reach through
    /// `dllopen`/`dlllink`.
    #[must_use]
    pub fn extern_fn(self, library: &str, name: &str, function: ExternFn) -> Self {
        self.externs.register(library, name, function);
        self
    }

    pub fn build(self) -> Interpreter {
        let print = self.print_handler.unwrap_or_else(stdout_handler);
        let runtime = Runtime::new(self.config, self.builtins, self.externs, print);
        Interpreter::new(Arc::new(runtime))
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
