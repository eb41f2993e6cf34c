//! Tree-walking interpreter for Hybris.
//!
//! # Architecture
//!
//! An [`Interpreter`] evaluates nodes against a shared [`Runtime`]. There is
//! one interpreter per script thread; each has its own [`CallStack`] while
//! the runtime (heap, global tables, frame stack) is shared.
//!
//! [`Interpreter::evaluate`] is the single dispatch point over node kinds.
//! Helper modules split the work:
//!
//! - `expr` - identifiers, operators, assignment, indexing, literals
//! - `control` - blocks, conditionals, loops, switch, try/throw, jumps
//! - `call` - call resolution, the user call protocol, builtins, `new`
//! - `class` - declarations, member access, methods, operator overloads
//!
//! # Control flow
//!
//! `return`, `break`, `next` and `throw` do not unwind the Rust stack: they
//! set the state of the current [`Frame`] and every later `evaluate` in that
//! frame returns immediately. Loops consume `BREAK`/`NEXT`, the call boundary
//! consumes `RETURN` and copies `EXCEPTION` into the caller's frame, and
//! `try` consumes `EXCEPTION`. [`EvalError`]s, in contrast, are fatal and
//! propagate through `Result`.

mod builder;
mod call;
mod class;
mod control;
mod expr;
mod scope_guard;

use std::sync::Arc;

use hybris_ir::{NodeKind, NodeRef, Span};
use hybris_stack::ensure_sufficient_stack;
use hybris_value::{
    ops, thread_error, unhandled_exception, EvalError, EvalResult, GcStats, Heap, Object, Value,
    DESTRUCTOR,
};

use crate::diagnostics::CallStack;
use crate::frame::{Frame, FrameState};
use crate::runtime::Runtime;

pub use builder::InterpreterBuilder;
pub use scope_guard::CallScope;

pub(crate) use call::check_arity;

/// How a top-level statement completed.
#[derive(Clone, Debug)]
pub enum Completion {
    /// The statement ran to its end; carries its value.
    Value(Object),
    /// A top-level `return` ended the script with this value.
    Return(Object),
    /// `pthread_exit()` was called on the main thread.
    Exit,
}

/// Evaluator for one script thread.
pub struct Interpreter {
    runtime: Arc<Runtime>,
    call_stack: CallStack,
    /// Set by `pthread_exit()`; short-circuits all evaluation.
    exiting: bool,
}

impl Interpreter {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        let call_stack = CallStack::new(runtime.config().max_recursion_depth);
        Self {
            runtime,
            call_stack,
            exiting: false,
        }
    }

    /// A fresh interpreter over the same runtime, for a new script thread.
    pub fn fork(&self) -> Interpreter {
        Interpreter::new(Arc::clone(&self.runtime))
    }

    #[inline]
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        self.runtime.heap()
    }

    #[inline]
    pub fn null(&self) -> Object {
        self.runtime.null()
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Whether `pthread_exit()` ended this thread.
    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    /// End the current script thread at the next evaluation step.
    pub fn exit_thread(&mut self) {
        self.exiting = true;
    }

    /// Wait for every script thread nobody joined. The first fatal error of
    /// a thread is returned after all threads finished.
    pub fn join_threads(&mut self) -> EvalResult<()> {
        let mut first = None;
        for outcome in self.runtime.threads().join_all() {
            let err = match outcome {
                Ok(Ok(_)) => continue,
                Ok(Err(err)) => err,
                Err(_) => thread_error("thread panicked"),
            };
            tracing::warn!(%err, "script thread failed");
            first.get_or_insert(err);
        }
        first.map_or(Ok(()), Err)
    }

    /// Bind the script arguments as the globals `argv` (vector of strings)
    /// and `argc`.
    pub fn set_script_args(&self, args: &[String]) -> EvalResult<()> {
        let heap = self.heap();
        let items = args
            .iter()
            .map(|a| heap.alloc(Value::String(a.clone())))
            .collect();
        let argv = heap.alloc(Value::Vector(items));
        let argc = heap.alloc(Value::Integer(i64::try_from(args.len()).unwrap_or(i64::MAX)));
        let global = self.runtime.global();
        global.add(heap, "argv", &argv)?;
        global.add(heap, "argc", &argc)?;
        Ok(())
    }

    /// Execute one top-level statement in the global frame.
    ///
    /// An exception still pending afterwards is unhandled and becomes a
    /// fatal error.
    pub fn execute(&mut self, node: &NodeRef) -> EvalResult<Completion> {
        let global = self.runtime.global().clone();
        let value = self.evaluate(&global, node)?;

        let (state, pending) = global.suspend_state();
        if state.contains(FrameState::EXCEPTION) {
            let thrown = pending.unwrap_or_else(|| self.null());
            thrown.unpin();
            let shown = self
                .display(&global, &thrown)
                .unwrap_or_else(|_| thrown.read().to_string());
            return Err(unhandled_exception(shown).with_span(node.span));
        }
        if self.exiting {
            return Ok(Completion::Exit);
        }
        if state.contains(FrameState::RETURN) {
            return Ok(Completion::Return(pending.unwrap_or_else(|| self.null())));
        }
        if state.intersects(FrameState::BREAK | FrameState::NEXT) {
            tracing::warn!(span = %node.span, "break or next outside of a loop");
        }
        self.safepoint();
        Ok(Completion::Value(value))
    }

    /// Evaluate `node` in `frame`.
    ///
    /// Returns the null constant without evaluating anything when the frame
    /// has a pending control transfer.
    pub fn evaluate(&mut self, frame: &Frame, node: &NodeRef) -> EvalResult<Object> {
        if self.exiting || frame.is_interrupted() {
            return Ok(self.null());
        }
        tracing::trace!(node = node.label(), span = %node.span, "evaluate");
        ensure_sufficient_stack(|| self.dispatch(frame, node)).map_err(|e| e.with_span(node.span))
    }

    fn dispatch(&mut self, frame: &Frame, node: &NodeRef) -> EvalResult<Object> {
        let span = node.span;
        match &node.kind {
            // Atoms
            NodeKind::Constant(literal) => Ok(self.runtime.literal(literal)),
            NodeKind::Identifier(name) => self.identifier(frame, name),
            NodeKind::Vector(items) => self.vector_literal(frame, items),
            NodeKind::Map(pairs) => self.map_literal(frame, pairs),

            // Expressions
            NodeKind::Binary { op, lhs, rhs } => self.binary(frame, *op, lhs, rhs, span),
            NodeKind::Unary { op, operand } => self.unary(frame, *op, operand, span),
            NodeKind::Step {
                op,
                target,
                postfix,
            } => self.step(frame, *op, target, *postfix, span),
            NodeKind::Reference(inner) => self.reference(frame, inner),
            NodeKind::Assign { op, target, value } => self.assign(frame, *op, target, value, span),
            NodeKind::Index { owner, index } => self.index(frame, owner, index, span),
            NodeKind::Member { owner, name } => self.member(frame, owner, name, span),
            NodeKind::MethodCall { owner, name, args } => {
                self.method_call(frame, owner, name, args, span)
            }
            NodeKind::Call { name, args } => self.call(frame, name, args, span),
            NodeKind::ExprCall { callee, args } => self.expr_call(frame, callee, args, span),
            NodeKind::New { type_name, args } => self.new_instance(frame, type_name, args, span),
            NodeKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => self.ternary(frame, cond, then_branch, else_branch),

            // Declarations
            NodeKind::FunctionDecl(decl) => self.declare_function(decl),
            NodeKind::StructDecl(decl) => self.declare_struct(decl),
            NodeKind::ClassDecl(decl) => self.declare_class(frame, decl),

            // Statements
            NodeKind::Block(statements) => self.block(frame, statements),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.if_else(frame, cond, then_branch, else_branch.as_ref()),
            NodeKind::Unless { cond, body } => self.unless(frame, cond, body),
            NodeKind::While { cond, body } => self.while_loop(frame, cond, body),
            NodeKind::DoWhile { body, cond } => self.do_while(frame, body, cond),
            NodeKind::For {
                init,
                cond,
                step,
                body,
            } => self.for_loop(frame, init.as_ref(), cond.as_ref(), step.as_ref(), body),
            NodeKind::Foreach {
                ident,
                iterable,
                body,
            } => self.foreach(frame, ident, iterable, body),
            NodeKind::ForeachMapping {
                key,
                value,
                iterable,
                body,
            } => self.foreach_mapping(frame, key, value, iterable, body),
            NodeKind::Switch {
                target,
                cases,
                default,
            } => self.switch(frame, target, cases, default.as_ref()),
            NodeKind::Try {
                body,
                catch_ident,
                catch_body,
                finally,
            } => self.try_catch(frame, body, catch_ident, catch_body, finally.as_ref()),
            NodeKind::Throw(value) => self.throw(frame, value),
            NodeKind::Return(value) => self.return_value(frame, value.as_ref()),
            NodeKind::Break => self.jump(frame, FrameState::BREAK),
            NodeKind::Next => self.jump(frame, FrameState::NEXT),
        }
    }

    /// Evaluate an operand; `None` if evaluation left `frame` interrupted,
    /// in which case the caller must stop without side effects.
    pub(crate) fn operand(&mut self, frame: &Frame, node: &NodeRef) -> EvalResult<Option<Object>> {
        let value = self.evaluate(frame, node)?;
        Ok((!self.exiting && !frame.is_interrupted()).then_some(value))
    }

    /// Display form of `object`, through `__to_string` for class instances.
    pub fn display(&mut self, frame: &Frame, object: &Object) -> EvalResult<String> {
        let object = ops::deref(object);
        match self.call_method(frame, &object, class::TO_STRING_HOOK, Vec::new(), Span::DUMMY)? {
            Some(text) => Ok(ops::deref(&text).read().to_string()),
            None => Ok(object.read().to_string()),
        }
    }

    // Collection

    /// Run the collector now, invoking `__expire` on collected instances.
    pub fn collect_garbage(&mut self) -> GcStats {
        let runtime = Arc::clone(&self.runtime);
        let _roots = runtime.frames().roots();
        runtime.heap().collect(&mut |object| self.finalize(object))
    }

    fn finalize(&mut self, object: &Object) {
        let frame = Frame::new(DESTRUCTOR);
        match self.call_method(&frame, object, DESTRUCTOR, Vec::new(), Span::DUMMY) {
            Ok(_) if frame.has_state(FrameState::EXCEPTION) => {
                tracing::warn!(object = ?object, "exception thrown from destructor ignored");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(%err, "destructor failed"),
        }
    }

    /// Statement safepoint: collect when enough objects were allocated and
    /// no other script thread is running.
    pub(crate) fn safepoint(&mut self) {
        let runtime = &self.runtime;
        if runtime.heap().pending() > runtime.config().gc_threshold
            && runtime.threads().running() == 0
        {
            self.collect_garbage();
        }
    }

    /// Attach the call stack to an error escaping a call, when enabled.
    pub(crate) fn trace_error(&self, err: EvalError) -> EvalError {
        if self.runtime.config().stack_trace {
            self.call_stack.attach_backtrace(err)
        } else {
            err
        }
    }
}
