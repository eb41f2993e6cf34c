//! Calls: name resolution, the user call protocol, builtins and `new`.

use std::sync::Arc;

use hybris_ir::{FunctionDecl, NodeRef, Params, Span};
use hybris_value::{
    arity_mismatch, not_callable, ops, too_many_initializers, undeclared_function,
    undeclared_type, unhandled_exception, EvalResult, Kind, Object, Value,
};

use super::Interpreter;
use crate::builtins::BuiltinFn;
use crate::diagnostics::CallFrame;
use crate::frame::{Frame, FrameState};

/// What a callable value resolves to.
enum Callee {
    Function(Arc<FunctionDecl>),
    Extern(Object),
}

/// A body to run in a new frame.
pub(crate) struct Invocation<'a> {
    pub name: String,
    pub params: &'a Params,
    pub body: &'a NodeRef,
    /// Bound as `me` for methods and constructors.
    pub me: Option<Object>,
}

impl Interpreter {
    /// `name(args)`: builtins first, then user functions, then a variable
    /// holding a function alias or an extern.
    pub(crate) fn call(
        &mut self,
        frame: &Frame,
        name: &str,
        args: &[NodeRef],
        span: Span,
    ) -> EvalResult<Object> {
        if let Some(builtin) = self.runtime.builtins().get(name) {
            let Some(values) = self.arguments(frame, args)? else {
                return Ok(self.null());
            };
            return self.call_builtin(frame, name, builtin, values);
        }
        if let Some(decl) = self.runtime.function(name) {
            return self.call_function(frame, &decl, args, span);
        }
        let variable = frame
            .get(name)
            .or_else(|| self.runtime.global().get(name));
        match variable {
            Some(callee) => self.call_object(frame, &callee, args, span),
            None => Err(undeclared_function(name)),
        }
    }

    /// `(expr)(args)`.
    pub(crate) fn expr_call(
        &mut self,
        frame: &Frame,
        callee: &NodeRef,
        args: &[NodeRef],
        span: Span,
    ) -> EvalResult<Object> {
        let Some(callee) = self.operand(frame, callee)? else {
            return Ok(self.null());
        };
        self.call_object(frame, &callee, args, span)
    }

    fn resolve_callee(&self, callee: &Object) -> EvalResult<Callee> {
        let callee = ops::deref(callee);
        let guard = callee.read();
        match &*guard {
            Value::Alias(decl) => Ok(Callee::Function(Arc::clone(decl))),
            Value::Extern(_) => Ok(Callee::Extern(callee.clone())),
            Value::String(name) => self
                .runtime
                .function(name)
                .map(Callee::Function)
                .ok_or_else(|| undeclared_function(name)),
            other => Err(not_callable(&other.type_name())),
        }
    }

    fn call_object(
        &mut self,
        frame: &Frame,
        callee: &Object,
        args: &[NodeRef],
        span: Span,
    ) -> EvalResult<Object> {
        match self.resolve_callee(callee)? {
            Callee::Function(decl) => self.call_function(frame, &decl, args, span),
            Callee::Extern(external) => {
                let Some(mut values) = self.arguments(frame, args)? else {
                    return Ok(self.null());
                };
                values.insert(0, external);
                self.call_extern(frame, values)
            }
        }
    }

    /// Call an already evaluated callable with evaluated arguments.
    ///
    /// Used by the `call` builtin: the callee may be an alias, an extern or
    /// the name of a user function or builtin.
    pub fn call_value(
        &mut self,
        frame: &Frame,
        callee: &Object,
        values: Vec<Object>,
        span: Span,
    ) -> EvalResult<Object> {
        let builtin = ops::deref(callee)
            .read()
            .as_str()
            .and_then(|name| self.runtime.builtins().get(name).map(|f| (name.to_owned(), f)));
        if let Some((name, builtin)) = builtin {
            return self.call_builtin(frame, &name, builtin, values);
        }
        match self.resolve_callee(callee)? {
            Callee::Function(decl) => {
                check_arity(&decl.name, &decl.params, values.len())?;
                self.invoke(frame, function_invocation(&decl), values, span)
            }
            Callee::Extern(external) => {
                let mut values = values;
                values.insert(0, external);
                self.call_extern(frame, values)
            }
        }
    }

    fn call_function(
        &mut self,
        frame: &Frame,
        decl: &Arc<FunctionDecl>,
        args: &[NodeRef],
        span: Span,
    ) -> EvalResult<Object> {
        check_arity(&decl.name, &decl.params, args.len())?;
        let Some(values) = self.arguments(frame, args)? else {
            return Ok(self.null());
        };
        self.invoke(frame, function_invocation(decl), values, span)
    }

    fn call_extern(&mut self, frame: &Frame, values: Vec<Object>) -> EvalResult<Object> {
        let dllcall = self
            .runtime
            .builtins()
            .get("dllcall")
            .ok_or_else(|| undeclared_function("dllcall"))?;
        self.call_builtin(frame, "dllcall", dllcall, values)
    }

    /// Evaluate call arguments left to right in the caller's frame.
    ///
    /// `None` when an argument raised an exception; no call happens then.
    pub(crate) fn arguments(
        &mut self,
        frame: &Frame,
        args: &[NodeRef],
    ) -> EvalResult<Option<Vec<Object>>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match self.operand(frame, arg)? {
                Some(value) => values.push(value),
                None => return Ok(None),
            }
        }
        Ok(Some(values))
    }

    /// Run a builtin over an argument frame holding `values`.
    pub(crate) fn call_builtin(
        &mut self,
        caller: &Frame,
        name: &str,
        builtin: BuiltinFn,
        values: Vec<Object>,
    ) -> EvalResult<Object> {
        let frame = Frame::new(name);
        {
            let mut memory = frame.lock();
            for value in values {
                memory.push(value);
            }
        }
        let result = builtin(self, &frame)?;
        if self.propagate_exception(&frame, caller) {
            return Ok(self.null());
        }
        Ok(result)
    }

    /// Copy an exception pending in `callee` into `caller`.
    fn propagate_exception(&self, callee: &Frame, caller: &Frame) -> bool {
        let (state, value) = callee.suspend_state();
        if state.contains(FrameState::EXCEPTION) {
            caller.set_state(FrameState::EXCEPTION, value);
            return true;
        }
        false
    }

    /// The user call protocol.
    ///
    /// Binds parameters in a fresh frame (copies of the arguments, extra
    /// variadic arguments as `__arg_N`), runs the body under the recursion
    /// guard and turns a `RETURN` state into the call's value. An exception
    /// left in the callee frame moves to the caller's frame.
    #[tracing::instrument(level = "trace", skip_all, fields(function = %invocation.name))]
    pub(crate) fn invoke(
        &mut self,
        caller: &Frame,
        invocation: Invocation<'_>,
        values: Vec<Object>,
        span: Span,
    ) -> EvalResult<Object> {
        let Invocation {
            name,
            params,
            body,
            me,
        } = invocation;

        let callee = Frame::new(name.clone());
        {
            let heap = self.runtime.heap();
            let mut memory = callee.lock();
            if let Some(me) = me {
                memory.insert("me", me);
            }
            let mut values = values.into_iter();
            for param in &params.names {
                if let Some(value) = values.next() {
                    memory.add(heap, param, &value)?;
                }
            }
            for extra in values {
                memory.push(extra);
            }
        }

        let call = CallFrame {
            name,
            call_span: Some(span),
        };
        {
            let mut scope = self.enter_call(callee.clone(), call)?;
            if let Err(err) = scope.evaluate(&callee, body) {
                return Err(scope.trace_error(err));
            }
        }

        if self.propagate_exception_or_return(&callee, caller) {
            return Ok(self.null());
        }
        Ok(callee
            .take_state_value()
            .unwrap_or_else(|| self.null()))
    }

    /// Move an exception to `caller`, or keep a `RETURN` value in `callee`
    /// for the caller to take. True when an exception moved.
    fn propagate_exception_or_return(&self, callee: &Frame, caller: &Frame) -> bool {
        let mut memory = callee.lock();
        if memory.has_state(FrameState::EXCEPTION) {
            let value = memory.take_state_value();
            memory.unset_state(FrameState::INTERRUPTED);
            drop(memory);
            caller.set_state(FrameState::EXCEPTION, value);
            return true;
        }
        if !memory.has_state(FrameState::RETURN) {
            memory.take_state_value();
        }
        memory.unset_state(FrameState::INTERRUPTED);
        false
    }

    /// `new Type(args)`.
    ///
    /// The descriptor is copied; a class copy gets a fresh destructor
    /// identity. A class runs its constructor (a method named like the class)
    /// when one matches the argument count, anything else assigns the
    /// arguments to the instance attributes in order.
    pub(crate) fn new_instance(
        &mut self,
        frame: &Frame,
        type_name: &str,
        args: &[NodeRef],
        span: Span,
    ) -> EvalResult<Object> {
        let descriptor = self
            .runtime
            .type_descriptor(type_name)
            .ok_or_else(|| undeclared_type(type_name))?;
        let value = match ops::clone_value(self.heap(), &descriptor.read()) {
            Value::Class(class) => Value::Class(class.instantiate()),
            other => other,
        };
        let instance = self.heap().alloc(value);

        if instance.kind() == Kind::Class {
            let constructor = instance
                .read()
                .as_class()
                .and_then(|class| class.methods.lookup(type_name, args.len()).cloned());
            if let Some(constructor) = constructor {
                let name = format!("{type_name}.{type_name}");
                check_arity(&name, &constructor.params, args.len())?;
                let Some(values) = self.arguments(frame, args)? else {
                    return Ok(self.null());
                };
                let invocation = Invocation {
                    name,
                    params: &constructor.params,
                    body: &constructor.body,
                    me: Some(instance.clone()),
                };
                self.invoke(frame, invocation, values, span)?;
                return Ok(instance);
            }
        }

        let Some(values) = self.arguments(frame, args)? else {
            return Ok(self.null());
        };
        let slots: Vec<String> = instance
            .read()
            .attributes()
            .unwrap_or_default()
            .iter()
            .filter(|a| !a.is_static)
            .map(|a| a.name.clone())
            .collect();
        if values.len() > slots.len() {
            return Err(too_many_initializers(type_name, slots.len(), values.len()));
        }
        for (slot, value) in slots.iter().zip(&values) {
            ops::set_attribute(self.heap(), &instance, slot, value)?;
        }
        Ok(instance)
    }

    /// Run a user function on a new script thread's interpreter.
    ///
    /// An exception escaping the function is fatal for the thread.
    pub(crate) fn run_thread(
        &mut self,
        decl: &Arc<FunctionDecl>,
        values: Vec<Object>,
    ) -> EvalResult<Object> {
        let frame = Frame::new(format!("thread {}", decl.name));
        let result = self.invoke(&frame, function_invocation(decl), values, Span::DUMMY)?;
        let (state, value) = frame.suspend_state();
        if state.contains(FrameState::EXCEPTION) {
            let thrown = value.unwrap_or_else(|| self.null());
            thrown.unpin();
            let shown = self
                .display(&frame, &thrown)
                .unwrap_or_else(|_| thrown.read().to_string());
            return Err(unhandled_exception(shown));
        }
        Ok(result)
    }
}

fn function_invocation(decl: &FunctionDecl) -> Invocation<'_> {
    Invocation {
        name: decl.name.clone(),
        params: &decl.params,
        body: &decl.body,
        me: None,
    }
}

pub(crate) fn check_arity(name: &str, params: &Params, argc: usize) -> EvalResult<()> {
    if params.accepts(argc) {
        Ok(())
    } else {
        Err(arity_mismatch(name, params.arity(), params.variadic, argc))
    }
}
