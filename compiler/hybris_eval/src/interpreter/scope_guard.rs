//! RAII guard for user calls.
//!
//! Entering a call pushes a [`CallFrame`] on the interpreter's call stack
//! and the callee's memory frame on the runtime's frame stack. Dropping the
//! guard pops both, so every exit path (normal return, `?` on an error,
//! panic unwinding into a joined thread) leaves the stacks balanced.

use std::ops::{Deref, DerefMut};

use hybris_value::EvalResult;

use super::Interpreter;
use crate::diagnostics::CallFrame;
use crate::frame::Frame;

/// An interpreter inside a user call. Derefs to the interpreter.
pub struct CallScope<'a> {
    interpreter: &'a mut Interpreter,
    frame: Frame,
}

impl Deref for CallScope<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for CallScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        self.interpreter.call_stack.pop();
        self.interpreter.runtime.frames().pop_frame(&self.frame);
    }
}

impl Interpreter {
    /// Enter a call running in `frame`.
    ///
    /// Fails with a recursion-limit error, before anything is pushed, when
    /// the call stack is full.
    pub fn enter_call(&mut self, frame: Frame, call: CallFrame) -> EvalResult<CallScope<'_>> {
        self.call_stack.push(call)?;
        self.runtime.frames().push_frame(frame.clone());
        Ok(CallScope {
            interpreter: self,
            frame,
        })
    }
}
