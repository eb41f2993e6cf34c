//! Call-stack tracking for the engine.
//!
//! Each interpreter (one per script thread) owns a [`CallStack`]. Every user
//! function or method call pushes a [`CallFrame`]; the depth limit is checked
//! on push, which is the engine's recursion guard. When an error escapes,
//! the frames are snapshotted into an [`EvalBacktrace`] on the error.

use hybris_ir::Span;
use hybris_value::{recursion_limit, BacktraceFrame, EvalBacktrace, EvalError};

/// A single frame in the live call stack.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Function or method name (`Type.method` for methods).
    pub name: String,
    /// Source location of the call site.
    pub call_span: Option<Span>,
}

/// Live call stack of one interpreter.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a call frame, checking the depth limit.
    ///
    /// The frame is not pushed when the limit is reached.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if self.frames.len() >= self.max_depth {
            return Err(recursion_limit(self.max_depth));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn current_frame(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Snapshot of the stack, most recent call first.
    pub fn capture(&self) -> EvalBacktrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .map(|f| BacktraceFrame {
                name: f.name.clone(),
                span: f.call_span,
            })
            .collect();
        EvalBacktrace::new(frames)
    }

    /// Attach a backtrace from this call stack to an error.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}
