//! Statements and control flow.
//!
//! Jumps are frame states, not Rust unwinding: every statement loop checks
//! the frame after each step and stops as soon as a state is pending.

use hybris_ir::{NodeRef, SwitchCase};
use hybris_value::{ops, type_mismatch, unsupported_operation, EvalResult, Object, Value};

use super::Interpreter;
use crate::frame::{Frame, FrameState};

impl Interpreter {
    pub(crate) fn block(&mut self, frame: &Frame, statements: &[NodeRef]) -> EvalResult<Object> {
        let mut last = self.null();
        for statement in statements {
            last = self.evaluate(frame, statement)?;
            if self.exiting || frame.is_interrupted() {
                break;
            }
            self.safepoint();
        }
        Ok(last)
    }

    fn condition(&mut self, frame: &Frame, cond: &NodeRef) -> EvalResult<Option<bool>> {
        Ok(self
            .operand(frame, cond)?
            .map(|value| ops::to_bool(&value.read())))
    }

    pub(crate) fn if_else(
        &mut self,
        frame: &Frame,
        cond: &NodeRef,
        then_branch: &NodeRef,
        else_branch: Option<&NodeRef>,
    ) -> EvalResult<Object> {
        match (self.condition(frame, cond)?, else_branch) {
            (Some(true), _) => self.evaluate(frame, then_branch),
            (Some(false), Some(otherwise)) => self.evaluate(frame, otherwise),
            _ => Ok(self.null()),
        }
    }

    pub(crate) fn unless(
        &mut self,
        frame: &Frame,
        cond: &NodeRef,
        body: &NodeRef,
    ) -> EvalResult<Object> {
        match self.condition(frame, cond)? {
            Some(false) => self.evaluate(frame, body),
            _ => Ok(self.null()),
        }
    }

    /// After one loop iteration: consume `NEXT`, consume `BREAK` and report
    /// that the loop ends, and end it as well on `RETURN` or `EXCEPTION`.
    fn leave_loop(&self, frame: &Frame) -> bool {
        let mut memory = frame.lock();
        memory.unset_state(FrameState::NEXT);
        if memory.has_state(FrameState::BREAK) {
            memory.unset_state(FrameState::BREAK);
            return true;
        }
        self.exiting || memory.has_state(FrameState::RETURN | FrameState::EXCEPTION)
    }

    pub(crate) fn while_loop(
        &mut self,
        frame: &Frame,
        cond: &NodeRef,
        body: &NodeRef,
    ) -> EvalResult<Object> {
        while let Some(true) = self.condition(frame, cond)? {
            self.evaluate(frame, body)?;
            if self.leave_loop(frame) {
                break;
            }
        }
        Ok(self.null())
    }

    pub(crate) fn do_while(
        &mut self,
        frame: &Frame,
        body: &NodeRef,
        cond: &NodeRef,
    ) -> EvalResult<Object> {
        loop {
            self.evaluate(frame, body)?;
            if self.leave_loop(frame) {
                break;
            }
            if self.condition(frame, cond)? != Some(true) {
                break;
            }
        }
        Ok(self.null())
    }

    pub(crate) fn for_loop(
        &mut self,
        frame: &Frame,
        init: Option<&NodeRef>,
        cond: Option<&NodeRef>,
        step: Option<&NodeRef>,
        body: &NodeRef,
    ) -> EvalResult<Object> {
        if let Some(init) = init {
            if self.operand(frame, init)?.is_none() {
                return Ok(self.null());
            }
        }
        loop {
            if let Some(cond) = cond {
                if self.condition(frame, cond)? != Some(true) {
                    break;
                }
            }
            self.evaluate(frame, body)?;
            if self.leave_loop(frame) {
                break;
            }
            if let Some(step) = step {
                if self.operand(frame, step)?.is_none() {
                    break;
                }
            }
        }
        Ok(self.null())
    }

    /// Element `index` of a live sequence, re-read on every iteration so
    /// that the body may grow or shrink it.
    fn element(&self, sequence: &Object, index: usize) -> EvalResult<Option<Object>> {
        let heap = self.heap();
        let guard = sequence.read();
        let element = match &*guard {
            Value::Vector(items) => items.get(index).cloned(),
            Value::Matrix(matrix) => matrix.rows.get(index).cloned(),
            Value::Map(map) => map.values().get(index).cloned(),
            Value::String(s) => s.chars().nth(index).map(|c| heap.alloc(Value::Char(c))),
            Value::Binary(bytes) => bytes
                .get(index)
                .map(|b| heap.alloc(Value::Integer(i64::from(*b)))),
            other => return Err(unsupported_operation("foreach", &other.type_name())),
        };
        Ok(element)
    }

    pub(crate) fn foreach(
        &mut self,
        frame: &Frame,
        ident: &str,
        iterable: &NodeRef,
        body: &NodeRef,
    ) -> EvalResult<Object> {
        let Some(sequence) = self.operand(frame, iterable)? else {
            return Ok(self.null());
        };
        let sequence = ops::deref(&sequence);
        let _pinned = sequence.pin_scope();

        let mut index = 0;
        while let Some(item) = self.element(&sequence, index)? {
            frame.add(self.runtime.heap(), ident, &item)?;
            self.evaluate(frame, body)?;
            if self.leave_loop(frame) {
                break;
            }
            index += 1;
        }
        Ok(self.null())
    }

    pub(crate) fn foreach_mapping(
        &mut self,
        frame: &Frame,
        key: &str,
        value: &str,
        iterable: &NodeRef,
        body: &NodeRef,
    ) -> EvalResult<Object> {
        let Some(map) = self.operand(frame, iterable)? else {
            return Ok(self.null());
        };
        let map = ops::deref(&map);
        let _pinned = map.pin_scope();

        let mut index = 0;
        loop {
            let entry = match &*map.read() {
                Value::Map(m) => m.keys().get(index).cloned().zip(m.values().get(index).cloned()),
                other => return Err(type_mismatch("map", &other.type_name())),
            };
            let Some((k, v)) = entry else {
                break;
            };
            frame.add(self.runtime.heap(), key, &k)?;
            frame.add(self.runtime.heap(), value, &v)?;
            self.evaluate(frame, body)?;
            if self.leave_loop(frame) {
                break;
            }
            index += 1;
        }
        Ok(self.null())
    }

    /// The first case comparing equal to the target runs, else the default.
    /// A `break` inside the chosen body ends the switch.
    pub(crate) fn switch(
        &mut self,
        frame: &Frame,
        target: &NodeRef,
        cases: &[SwitchCase],
        default: Option<&NodeRef>,
    ) -> EvalResult<Object> {
        let Some(target) = self.operand(frame, target)? else {
            return Ok(self.null());
        };
        let mut chosen = default;
        for case in cases {
            let Some(value) = self.operand(frame, &case.value)? else {
                return Ok(self.null());
            };
            if ops::compare(&target, &value).is_eq() {
                chosen = Some(&case.body);
                break;
            }
        }
        if let Some(body) = chosen {
            self.evaluate(frame, body)?;
            frame.unset_state(FrameState::BREAK);
        }
        Ok(self.null())
    }

    pub(crate) fn try_catch(
        &mut self,
        frame: &Frame,
        body: &NodeRef,
        catch_ident: &str,
        catch_body: &NodeRef,
        finally: Option<&NodeRef>,
    ) -> EvalResult<Object> {
        self.evaluate(frame, body)?;

        if frame.has_state(FrameState::EXCEPTION) {
            let thrown = {
                let mut memory = frame.lock();
                memory.unset_state(FrameState::EXCEPTION);
                memory.take_state_value()
            }
            .unwrap_or_else(|| self.null());
            thrown.unpin();
            frame.add(self.runtime.heap(), catch_ident, &thrown)?;
            self.evaluate(frame, catch_body)?;
        }

        if let Some(finally) = finally {
            // A jump pending from the body or handler resumes after the
            // finally block unless the block starts its own.
            let (state, value) = frame.suspend_state();
            self.evaluate(frame, finally)?;
            if frame.is_interrupted() {
                if let Some(dropped) = value.filter(|_| state.contains(FrameState::EXCEPTION)) {
                    dropped.unpin();
                }
            } else {
                frame.set_state(state, value);
            }
        }
        Ok(self.null())
    }

    pub(crate) fn throw(&mut self, frame: &Frame, value: &NodeRef) -> EvalResult<Object> {
        let Some(value) = self.operand(frame, value)? else {
            return Ok(self.null());
        };
        tracing::debug!(value = %value.read(), "throw");
        frame.throw(value);
        Ok(self.null())
    }

    pub(crate) fn return_value(
        &mut self,
        frame: &Frame,
        value: Option<&NodeRef>,
    ) -> EvalResult<Object> {
        let value = match value {
            Some(node) => match self.operand(frame, node)? {
                Some(value) => value,
                None => return Ok(self.null()),
            },
            None => self.null(),
        };
        frame.set_state(FrameState::RETURN, Some(value.clone()));
        Ok(value)
    }

    pub(crate) fn jump(&mut self, frame: &Frame, state: FrameState) -> EvalResult<Object> {
        frame.set_state(state, None);
        Ok(self.null())
    }
}
