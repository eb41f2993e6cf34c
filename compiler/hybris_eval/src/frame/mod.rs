//! Memory frames: one scope of named bindings plus control-flow state.
//!
//! Hybris scoping is function-local. A call pushes a fresh frame; blocks and
//! loops run in the frame of their enclosing function. Lookups fall back
//! from the active frame straight to the global frame.
//!
//! # Binding discipline
//!
//! [`MemoryFrame::add`] clones the bound value, so a frame owns its own
//! copy. Binding over a reference re-targets the referenced object instead
//! of replacing the binding, which is how `&x` aliasing works.
//!
//! # State
//!
//! `BREAK` and `NEXT` are consumed by the nearest loop, `RETURN` by the call
//! boundary. `EXCEPTION` is never cleared implicitly: every evaluation in
//! the frame short-circuits until a `try`/`catch` takes the value.

mod stack;

use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use hybris_value::{ops, EvalResult, Heap, Kind, Object};

pub use stack::FrameStack;

bitflags! {
    /// Pending control-flow transfer of a frame.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FrameState: u8 {
        const BREAK = 1 << 0;
        const NEXT = 1 << 1;
        const RETURN = 1 << 2;
        const EXCEPTION = 1 << 3;
    }
}

impl FrameState {
    /// States that stop evaluation of the remaining statements.
    pub const INTERRUPTED: FrameState = FrameState::all();
}

/// Insertion-ordered mapping from names to objects, plus control state.
#[derive(Debug, Default)]
pub struct MemoryFrame {
    owner: String,
    names: Vec<String>,
    values: Vec<Object>,
    index: FxHashMap<String, usize>,
    anonymous: usize,
    state: FrameState,
    state_value: Option<Object>,
}

impl MemoryFrame {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// The function or method this frame belongs to.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<Object> {
        self.index.get(name).map(|&i| self.values[i].clone())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Bind `name` to `value`, returning the bound object.
    ///
    /// - unbound: binds a clone of `value`
    /// - bound to a reference: re-targets the referenced object, unless
    ///   `value` is itself a reference, which replaces the binding
    /// - bound to a value of the same kind: updates it in place
    /// - otherwise: replaces the binding with a clone
    pub fn add(&mut self, heap: &Heap, name: &str, value: &Object) -> EvalResult<Object> {
        let Some(&i) = self.index.get(name) else {
            let copy = ops::clone(heap, value);
            self.bind(name.to_string(), copy.clone());
            return Ok(copy);
        };

        let current = self.values[i].clone();
        let incoming = value.kind();
        match current.kind() {
            Kind::Reference if incoming != Kind::Reference => {
                let target = ops::deref(&current);
                ops::assign(heap, &target, value)?;
                Ok(current)
            }
            kind if kind == incoming && !current.is_constant() => {
                ops::assign(heap, &current, value)?;
                Ok(current)
            }
            _ => {
                let copy = ops::clone(heap, value);
                self.values[i] = copy.clone();
                Ok(copy)
            }
        }
    }

    /// Bind `value` under a generated name (`__arg_N`) without cloning.
    pub fn push(&mut self, value: Object) -> Object {
        let name = format!("__arg_{}", self.anonymous);
        self.anonymous += 1;
        self.bind(name, value.clone());
        value
    }

    /// Bind `value` as is, replacing any previous binding.
    pub fn insert(&mut self, name: &str, value: Object) {
        match self.index.get(name) {
            Some(&i) => self.values[i] = value,
            None => self.bind(name.to_string(), value),
        }
    }

    fn bind(&mut self, name: String, value: Object) {
        self.index.insert(name.clone(), self.names.len());
        self.names.push(name);
        self.values.push(value);
    }

    /// Deep copy of every binding, with a clean state.
    pub fn deep_clone(&self, heap: &Heap) -> MemoryFrame {
        MemoryFrame {
            owner: self.owner.clone(),
            names: self.names.clone(),
            values: self.values.iter().map(|v| ops::clone(heap, v)).collect(),
            index: self.index.clone(),
            anonymous: self.anonymous,
            state: FrameState::empty(),
            state_value: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[Object] {
        &self.values
    }

    // State

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Set `state`, attaching `value` when given.
    pub fn set_state(&mut self, state: FrameState, value: Option<Object>) {
        self.state |= state;
        if value.is_some() {
            self.state_value = value;
        }
    }

    pub fn unset_state(&mut self, state: FrameState) {
        self.state &= !state;
    }

    #[inline]
    pub fn has_state(&self, state: FrameState) -> bool {
        self.state.intersects(state)
    }

    pub fn state_value(&self) -> Option<&Object> {
        self.state_value.as_ref()
    }

    pub fn take_state_value(&mut self) -> Option<Object> {
        self.state_value.take()
    }

    /// Clear the state, returning it with its value for a later restore.
    pub fn suspend_state(&mut self) -> (FrameState, Option<Object>) {
        let state = std::mem::take(&mut self.state);
        (state, self.state_value.take())
    }
}

/// Shared handle to a memory frame.
#[derive(Clone, Debug, Default)]
pub struct Frame(Arc<Mutex<MemoryFrame>>);

impl Frame {
    pub fn new(owner: impl Into<String>) -> Self {
        Self::from_memory(MemoryFrame::new(owner))
    }

    pub fn from_memory(memory: MemoryFrame) -> Self {
        Frame(Arc::new(Mutex::new(memory)))
    }

    /// Lock the frame. Never hold the guard across evaluation.
    pub fn lock(&self) -> MutexGuard<'_, MemoryFrame> {
        self.0.lock()
    }

    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn owner(&self) -> String {
        self.lock().owner.clone()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<Object> {
        self.lock().get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains(name)
    }

    pub fn add(&self, heap: &Heap, name: &str, value: &Object) -> EvalResult<Object> {
        self.lock().add(heap, name, value)
    }

    pub fn push(&self, value: Object) -> Object {
        self.lock().push(value)
    }

    pub fn insert(&self, name: &str, value: Object) {
        self.lock().insert(name, value);
    }

    pub fn deep_clone(&self, heap: &Heap) -> Frame {
        let copy = self.lock().deep_clone(heap);
        Frame::from_memory(copy)
    }

    /// The frame's bindings in insertion order.
    pub fn values(&self) -> Vec<Object> {
        self.lock().values.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.lock().state
    }

    #[inline]
    pub fn has_state(&self, state: FrameState) -> bool {
        self.lock().has_state(state)
    }

    /// Whether any control transfer is pending.
    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.has_state(FrameState::INTERRUPTED)
    }

    pub fn set_state(&self, state: FrameState, value: Option<Object>) {
        self.lock().set_state(state, value);
    }

    pub fn unset_state(&self, state: FrameState) {
        self.lock().unset_state(state);
    }

    pub fn take_state_value(&self) -> Option<Object> {
        self.lock().take_state_value()
    }

    pub fn suspend_state(&self) -> (FrameState, Option<Object>) {
        self.lock().suspend_state()
    }

    /// Raise an exception carrying `value` in this frame.
    pub fn throw(&self, value: Object) {
        value.pin();
        self.set_state(FrameState::EXCEPTION, Some(value));
    }
}

#[cfg(test)]
mod tests;
