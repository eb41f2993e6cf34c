//! Shared object handles.
//!
//! An [`Object`] is a reference-counted handle to a cell holding a [`Value`]
//! payload, an [`Attributes`] bitset and a pin counter. Cells are created only
//! by [`Heap`](crate::Heap), so every object is known to the collector.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use bitflags::bitflags;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::value::{Kind, Value};

bitflags! {
    /// Per-object attribute bits.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Attributes: u8 {
        /// Never collected, never modified in place.
        const CONSTANT = 1 << 0;
        /// Found unreachable by the collector; its destructor already ran.
        const GARBAGE = 1 << 1;
        /// Produced by a dynamically-linked native function.
        const EXTERN = 1 << 2;
    }
}

pub(crate) struct ObjectCell {
    attributes: AtomicU8,
    /// "Untouchable" marks: thrown exceptions and collections being iterated.
    pins: AtomicU32,
    data: RwLock<Value>,
}

/// Shared handle to a runtime object.
#[derive(Clone)]
pub struct Object(Arc<ObjectCell>);

impl Object {
    pub(crate) fn new(value: Value, attributes: Attributes) -> Self {
        Object(Arc::new(ObjectCell {
            attributes: AtomicU8::new(attributes.bits()),
            pins: AtomicU32::new(0),
            data: RwLock::new(value),
        }))
    }

    pub(crate) fn downgrade(&self) -> Weak<ObjectCell> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn from_cell(cell: Arc<ObjectCell>) -> Self {
        Object(cell)
    }

    pub(crate) fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Lock the payload for reading.
    ///
    /// Read locks are recursive so nested reads of the same object (`x + x`,
    /// self-containing vectors) cannot deadlock.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.data.read_recursive()
    }

    /// Lock the payload for writing.
    ///
    /// Callers must not hold a read guard on the same object.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.0.data.write()
    }

    /// Shallow copy of the payload (element handles are shared).
    pub fn snapshot(&self) -> Value {
        self.read().clone()
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.read().kind()
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Stable identity for the lifetime of the object.
    #[inline]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    // Attributes

    #[inline]
    pub fn attributes(&self) -> Attributes {
        Attributes::from_bits_truncate(self.0.attributes.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set_attributes(&self, attributes: Attributes) {
        self.0
            .attributes
            .fetch_or(attributes.bits(), Ordering::AcqRel);
    }

    #[inline]
    pub fn unset_attributes(&self, attributes: Attributes) {
        self.0
            .attributes
            .fetch_and(!attributes.bits(), Ordering::AcqRel);
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.attributes().contains(Attributes::CONSTANT)
    }

    #[inline]
    pub fn is_garbage(&self) -> bool {
        self.attributes().contains(Attributes::GARBAGE)
    }

    #[inline]
    pub fn is_extern(&self) -> bool {
        self.attributes().contains(Attributes::EXTERN)
    }

    // Pins

    /// Mark the object untouchable until a matching [`Object::unpin`].
    pub fn pin(&self) {
        self.0.pins.fetch_add(1, Ordering::AcqRel);
    }

    /// Release one untouchable mark.
    pub fn unpin(&self) {
        let _ = self
            .0
            .pins
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.0.pins.load(Ordering::Acquire) > 0
    }

    /// Pin the object for the lifetime of the returned guard.
    pub fn pin_scope(&self) -> PinGuard {
        self.pin();
        PinGuard {
            object: self.clone(),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads may be cyclic; show identity and kind only.
        write!(f, "Object({:#x}, {})", self.id(), self.kind().name())
    }
}

/// RAII guard that keeps an object pinned.
///
/// Unpins on drop, including early return and error propagation.
#[must_use = "the object is unpinned when the guard is dropped"]
pub struct PinGuard {
    object: Object,
}

impl PinGuard {
    pub fn object(&self) -> &Object {
        &self.object
    }
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        self.object.unpin();
    }
}
