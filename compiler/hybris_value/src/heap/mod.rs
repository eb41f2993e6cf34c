//! Object allocation and cycle collection.
//!
//! # Allocation discipline
//!
//! Every [`Object`] is created here and registered (weakly) so the collector
//! can see it. Acyclic garbage is freed by reference counting the moment its
//! last handle drops; [`Heap::collect`] finds the rest.
//!
//! # Collection
//!
//! For each live object, the collector subtracts the references held by other
//! live objects from its strong count. Whatever remains is held from outside
//! the object graph (frames, the constants table, the evaluator's
//! temporaries), which makes the object a root. Constant and pinned objects
//! are roots as well. Objects not reachable from a root are garbage: they are
//! flagged [`Attributes::GARBAGE`] and their payloads are cleared to break
//! the cycle.
//!
//! Class instances with a destructor are kept alive by a finalizer list until
//! the collector proves them unreachable, so the destructor runs even for
//! acyclic instances. Copies of one instance share an [`Expiry`]; the
//! destructor runs once for it, in the run that finds no copy reachable.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Weak;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::object::{Attributes, ObjectCell};
use crate::value::{Expiry, Value};
use crate::Object;

/// Statistics for one collector run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Allocations since the previous run.
    pub allocations: usize,
    /// Objects alive when the run started.
    pub live: usize,
    /// Objects found unreachable.
    pub collected: usize,
    /// Destructors invoked.
    pub finalized: usize,
}

/// Object allocator and collector.
#[derive(Default)]
pub struct Heap {
    registry: Mutex<Vec<Weak<ObjectCell>>>,
    /// Strong handles to every instance copy carrying an [`Expiry`].
    finalizers: Mutex<Vec<Object>>,
    since_collect: AtomicUsize,
    collecting: AtomicBool,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a mutable object.
    pub fn alloc(&self, value: Value) -> Object {
        self.alloc_with(value, Attributes::empty())
    }

    /// Allocate a `CONSTANT` object, never collected nor modified in place.
    pub fn constant(&self, value: Value) -> Object {
        self.alloc_with(value, Attributes::CONSTANT)
    }

    pub fn alloc_with(&self, value: Value, attributes: Attributes) -> Object {
        let finalizable = value.expiry().is_some();
        let object = Object::new(value, attributes);
        self.registry.lock().push(object.downgrade());
        if finalizable {
            self.finalizers.lock().push(object.clone());
        }
        self.since_collect.fetch_add(1, Ordering::Relaxed);
        object
    }

    /// Allocations since the last collector run.
    pub fn pending(&self) -> usize {
        self.since_collect.load(Ordering::Relaxed)
    }

    /// Number of registered objects still alive.
    pub fn live(&self) -> usize {
        self.registry
            .lock()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Run the cycle collector.
    ///
    /// `finalize` is invoked once per unreachable instance identity whose
    /// class declares a destructor, with one of its unreachable copies, before
    /// any payload is cleared. It may run script code and allocate. Re-entrant
    /// calls (from a destructor) return empty statistics.
    pub fn collect(&self, finalize: &mut dyn FnMut(&Object)) -> GcStats {
        if self.collecting.swap(true, Ordering::AcqRel) {
            return GcStats::default();
        }
        let stats = self.collect_inner(finalize);
        self.collecting.store(false, Ordering::Release);

        tracing::debug!(
            allocations = stats.allocations,
            live = stats.live,
            collected = stats.collected,
            finalized = stats.finalized,
            "gc run"
        );
        stats
    }

    fn collect_inner(&self, finalize: &mut dyn FnMut(&Object)) -> GcStats {
        let allocations = self.since_collect.swap(0, Ordering::Relaxed);

        let live: Vec<Object> = {
            let mut registry = self.registry.lock();
            registry.retain(|w| w.strong_count() > 0);
            registry
                .iter()
                .filter_map(Weak::upgrade)
                .map(Object::from_cell)
                .collect()
        };
        let index: FxHashMap<usize, usize> = live
            .iter()
            .enumerate()
            .map(|(i, obj)| (obj.id(), i))
            .collect();
        let finalizable: FxHashSet<usize> = self.finalizers.lock().iter().map(Object::id).collect();

        // References held from outside the graph: minus our own handle in
        // `live`, the finalizer list's handle, and every internal edge.
        let mut gc_refs: Vec<isize> = live
            .iter()
            .map(|obj| {
                let held = obj.strong_count() - 1 - usize::from(finalizable.contains(&obj.id()));
                isize::try_from(held).unwrap_or(isize::MAX)
            })
            .collect();
        for obj in &live {
            obj.read().for_each_child(|child| {
                if let Some(&j) = index.get(&child.id()) {
                    gc_refs[j] -= 1;
                }
            });
        }

        let mut reachable = vec![false; live.len()];
        let mut stack: Vec<usize> = (0..live.len())
            .filter(|&i| gc_refs[i] > 0 || live[i].is_constant() || live[i].is_pinned())
            .collect();
        for &i in &stack {
            reachable[i] = true;
        }
        while let Some(i) = stack.pop() {
            live[i].read().for_each_child(|child| {
                if let Some(&j) = index.get(&child.id()) {
                    if !reachable[j] {
                        reachable[j] = true;
                        stack.push(j);
                    }
                }
            });
        }

        // Identities with a copy still in use.
        let surviving: FxHashSet<usize> = live
            .iter()
            .enumerate()
            .filter(|&(i, obj)| reachable[i] && finalizable.contains(&obj.id()))
            .filter_map(|(_, obj)| obj.read().expiry().map(Expiry::id))
            .collect();
        let garbage: Vec<Object> = live
            .iter()
            .enumerate()
            .filter(|(i, _)| !reachable[*i])
            .map(|(_, obj)| obj.clone())
            .collect();
        let live_count = live.len();
        drop(live);

        // Destructors first, while every payload is still intact.
        let mut finalized = 0;
        for obj in &garbage {
            if obj.is_garbage() {
                continue;
            }
            obj.set_attributes(Attributes::GARBAGE);
            if !finalizable.contains(&obj.id()) {
                continue;
            }
            let expiry = obj.read().expiry().cloned();
            let Some(expiry) = expiry else {
                continue;
            };
            if !surviving.contains(&Expiry::id(&expiry)) && expiry.expire() {
                finalize(obj);
                finalized += 1;
            }
        }
        self.finalizers.lock().retain(|obj| !obj.is_garbage());

        let mut released = Vec::new();
        for obj in &garbage {
            let mut children = obj.write().take_children();
            released.append(&mut children);
        }
        drop(released);

        GcStats {
            allocations,
            live: live_count,
            collected: garbage.len(),
            finalized,
        }
    }
}

#[cfg(test)]
mod tests;
