use std::sync::Arc;

use hybris_ir::{Access, MethodDecl, Node, NodeKind, Params, Span};
use pretty_assertions::assert_eq;

use super::*;
use crate::value::{ClassValue, MethodTable, DESTRUCTOR};

fn no_finalizer() -> impl FnMut(&Object) {
    |_: &Object| panic!("no destructor expected")
}

fn class_with_destructor(heap: &Heap) -> Object {
    let mut methods = MethodTable::new();
    methods.insert(Arc::new(MethodDecl {
        name: DESTRUCTOR.to_string(),
        params: Params::default(),
        access: Access::Public,
        is_static: false,
        body: Node::new(NodeKind::Block(Vec::new()), Span::DUMMY),
        span: Span::DUMMY,
    }));
    let class = ClassValue {
        name: "Resource".to_string(),
        attributes: Vec::new(),
        methods: Arc::new(methods),
        expiry: None,
    };
    heap.alloc(Value::Class(class.instantiate()))
}

/// Two vectors holding each other.
fn make_cycle(heap: &Heap) -> (Object, Object) {
    let a = heap.alloc(Value::Vector(Vec::new()));
    let b = heap.alloc(Value::Vector(vec![a.clone()]));
    if let Value::Vector(items) = &mut *a.write() {
        items.push(b.clone());
    }
    (a, b)
}

#[test]
fn acyclic_objects_are_freed_by_refcount() {
    let heap = Heap::new();
    let obj = heap.alloc(Value::Integer(1));
    assert_eq!(heap.live(), 1);
    drop(obj);
    assert_eq!(heap.live(), 0);
}

#[test]
fn unreachable_cycle_is_collected() {
    let heap = Heap::new();
    let (a, b) = make_cycle(&heap);
    drop((a, b));
    assert_eq!(heap.live(), 2);

    let stats = heap.collect(&mut no_finalizer());
    assert_eq!(stats.collected, 2);
    assert_eq!(stats.allocations, 2);
    assert_eq!(heap.live(), 0);
}

#[test]
fn cycle_reachable_from_a_handle_survives() {
    let heap = Heap::new();
    let (a, b) = make_cycle(&heap);
    drop(b);

    let stats = heap.collect(&mut no_finalizer());
    assert_eq!(stats.collected, 0);
    assert_eq!(heap.live(), 2);
    assert!(matches!(&*a.read(), Value::Vector(items) if items.len() == 1));
    assert!(!a.is_garbage());
}

#[test]
fn pinned_cycle_survives_until_unpinned() {
    let heap = Heap::new();
    let (a, b) = make_cycle(&heap);
    a.pin();
    let weak = a.downgrade();
    drop((a, b));

    assert_eq!(heap.collect(&mut no_finalizer()).collected, 0);
    if let Some(cell) = weak.upgrade() {
        Object::from_cell(cell).unpin();
    }
    assert_eq!(heap.collect(&mut no_finalizer()).collected, 2);
}

#[test]
fn constant_cycle_is_never_collected() {
    let heap = Heap::new();
    let a = heap.constant(Value::Vector(Vec::new()));
    let b = heap.alloc(Value::Vector(vec![a.clone()]));
    if let Value::Vector(items) = &mut *a.write() {
        items.push(b.clone());
    }
    drop((a, b));
    assert_eq!(heap.collect(&mut no_finalizer()).collected, 0);
    assert_eq!(heap.live(), 2);
}

#[test]
fn destructor_runs_once_for_unreachable_instance() {
    let heap = Heap::new();
    let instance = class_with_destructor(&heap);
    let id = instance.id();
    drop(instance);
    // Held by the finalizer list until collected.
    assert_eq!(heap.live(), 1);

    let mut seen = Vec::new();
    let stats = heap.collect(&mut |obj: &Object| {
        assert!(obj.is_garbage());
        seen.push(obj.id());
    });
    assert_eq!(seen, vec![id]);
    assert_eq!(stats.finalized, 1);
    assert_eq!(heap.live(), 0);

    let again = heap.collect(&mut no_finalizer());
    assert_eq!(again.finalized, 0);
}

#[test]
fn destructor_is_skipped_while_instance_is_referenced() {
    let heap = Heap::new();
    let instance = class_with_destructor(&heap);
    let stats = heap.collect(&mut no_finalizer());
    assert_eq!(stats.collected, 0);
    assert!(!instance.is_garbage());
}

#[test]
fn collection_is_not_reentrant() {
    let heap = Heap::new();
    let instance = class_with_destructor(&heap);
    drop(instance);
    let mut nested = None;
    heap.collect(&mut |_: &Object| {
        nested = Some(heap.collect(&mut |_: &Object| {}));
    });
    assert_eq!(nested, Some(GcStats::default()));
}

#[test]
fn pending_resets_after_collect() {
    let heap = Heap::new();
    let _a = heap.alloc(Value::Integer(1));
    let _b = heap.alloc(Value::Integer(2));
    assert_eq!(heap.pending(), 2);
    heap.collect(&mut no_finalizer());
    assert_eq!(heap.pending(), 0);
}

#[test]
fn copies_of_one_instance_expire_together() {
    let heap = Heap::new();
    let instance = class_with_destructor(&heap);
    let copy = crate::ops::clone(&heap, &instance);
    drop(copy);

    // The dropped copy shares its identity with the live one.
    let stats = heap.collect(&mut no_finalizer());
    assert_eq!(stats.collected, 1);
    assert_eq!(stats.finalized, 0);

    let id = instance.id();
    drop(instance);
    let mut seen = Vec::new();
    let stats = heap.collect(&mut |obj: &Object| seen.push(obj.id()));
    assert_eq!(seen, vec![id]);
    assert_eq!(stats.finalized, 1);
}

#[test]
fn unreachable_copies_finalize_one_identity_once() {
    let heap = Heap::new();
    let instance = class_with_destructor(&heap);
    let copy = crate::ops::clone(&heap, &instance);
    drop((instance, copy));

    let mut calls = 0;
    let stats = heap.collect(&mut |_: &Object| calls += 1);
    assert_eq!(calls, 1);
    assert_eq!(stats.collected, 2);
    assert_eq!(heap.live(), 0);
}

#[test]
fn descriptors_are_not_finalizable() {
    let heap = Heap::new();
    let mut methods = MethodTable::new();
    methods.insert(Arc::new(MethodDecl {
        name: DESTRUCTOR.to_string(),
        params: Params::default(),
        access: Access::Public,
        is_static: false,
        body: Node::new(NodeKind::Block(Vec::new()), Span::DUMMY),
        span: Span::DUMMY,
    }));
    let descriptor = heap.alloc(Value::Class(ClassValue {
        name: "Resource".to_string(),
        attributes: Vec::new(),
        methods: Arc::new(methods),
        expiry: None,
    }));
    drop(descriptor);
    assert_eq!(heap.live(), 0);
    assert_eq!(heap.collect(&mut no_finalizer()).finalized, 0);
}
