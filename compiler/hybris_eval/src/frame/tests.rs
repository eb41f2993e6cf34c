use hybris_value::{Heap, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn int(heap: &Heap, n: i64) -> Object {
    heap.alloc(Value::Integer(n))
}

fn read_int(object: &Object) -> Option<i64> {
    ops::deref(object).read().as_int()
}

#[test]
fn add_clones_on_bind() {
    let heap = Heap::new();
    let mut frame = MemoryFrame::new("main");
    let value = int(&heap, 1);
    let bound = frame.add(&heap, "x", &value).ok();

    assert!(bound.is_some_and(|b| !b.ptr_eq(&value)));
    assert_eq!(frame.get("x").and_then(|o| read_int(&o)), Some(1));
}

#[test]
fn add_same_kind_updates_in_place() {
    let heap = Heap::new();
    let mut frame = MemoryFrame::new("main");
    let first = frame.add(&heap, "x", &int(&heap, 1)).ok();
    let second = frame.add(&heap, "x", &int(&heap, 2)).ok();

    assert!(matches!((&first, &second), (Some(a), Some(b)) if a.ptr_eq(b)));
    assert_eq!(frame.len(), 1);
    assert_eq!(first.and_then(|o| read_int(&o)), Some(2));
}

#[test]
fn add_other_kind_replaces_binding() {
    let heap = Heap::new();
    let mut frame = MemoryFrame::new("main");
    let _ = frame.add(&heap, "x", &int(&heap, 1));
    let _ = frame.add(&heap, "x", &heap.alloc(Value::String("s".into())));

    assert_eq!(frame.len(), 1);
    assert_eq!(frame.get("x").map(|o| o.read().to_string()), Some("s".to_string()));
}

#[test]
fn add_through_reference_retargets() {
    let heap = Heap::new();
    let mut frame = MemoryFrame::new("main");
    let x = frame.add(&heap, "x", &int(&heap, 1)).ok();
    let Some(x) = x else { panic!("x not bound") };

    let _ = frame.add(&heap, "r", &heap.alloc(Value::Reference(x.clone())));
    let _ = frame.add(&heap, "r", &int(&heap, 7));

    assert_eq!(read_int(&x), Some(7));
    assert_eq!(frame.get("r").and_then(|o| read_int(&o)), Some(7));
}

#[test]
fn binding_a_new_reference_replaces_the_old_one() {
    let heap = Heap::new();
    let mut frame = MemoryFrame::new("main");
    let a = int(&heap, 1);
    let b = int(&heap, 2);
    let _ = frame.add(&heap, "r", &heap.alloc(Value::Reference(a.clone())));
    let _ = frame.add(&heap, "r", &heap.alloc(Value::Reference(b.clone())));

    assert_eq!(read_int(&a), Some(1));
    assert_eq!(frame.get("r").and_then(|o| read_int(&o)), Some(2));
}

#[test]
fn push_uses_generated_names_without_cloning() {
    let heap = Heap::new();
    let mut frame = MemoryFrame::new("f");
    let value = int(&heap, 3);
    frame.push(value.clone());
    frame.push(int(&heap, 4));

    assert_eq!(frame.names(), &["__arg_0".to_string(), "__arg_1".to_string()]);
    assert!(frame.get("__arg_0").is_some_and(|o| o.ptr_eq(&value)));
}

#[test]
fn deep_clone_is_independent() {
    let heap = Heap::new();
    let frame = Frame::new("f");
    let _ = frame.add(&heap, "x", &int(&heap, 1));
    frame.set_state(FrameState::RETURN, None);

    let copy = frame.deep_clone(&heap);
    let _ = copy.add(&heap, "x", &int(&heap, 5));

    assert_eq!(frame.get("x").and_then(|o| read_int(&o)), Some(1));
    assert_eq!(copy.get("x").and_then(|o| read_int(&o)), Some(5));
    assert!(!copy.is_interrupted());
}

#[test]
fn state_flags_and_value() {
    let heap = Heap::new();
    let frame = Frame::new("f");
    assert!(!frame.is_interrupted());

    let thrown = int(&heap, 9);
    frame.throw(thrown.clone());
    assert!(frame.has_state(FrameState::EXCEPTION));
    assert!(thrown.is_pinned());
    assert!(frame.lock().state_value().is_some_and(|v| v.ptr_eq(&thrown)));

    frame.unset_state(FrameState::EXCEPTION);
    assert!(!frame.is_interrupted());
    assert!(frame.take_state_value().is_some_and(|v| v.ptr_eq(&thrown)));
}

#[test]
fn suspend_clears_state() {
    let frame = Frame::new("f");
    frame.set_state(FrameState::RETURN, None);
    let (state, value) = frame.suspend_state();
    assert_eq!(state, FrameState::RETURN);
    assert!(value.is_none());
    assert_eq!(frame.state(), FrameState::empty());
}

#[test]
fn frame_stack_pops_the_given_frame() {
    let stack = FrameStack::new();
    let a = Frame::new("a");
    let b = Frame::new("b");
    stack.push_frame(a.clone());
    stack.push_frame(b.clone());

    stack.pop_frame(&a);
    assert_eq!(stack.depth(), 2);
    assert!(stack.roots()[1].ptr_eq(&b));

    stack.pop_frame(stack.global());
    assert_eq!(stack.depth(), 2);
}

proptest! {
    #[test]
    fn rebinding_keeps_one_binding_with_last_value(
        values in proptest::collection::vec(any::<i64>(), 1..8)
    ) {
        let heap = Heap::new();
        let mut frame = MemoryFrame::new("main");
        for &v in &values {
            let _ = frame.add(&heap, "x", &int(&heap, v));
        }
        prop_assert_eq!(frame.len(), 1);
        prop_assert_eq!(frame.get("x").and_then(|o| read_int(&o)), values.last().copied());
    }

    #[test]
    fn assignment_through_reference_is_visible_in_target(
        initial in any::<i64>(),
        next in any::<i64>()
    ) {
        let heap = Heap::new();
        let mut frame = MemoryFrame::new("main");
        let x = frame.add(&heap, "x", &int(&heap, initial));
        prop_assert!(x.is_ok());
        let x = x.unwrap_or_else(|_| int(&heap, 0));

        let _ = frame.add(&heap, "r", &heap.alloc(Value::Reference(x.clone())));
        let _ = frame.add(&heap, "r", &int(&heap, next));
        prop_assert_eq!(read_int(&x), Some(next));
        prop_assert_eq!(frame.get("x").and_then(|o| read_int(&o)), Some(next));
    }
}
