//! Collection, map and attribute operations.

use std::cmp::Ordering;

use crate::errors::{
    constant_modification, index_out_of_bounds, no_mapped_value, type_mismatch,
    undefined_attribute, unsupported_operation, EvalResult,
};
use crate::value::{MapValue, MatrixValue, Value};
use crate::{Heap, Object};

use super::{assign, clone, clone_value, compare, deref, to_int};

/// Convert an index object to a position in a collection of `len` items.
fn position(index: &Object, len: usize) -> EvalResult<usize> {
    let i = match &*deref(index).read() {
        Value::Integer(n) => *n,
        other => return Err(type_mismatch("int index", &other.type_name())),
    };
    usize::try_from(i)
        .ok()
        .filter(|&p| p < len)
        .ok_or_else(|| index_out_of_bounds(i, len))
}

fn ensure_mutable(object: &Object) -> EvalResult<()> {
    if object.is_constant() {
        Err(constant_modification())
    } else {
        Ok(())
    }
}

/// Position of `key` in `map`, by [`compare`].
fn map_find(map: &MapValue, key: &Object) -> Option<usize> {
    map.keys
        .iter()
        .position(|k| compare(k, key) == Ordering::Equal)
}

fn char_of(value: &Value) -> EvalResult<char> {
    match value {
        Value::Char(c) => Ok(*c),
        Value::String(s) if s.chars().count() == 1 => s
            .chars()
            .next()
            .ok_or_else(|| type_mismatch("char", "string")),
        other => Err(type_mismatch("char", &other.type_name())),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn byte_of(value: &Value) -> EvalResult<u8> {
    Ok(to_int(value)? as u8)
}

/// `owner[index]`.
///
/// Vector, matrix and map reads return the stored element object itself;
/// string and binary reads return a new object.
pub fn at(heap: &Heap, owner: &Object, index: &Object) -> EvalResult<Object> {
    let owner = deref(owner);
    let guard = owner.read();
    match &*guard {
        Value::Vector(items) => Ok(items[position(index, items.len())?].clone()),
        Value::Matrix(matrix) => Ok(matrix.rows[position(index, matrix.rows.len())?].clone()),
        Value::String(s) => {
            let len = s.chars().count();
            let p = position(index, len)?;
            let c = s.chars().nth(p).ok_or_else(|| index_out_of_bounds(0, len))?;
            Ok(heap.alloc(Value::Char(c)))
        }
        Value::Binary(bytes) => {
            let p = position(index, bytes.len())?;
            Ok(heap.alloc(Value::Integer(i64::from(bytes[p]))))
        }
        Value::Map(map) => match map_find(map, index) {
            Some(i) => Ok(map.values[i].clone()),
            None => Err(no_mapped_value(&deref(index).read().nested_display())),
        },
        other => Err(unsupported_operation("[]", &other.type_name())),
    }
}

/// `owner[index] = value`; returns the stored object.
///
/// Vector elements are replaced by a copy of `value`; assigning to a missing
/// map key inserts it.
pub fn set(heap: &Heap, owner: &Object, index: &Object, value: &Object) -> EvalResult<Object> {
    let owner = deref(owner);
    ensure_mutable(&owner)?;
    let kind = owner.kind();
    match kind {
        crate::Kind::Map => map_set(heap, &owner, index, value),
        crate::Kind::Vector => {
            let copy = clone(heap, value);
            let mut guard = owner.write();
            if let Value::Vector(items) = &mut *guard {
                let p = position(index, items.len())?;
                items[p] = copy.clone();
            }
            Ok(copy)
        }
        crate::Kind::String => {
            let c = char_of(&deref(value).read())?;
            let mut guard = owner.write();
            if let Value::String(s) = &mut *guard {
                let mut chars: Vec<char> = s.chars().collect();
                let p = position(index, chars.len())?;
                chars[p] = c;
                *s = chars.into_iter().collect();
            }
            Ok(heap.alloc(Value::Char(c)))
        }
        crate::Kind::Binary => {
            let b = byte_of(&deref(value).read())?;
            let mut guard = owner.write();
            if let Value::Binary(bytes) = &mut *guard {
                let p = position(index, bytes.len())?;
                bytes[p] = b;
            }
            Ok(heap.alloc(Value::Integer(i64::from(b))))
        }
        other => Err(unsupported_operation("[]=", other.name())),
    }
}

/// Append a copy of `value`.
pub fn push(heap: &Heap, owner: &Object, value: &Object) -> EvalResult<()> {
    let owner = deref(owner);
    ensure_mutable(&owner)?;
    let value = deref(value);
    match owner.kind() {
        crate::Kind::Vector => {
            let copy = clone(heap, &value);
            if let Value::Vector(items) = &mut *owner.write() {
                items.push(copy);
            }
            Ok(())
        }
        crate::Kind::Binary => {
            let b = byte_of(&value.read())?;
            if let Value::Binary(bytes) = &mut *owner.write() {
                bytes.push(b);
            }
            Ok(())
        }
        crate::Kind::String => {
            let suffix = value.read().to_string();
            if let Value::String(s) = &mut *owner.write() {
                s.push_str(&suffix);
            }
            Ok(())
        }
        other => Err(unsupported_operation("push", other.name())),
    }
}

/// Remove and return the last element.
pub fn pop(heap: &Heap, owner: &Object) -> EvalResult<Object> {
    let owner = deref(owner);
    ensure_mutable(&owner)?;
    let mut guard = owner.write();
    match &mut *guard {
        Value::Vector(items) => items.pop().ok_or_else(|| index_out_of_bounds(0, 0)),
        Value::Binary(bytes) => bytes
            .pop()
            .map(|b| heap.alloc(Value::Integer(i64::from(b))))
            .ok_or_else(|| index_out_of_bounds(0, 0)),
        Value::String(s) => s
            .pop()
            .map(|c| heap.alloc(Value::Char(c)))
            .ok_or_else(|| index_out_of_bounds(0, 0)),
        other => Err(unsupported_operation("pop", &other.type_name())),
    }
}

/// Remove the element at `index` (or the entry under key `index` for maps)
/// and return it.
pub fn remove(heap: &Heap, owner: &Object, index: &Object) -> EvalResult<Object> {
    let owner = deref(owner);
    ensure_mutable(&owner)?;
    if owner.kind() == crate::Kind::Map {
        let found = match &*owner.read() {
            Value::Map(map) => map_find(map, index),
            _ => None,
        };
        let Some(i) = found else {
            return Err(no_mapped_value(&deref(index).read().nested_display()));
        };
        let mut guard = owner.write();
        return match &mut *guard {
            Value::Map(map) => Ok(map.remove(i).1),
            other => Err(unsupported_operation("remove", &other.type_name())),
        };
    }

    let mut guard = owner.write();
    match &mut *guard {
        Value::Vector(items) => {
            let p = position(index, items.len())?;
            Ok(items.remove(p))
        }
        Value::Binary(bytes) => {
            let p = position(index, bytes.len())?;
            Ok(heap.alloc(Value::Integer(i64::from(bytes.remove(p)))))
        }
        Value::String(s) => {
            let mut chars: Vec<char> = s.chars().collect();
            let p = position(index, chars.len())?;
            let c = chars.remove(p);
            *s = chars.into_iter().collect();
            Ok(heap.alloc(Value::Char(c)))
        }
        other => Err(unsupported_operation("remove", &other.type_name())),
    }
}

/// Number of elements (characters for strings, attributes for structs).
pub fn size(value: &Value) -> EvalResult<usize> {
    match value {
        Value::String(s) => Ok(s.chars().count()),
        Value::Binary(bytes) => Ok(bytes.len()),
        Value::Vector(items) => Ok(items.len()),
        Value::Map(map) => Ok(map.len()),
        Value::Matrix(matrix) => Ok(matrix.rows.len()),
        Value::Struct(s) => Ok(s.attributes.len()),
        Value::Class(c) => Ok(c.attributes.len()),
        Value::Reference(target) => size(&target.read()),
        other => Err(unsupported_operation("size", &other.type_name())),
    }
}

/// Membership: vector elements, map keys, substrings or bytes.
pub fn contains(owner: &Object, needle: &Object) -> EvalResult<bool> {
    let owner = deref(owner);
    let needle = deref(needle);
    let guard = owner.read();
    match &*guard {
        Value::Vector(items) => Ok(items.iter().any(|o| compare(o, &needle) == Ordering::Equal)),
        Value::Map(map) => Ok(map_find(map, &needle).is_some()),
        Value::String(s) => match &*needle.read() {
            Value::Char(c) => Ok(s.contains(*c)),
            Value::String(sub) => Ok(s.contains(sub.as_str())),
            other => Err(type_mismatch("string or char", &other.type_name())),
        },
        Value::Binary(bytes) => {
            let b = byte_of(&needle.read())?;
            Ok(bytes.contains(&b))
        }
        other => Err(unsupported_operation("contains", &other.type_name())),
    }
}

// Maps

/// Value stored under `key`, if any.
pub fn map_get(owner: &Object, key: &Object) -> EvalResult<Option<Object>> {
    let owner = deref(owner);
    let guard = owner.read();
    match &*guard {
        Value::Map(map) => Ok(map_find(map, key).map(|i| map.values[i].clone())),
        other => Err(unsupported_operation("[]", &other.type_name())),
    }
}

/// Insert or replace the value under `key`; returns the stored object.
pub fn map_set(heap: &Heap, owner: &Object, key: &Object, value: &Object) -> EvalResult<Object> {
    let owner = deref(owner);
    ensure_mutable(&owner)?;
    let found = match &*owner.read() {
        Value::Map(map) => map_find(map, key),
        other => return Err(unsupported_operation("[]=", &other.type_name())),
    };
    let copy = clone(heap, value);
    let new_key = found.is_none().then(|| clone(heap, &deref(key)));

    let mut guard = owner.write();
    if let Value::Map(map) = &mut *guard {
        match (found, new_key) {
            (Some(i), _) => map.values[i] = copy.clone(),
            (None, Some(k)) => map.push(k, copy.clone()),
            (None, None) => {}
        }
    }
    Ok(copy)
}

/// Remove `key`; returns whether it was mapped.
pub fn unmap(owner: &Object, key: &Object) -> EvalResult<bool> {
    let owner = deref(owner);
    ensure_mutable(&owner)?;
    let found = match &*owner.read() {
        Value::Map(map) => map_find(map, key),
        other => return Err(unsupported_operation("unmap", &other.type_name())),
    };
    if let Some(i) = found {
        if let Value::Map(map) = &mut *owner.write() {
            map.remove(i);
        }
    }
    Ok(found.is_some())
}

pub fn is_mapped(owner: &Object, key: &Object) -> EvalResult<bool> {
    Ok(map_get(owner, key)?.is_some())
}

/// Vector of copies of the map's keys, in insertion order.
pub fn keys(heap: &Heap, owner: &Object) -> EvalResult<Object> {
    let owner = deref(owner);
    let items = match &*owner.read() {
        Value::Map(map) => map.keys.iter().map(|k| clone(heap, k)).collect(),
        other => return Err(unsupported_operation("keys", &other.type_name())),
    };
    Ok(heap.alloc(Value::Vector(items)))
}

/// Vector of copies of the map's values, in insertion order.
pub fn values(heap: &Heap, owner: &Object) -> EvalResult<Object> {
    let owner = deref(owner);
    let items = match &*owner.read() {
        Value::Map(map) => map.values.iter().map(|v| clone(heap, v)).collect(),
        other => return Err(unsupported_operation("values", &other.type_name())),
    };
    Ok(heap.alloc(Value::Vector(items)))
}

// Matrices

/// A `rows` × `columns` matrix of integer zeros.
pub fn matrix(heap: &Heap, rows: usize, columns: usize) -> Object {
    let rows = (0..rows)
        .map(|_| {
            let cells = (0..columns).map(|_| heap.alloc(Value::Integer(0))).collect();
            heap.alloc(Value::Vector(cells))
        })
        .collect();
    heap.alloc(Value::Matrix(MatrixValue { columns, rows }))
}

// Attributes

/// Store `value` into attribute `name` of a struct or class.
///
/// A static attribute is updated in place so every instance sharing it
/// observes the change; other attributes get a fresh copy of `value`.
pub fn set_attribute(
    heap: &Heap,
    owner: &Object,
    name: &str,
    value: &Object,
) -> EvalResult<Object> {
    let owner = deref(owner);
    ensure_mutable(&owner)?;
    let (slot, is_static) = {
        let guard = owner.read();
        let attr = guard
            .attributes()
            .ok_or_else(|| unsupported_operation(".", &guard.type_name()))?
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| undefined_attribute(&guard.type_name(), name))?;
        (attr.value.clone(), attr.is_static)
    };

    if is_static {
        assign(heap, &slot, value)?;
        return Ok(slot);
    }

    let copy = heap.alloc(clone_value(heap, &value.read()));
    let mut guard = owner.write();
    let attributes = match &mut *guard {
        Value::Struct(s) => &mut s.attributes,
        Value::Class(c) => &mut c.attributes,
        other => return Err(unsupported_operation(".", &other.type_name())),
    };
    if let Some(attr) = attributes.iter_mut().find(|a| a.name == name) {
        attr.value = copy.clone();
    }
    Ok(copy)
}
