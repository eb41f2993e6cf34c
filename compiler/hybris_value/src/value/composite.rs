//! Composite payloads: maps, matrices, structs, classes and externs.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hybris_ir::{Access, MethodDecl};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::Value;
use crate::Object;

/// Insertion-ordered associative array.
///
/// Lookup is a linear scan using [`compare`](crate::ops::compare), so any
/// kind can be a key.
#[derive(Clone, Debug, Default)]
pub struct MapValue {
    pub(crate) keys: Vec<Object>,
    pub(crate) values: Vec<Object>,
}

impl MapValue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Object] {
        &self.keys
    }

    pub fn values(&self) -> &[Object] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Object, &Object)> {
        self.keys.iter().zip(self.values.iter())
    }

    pub(crate) fn push(&mut self, key: Object, value: Object) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (Object, Object) {
        (self.keys.remove(index), self.values.remove(index))
    }
}

/// A rows × columns grid; each row is a shared vector object.
#[derive(Clone, Debug)]
pub struct MatrixValue {
    pub columns: usize,
    pub rows: Vec<Object>,
}

/// A named attribute of a struct or class.
#[derive(Clone, Debug)]
pub struct Attribute {
    pub name: String,
    pub value: Object,
    pub access: Access,
    /// Static attributes share one object across instances and subclasses.
    pub is_static: bool,
}

impl Attribute {
    pub fn public(name: impl Into<String>, value: Object) -> Self {
        Attribute {
            name: name.into(),
            value,
            access: Access::Public,
            is_static: false,
        }
    }
}

fn find<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attributes.iter().find(|a| a.name == name)
}

/// Struct instance or descriptor: ordered public attributes.
#[derive(Clone, Debug)]
pub struct StructValue {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl StructValue {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find(&self.attributes, name)
    }
}

/// Overloads of one method name, in declaration order.
pub type Overloads = SmallVec<[Arc<MethodDecl>; 1]>;

/// Class method table: name → overloads distinguished by arity.
#[derive(Clone, Debug, Default)]
pub struct MethodTable {
    methods: FxHashMap<String, Overloads>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an overload for the method's name.
    pub fn insert(&mut self, method: Arc<MethodDecl>) {
        self.methods
            .entry(method.name.clone())
            .or_default()
            .push(method);
    }

    /// Replace every overload of `name`.
    pub fn replace(&mut self, name: &str, overloads: Overloads) {
        self.methods.insert(name.to_string(), overloads);
    }

    /// Merge a base class table; colliding names are overwritten.
    pub fn merge(&mut self, base: &MethodTable) {
        for (name, overloads) in &base.methods {
            self.methods.insert(name.clone(), overloads.clone());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn overloads(&self, name: &str) -> Option<&Overloads> {
        self.methods.get(name)
    }

    /// Find the overload of `name` for `argc` arguments.
    ///
    /// An exact parameter-count match wins, then a variadic overload that
    /// accepts `argc`; otherwise the first declared overload is returned and
    /// the caller reports the arity mismatch.
    pub fn lookup(&self, name: &str, argc: usize) -> Option<&Arc<MethodDecl>> {
        let overloads = self.methods.get(name)?;
        overloads
            .iter()
            .find(|m| !m.params.variadic && m.params.arity() == argc)
            .or_else(|| overloads.iter().find(|m| m.params.accepts(argc)))
            .or_else(|| overloads.first())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Class instance or descriptor.
#[derive(Clone, Debug)]
pub struct ClassValue {
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Shared by every instance of the class.
    pub methods: Arc<MethodTable>,
    /// Set on instances whose class has a destructor; `None` on descriptors.
    pub expiry: Option<Arc<Expiry>>,
}

/// Destructor method name, run once by the collector.
pub const DESTRUCTOR: &str = "__expire";

impl ClassValue {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find(&self.attributes, name)
    }

    pub fn has_destructor(&self) -> bool {
        self.methods.contains(DESTRUCTOR)
    }

    /// Copy of a descriptor as a fresh `new` instance.
    pub fn instantiate(mut self) -> Self {
        self.expiry = self.has_destructor().then(|| Arc::new(Expiry::default()));
        self
    }
}

/// Identity of one `new` instance, shared by every copy of it.
///
/// Assignment and argument passing copy instances, so a single `new` may be
/// spread over several objects. The destructor belongs to the identity: it
/// runs once, when no copy is reachable any more.
#[derive(Debug, Default)]
pub struct Expiry {
    expired: AtomicBool,
}

impl Expiry {
    #[inline]
    pub fn id(this: &Arc<Expiry>) -> usize {
        Arc::as_ptr(this) as usize
    }

    /// Mark the identity expired; true only for the first call.
    pub fn expire(&self) -> bool {
        !self.expired.swap(true, Ordering::AcqRel)
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }
}

/// Signature of a host-provided native function reachable through `dlllink`.
pub type ExternFn = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// A linked native function.
#[derive(Clone)]
pub struct ExternValue {
    pub library: String,
    pub name: String,
    pub function: ExternFn,
}

impl fmt::Debug for ExternValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternValue({}.{})", self.library, self.name)
    }
}
