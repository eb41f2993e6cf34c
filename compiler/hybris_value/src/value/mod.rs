//! Runtime values.
//!
//! [`Value`] is the payload stored inside an [`Object`] cell: one variant per
//! [`Kind`]. Containers hold `Object` handles for their elements, so the
//! object graph (and its cycles) lives in the payloads.
//!
//! `Value: Clone` is shallow: element handles are shared. Deep copies go
//! through [`ops::clone`](crate::ops::clone).

mod composite;

use std::fmt;
use std::sync::Arc;

use hybris_ir::FunctionDecl;

use crate::Object;

pub use composite::{
    Attribute, ClassValue, Expiry, ExternFn, ExternValue, MapValue, MatrixValue, MethodTable,
    Overloads, StructValue, DESTRUCTOR,
};

/// Object kinds, in the order used to compare values of different kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Integer,
    Float,
    Char,
    Boolean,
    String,
    Binary,
    Vector,
    Map,
    Matrix,
    Struct,
    Class,
    Alias,
    Extern,
    Reference,
}

impl Kind {
    /// Script-visible type name.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Integer => "int",
            Kind::Float => "float",
            Kind::Char => "char",
            Kind::Boolean => "boolean",
            Kind::String => "string",
            Kind::Binary => "binary",
            Kind::Vector => "vector",
            Kind::Map => "map",
            Kind::Matrix => "matrix",
            Kind::Struct => "struct",
            Kind::Class => "class",
            Kind::Alias => "alias",
            Kind::Extern => "extern",
            Kind::Reference => "reference",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Object payload.
#[derive(Clone, Debug)]
pub enum Value {
    // Scalars
    Integer(i64),
    Float(f64),
    Char(char),
    Boolean(bool),
    String(String),
    Binary(Vec<u8>),

    // Collections
    Vector(Vec<Object>),
    Map(MapValue),
    Matrix(MatrixValue),

    // User types
    Struct(StructValue),
    Class(ClassValue),

    /// A user function used as a value.
    Alias(Arc<FunctionDecl>),
    /// A linked native function.
    Extern(ExternValue),
    /// `&x`: assignment through the binding re-targets the referenced object.
    Reference(Object),
}

/// Depth past which nested values are printed as `...`.
const DISPLAY_DEPTH: usize = 32;

impl Value {
    #[inline]
    pub fn kind(&self) -> Kind {
        match self {
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::Char(_) => Kind::Char,
            Value::Boolean(_) => Kind::Boolean,
            Value::String(_) => Kind::String,
            Value::Binary(_) => Kind::Binary,
            Value::Vector(_) => Kind::Vector,
            Value::Map(_) => Kind::Map,
            Value::Matrix(_) => Kind::Matrix,
            Value::Struct(_) => Kind::Struct,
            Value::Class(_) => Kind::Class,
            Value::Alias(_) => Kind::Alias,
            Value::Extern(_) => Kind::Extern,
            Value::Reference(_) => Kind::Reference,
        }
    }

    /// Type name for messages: the declared name for structs and classes.
    pub fn type_name(&self) -> String {
        match self {
            Value::Struct(s) => s.name.clone(),
            Value::Class(c) => c.name.clone(),
            other => other.kind().name().to_string(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassValue> {
        match self {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Attributes of a struct or class payload.
    pub fn attributes(&self) -> Option<&[Attribute]> {
        match self {
            Value::Struct(s) => Some(&s.attributes),
            Value::Class(c) => Some(&c.attributes),
            _ => None,
        }
    }

    /// Destructor identity of a class instance.
    pub fn expiry(&self) -> Option<&Arc<Expiry>> {
        match self {
            Value::Class(c) => c.expiry.as_ref(),
            _ => None,
        }
    }

    /// Visit every object handle held directly by this payload.
    pub fn for_each_child(&self, mut f: impl FnMut(&Object)) {
        match self {
            Value::Vector(items) => items.iter().for_each(f),
            Value::Map(map) => {
                map.keys.iter().for_each(&mut f);
                map.values.iter().for_each(f);
            }
            Value::Matrix(matrix) => matrix.rows.iter().for_each(f),
            Value::Struct(StructValue { attributes, .. })
            | Value::Class(ClassValue { attributes, .. }) => {
                attributes.iter().for_each(|a| f(&a.value));
            }
            Value::Reference(target) => f(target),
            Value::Integer(_)
            | Value::Float(_)
            | Value::Char(_)
            | Value::Boolean(_)
            | Value::String(_)
            | Value::Binary(_)
            | Value::Alias(_)
            | Value::Extern(_) => {}
        }
    }

    /// Detach every child handle, leaving an empty payload of the same kind
    /// where possible. Used by the collector to break cycles.
    pub(crate) fn take_children(&mut self) -> Vec<Object> {
        match self {
            Value::Vector(items) => std::mem::take(items),
            Value::Map(map) => {
                let mut out = std::mem::take(&mut map.keys);
                out.append(&mut map.values);
                out
            }
            Value::Matrix(matrix) => std::mem::take(&mut matrix.rows),
            Value::Struct(StructValue { attributes, .. })
            | Value::Class(ClassValue { attributes, .. }) => {
                std::mem::take(attributes).into_iter().map(|a| a.value).collect()
            }
            Value::Reference(_) => {
                // A reference cannot be empty; drop it in favour of a scalar.
                let old = std::mem::replace(self, Value::Integer(0));
                match old {
                    Value::Reference(target) => vec![target],
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    /// Display form used when the value is nested in a collection: strings
    /// and chars are quoted.
    pub fn nested_display(&self) -> String {
        let mut out = String::new();
        self.write_display(&mut out, 1, true);
        out
    }

    fn write_display(&self, out: &mut String, depth: usize, nested: bool) {
        use std::fmt::Write;

        if depth > DISPLAY_DEPTH {
            out.push_str("...");
            return;
        }
        let child = |out: &mut String, obj: &Object| {
            obj.read().write_display(out, depth + 1, true);
        };

        match self {
            Value::Integer(n) => {
                let _ = write!(out, "{n}");
            }
            Value::Float(x) => out.push_str(&format_float(*x)),
            Value::Char(c) if nested => {
                let _ = write!(out, "'{}'", c.escape_default());
            }
            Value::Char(c) => out.push(*c),
            Value::Boolean(b) => {
                let _ = write!(out, "{b}");
            }
            Value::String(s) if nested => {
                let _ = write!(out, "\"{}\"", s.escape_default());
            }
            Value::String(s) => out.push_str(s),
            Value::Binary(bytes) => {
                out.push_str("binary(");
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    let _ = write!(out, "{b:02x}");
                }
                out.push(')');
            }
            Value::Vector(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    child(out, item);
                }
                out.push(']');
            }
            Value::Map(map) if map.is_empty() => out.push_str("[:]"),
            Value::Map(map) => {
                out.push('[');
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    child(out, k);
                    out.push_str(" : ");
                    child(out, v);
                }
                out.push(']');
            }
            Value::Matrix(matrix) => {
                out.push('[');
                for (i, row) in matrix.rows.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    child(out, row);
                }
                out.push(']');
            }
            Value::Struct(s) => {
                let _ = write!(out, "{} {{ ", s.name);
                for (i, attr) in s.attributes.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}: ", attr.name);
                    child(out, &attr.value);
                }
                out.push_str(" }");
            }
            Value::Class(c) => {
                let _ = write!(out, "<{}>", c.name);
            }
            Value::Alias(decl) => {
                let _ = write!(out, "<function {}>", decl.name);
            }
            Value::Extern(ext) => {
                let _ = write!(out, "<extern {}.{}>", ext.library, ext.name);
            }
            Value::Reference(target) => {
                target.read().write_display(out, depth + 1, nested);
            }
        }
    }
}

/// Floats always show a fractional part (`1.0`, not `1`).
pub fn format_float(x: f64) -> String {
    let s = x.to_string();
    if x.is_finite() && !s.contains(['.', 'e', 'E']) {
        format!("{s}.0")
    } else {
        s
    }
}

/// Display form used by `print` and string conversion.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_display(&mut out, 0, false);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests;
