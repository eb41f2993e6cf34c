//! Declarations: functions, methods, structs and classes.

use std::fmt;
use std::sync::Arc;

use super::NodeRef;
use crate::Span;

/// Declared parameter list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    /// Named parameter slots, in declaration order.
    pub names: Vec<String>,
    /// Whether the list ends with `...` (accepts extra arguments).
    pub variadic: bool,
}

impl Params {
    /// Number of named slots.
    #[inline]
    pub fn arity(&self) -> usize {
        self.names.len()
    }

    /// Whether a call with `argc` arguments satisfies this list.
    #[inline]
    pub fn accepts(&self, argc: usize) -> bool {
        if self.variadic {
            argc >= self.names.len()
        } else {
            argc == self.names.len()
        }
    }
}

/// A user function declaration (`function name(params) { body }`).
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Params,
    pub body: NodeRef,
    pub span: Span,
}

/// Member access specifier.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl Access {
    pub const fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A class method, including operator overloads (named by operator token)
/// and the special `__expire`/`__to_string`/`__attribute`/`__method` hooks.
#[derive(Debug)]
pub struct MethodDecl {
    pub name: String,
    pub params: Params,
    pub access: Access,
    pub is_static: bool,
    pub body: NodeRef,
    pub span: Span,
}

/// A struct declaration: an ordered list of public attribute names.
#[derive(Debug)]
pub struct StructDecl {
    pub name: String,
    pub attributes: Vec<String>,
    pub span: Span,
}

/// A single member inside a class body.
#[derive(Debug)]
pub enum ClassMember {
    Attribute {
        name: String,
        access: Access,
        is_static: bool,
        default: Option<NodeRef>,
    },
    Method(Arc<MethodDecl>),
}

/// A class declaration with its (unflattened) base list.
#[derive(Debug)]
pub struct ClassDecl {
    pub name: String,
    pub extends: Vec<String>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

impl ClassDecl {
    /// Iterate over the declared methods in source order.
    pub fn methods(&self) -> impl Iterator<Item = &Arc<MethodDecl>> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Method(method) => Some(method),
            ClassMember::Attribute { .. } => None,
        })
    }
}
