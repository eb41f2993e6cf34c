//! Hybris IR - syntax tree types shared by the parser and the engine.
//!
//! This crate contains:
//! - Spans for source locations
//! - Literal constants as produced by the lexer
//! - AST nodes (`Node`, `NodeKind`) and declarations (functions, structs, classes)
//! - Binary, unary and assignment operators
//!
//! # Design Philosophy
//!
//! - **Immutable trees**: nodes are shared through `Arc` and never mutated by
//!   the engine, so concurrent calls into the same declaration need no cloning.
//! - **Shared declarations**: function, struct and class declarations are
//!   `Arc`s so that alias values can point at them by address.
//!
//! Literals that contain floats store them as u64 bits for `Hash` compatibility.

mod ast;
mod span;

pub use ast::{
    Access, AssignOp, BinaryOp, ClassDecl, ClassMember, FunctionDecl, Literal, MethodDecl, Node,
    NodeKind, NodeRef, Params, StructDecl, SwitchCase, UnaryOp,
};
pub use span::Span;
