//! AST nodes.
//!
//! The parser hands the engine one [`Node`] tree per top-level statement.
//! Trees are immutable and shared through [`NodeRef`].

mod decl;
mod operators;

use std::fmt;
use std::sync::Arc;

use crate::Span;

pub use decl::{Access, ClassDecl, ClassMember, FunctionDecl, MethodDecl, Params, StructDecl};
pub use operators::{AssignOp, BinaryOp, UnaryOp};

/// Shared handle to an immutable node.
pub type NodeRef = Arc<Node>;

/// A literal constant as written in the source.
///
/// Floats are stored as their bit pattern so literals can key the engine's
/// constants table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Integer(i64),
    Float(u64),
    Char(char),
    Boolean(bool),
    String(String),
}

impl Literal {
    /// Create a float literal.
    #[inline]
    pub fn float(value: f64) -> Self {
        Literal::Float(value.to_bits())
    }

    /// Get the float value of a `Float` literal.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{n}"),
            Literal::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Literal::Char(c) => write!(f, "'{}'", c.escape_default()),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::String(s) => write!(f, "\"{}\"", s.escape_default()),
        }
    }
}

/// One `case` arm of a switch statement.
#[derive(Debug)]
pub struct SwitchCase {
    pub value: NodeRef,
    pub body: NodeRef,
}

/// An AST node.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    /// Create a shared node.
    #[inline]
    pub fn new(kind: NodeKind, span: Span) -> NodeRef {
        Arc::new(Node { kind, span })
    }

    /// Whether this node is the literal identifier `me`.
    ///
    /// Access to private and protected members is granted by this textual
    /// check on the owner expression.
    #[inline]
    pub fn is_me(&self) -> bool {
        matches!(&self.kind, NodeKind::Identifier(name) if name == "me")
    }

    /// Short label for diagnostics and tracing.
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Node kinds.
#[derive(Debug)]
pub enum NodeKind {
    // Atoms
    Constant(Literal),
    Identifier(String),
    Vector(Vec<NodeRef>),
    Map(Vec<(NodeRef, NodeRef)>),

    // Expressions
    Binary {
        op: BinaryOp,
        lhs: NodeRef,
        rhs: NodeRef,
    },
    Unary {
        op: UnaryOp,
        operand: NodeRef,
    },
    /// `x++` / `x--` (postfix) and `++x` / `--x` (prefix).
    Step {
        op: UnaryOp,
        target: NodeRef,
        postfix: bool,
    },
    /// `&x`
    Reference(NodeRef),
    Assign {
        op: AssignOp,
        target: NodeRef,
        value: NodeRef,
    },
    Index {
        owner: NodeRef,
        index: NodeRef,
    },
    Member {
        owner: NodeRef,
        name: String,
    },
    MethodCall {
        owner: NodeRef,
        name: String,
        args: Vec<NodeRef>,
    },
    /// Call by name: builtin, user function, alias or extern variable.
    Call {
        name: String,
        args: Vec<NodeRef>,
    },
    /// Call of an arbitrary expression yielding an alias.
    ExprCall {
        callee: NodeRef,
        args: Vec<NodeRef>,
    },
    New {
        type_name: String,
        args: Vec<NodeRef>,
    },
    Ternary {
        cond: NodeRef,
        then_branch: NodeRef,
        else_branch: NodeRef,
    },

    // Declarations
    FunctionDecl(Arc<FunctionDecl>),
    StructDecl(Arc<StructDecl>),
    ClassDecl(Arc<ClassDecl>),

    // Statements
    Block(Vec<NodeRef>),
    If {
        cond: NodeRef,
        then_branch: NodeRef,
        else_branch: Option<NodeRef>,
    },
    Unless {
        cond: NodeRef,
        body: NodeRef,
    },
    While {
        cond: NodeRef,
        body: NodeRef,
    },
    DoWhile {
        body: NodeRef,
        cond: NodeRef,
    },
    For {
        init: Option<NodeRef>,
        cond: Option<NodeRef>,
        step: Option<NodeRef>,
        body: NodeRef,
    },
    Foreach {
        ident: String,
        iterable: NodeRef,
        body: NodeRef,
    },
    ForeachMapping {
        key: String,
        value: String,
        iterable: NodeRef,
        body: NodeRef,
    },
    Switch {
        target: NodeRef,
        cases: Vec<SwitchCase>,
        default: Option<NodeRef>,
    },
    Try {
        body: NodeRef,
        catch_ident: String,
        catch_body: NodeRef,
        finally: Option<NodeRef>,
    },
    Throw(NodeRef),
    Return(Option<NodeRef>),
    Break,
    Next,
}

impl NodeKind {
    /// Short label for diagnostics and tracing.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Constant(_) => "constant",
            NodeKind::Identifier(_) => "identifier",
            NodeKind::Vector(_) => "vector",
            NodeKind::Map(_) => "map",
            NodeKind::Binary { .. } => "binary",
            NodeKind::Unary { .. } => "unary",
            NodeKind::Step { .. } => "step",
            NodeKind::Reference(_) => "reference",
            NodeKind::Assign { .. } => "assign",
            NodeKind::Index { .. } => "index",
            NodeKind::Member { .. } => "member",
            NodeKind::MethodCall { .. } => "method call",
            NodeKind::Call { .. } => "call",
            NodeKind::ExprCall { .. } => "expression call",
            NodeKind::New { .. } => "new",
            NodeKind::Ternary { .. } => "ternary",
            NodeKind::FunctionDecl(_) => "function declaration",
            NodeKind::StructDecl(_) => "struct declaration",
            NodeKind::ClassDecl(_) => "class declaration",
            NodeKind::Block(_) => "block",
            NodeKind::If { .. } => "if",
            NodeKind::Unless { .. } => "unless",
            NodeKind::While { .. } => "while",
            NodeKind::DoWhile { .. } => "do-while",
            NodeKind::For { .. } => "for",
            NodeKind::Foreach { .. } => "foreach",
            NodeKind::ForeachMapping { .. } => "foreach mapping",
            NodeKind::Switch { .. } => "switch",
            NodeKind::Try { .. } => "try",
            NodeKind::Throw(_) => "throw",
            NodeKind::Return(_) => "return",
            NodeKind::Break => "break",
            NodeKind::Next => "next",
        }
    }
}
