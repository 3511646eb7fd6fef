//! Expression payloads.

use std::fmt;

use apex_core::TypeRef;

use crate::node::NodeRef;
use crate::ops::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Double(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Double(d) => write!(f, "{d}"),
            Literal::String(s) => write!(f, "'{s}'"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// A dotted identifier chain in value position, e.g. `acc.Owner.Name`.
#[derive(Debug, Clone)]
pub struct Name {
    pub names: Vec<String>,
}

impl Name {
    pub fn dotted(&self) -> String {
        self.names.join(".")
    }
}

/// `receiver.name` where the receiver is not itself a name chain.
#[derive(Debug, Clone)]
pub struct FieldAccess {
    pub receiver: NodeRef,
    pub name: String,
}

/// `a.b.method(args)` or `expr.method(args)`.
///
/// With no receiver the whole chain lives in `names`; with a receiver,
/// `names` is the path applied to the receiver's value.
#[derive(Debug, Clone)]
pub struct MethodInvocation {
    pub receiver: Option<NodeRef>,
    pub names: Vec<String>,
    pub args: Vec<NodeRef>,
}

impl MethodInvocation {
    /// The method name (last segment).
    pub fn method_name(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or("")
    }
}

/// Brace initializer on `new`.
#[derive(Debug, Clone)]
pub enum CollectionInit {
    /// `new List<T>{a, b}` / `new Set<T>{a, b}`
    Elements(Vec<NodeRef>),
    /// `new Map<K, V>{k => v}`
    Pairs(Vec<(NodeRef, NodeRef)>),
}

#[derive(Debug, Clone)]
pub struct New {
    pub type_ref: TypeRef,
    pub args: Vec<NodeRef>,
    pub init: Option<CollectionInit>,
}

#[derive(Debug, Clone)]
pub struct Cast {
    pub type_ref: TypeRef,
    pub expr: NodeRef,
}

#[derive(Debug, Clone)]
pub struct InstanceOf {
    pub expr: NodeRef,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone)]
pub struct Binary {
    pub op: BinaryOp,
    pub left: NodeRef,
    pub right: NodeRef,
}

#[derive(Debug, Clone)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: NodeRef,
}

/// `target = value`, or `target op= value` when `op` is set.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub op: Option<BinaryOp>,
    pub target: NodeRef,
    pub value: NodeRef,
}

#[derive(Debug, Clone)]
pub struct Ternary {
    pub condition: NodeRef,
    pub then_expr: NodeRef,
    pub else_expr: NodeRef,
}

/// `receiver[index]`
#[derive(Debug, Clone)]
pub struct ArrayAccess {
    pub receiver: NodeRef,
    pub index: NodeRef,
}

/// A `:name` bind variable inside an embedded query.
#[derive(Debug, Clone)]
pub struct SoqlBind {
    pub name: String,
    pub expr: NodeRef,
}

/// `[SELECT ... FROM Object WHERE x = :bind]`
#[derive(Debug, Clone)]
pub struct Soql {
    /// Query text as written.
    pub query: String,
    /// The object named in `FROM`.
    pub object: TypeRef,
    pub binds: Vec<SoqlBind>,
}
