//! Statement payloads.

use apex_core::{Modifiers, TypeRef};

use crate::node::NodeRef;

#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<NodeRef>,
}

/// `Type a = 1, b;` inside a body.
#[derive(Debug, Clone)]
pub struct LocalVariableDeclaration {
    pub modifiers: Modifiers,
    pub type_ref: TypeRef,
    /// [`crate::VariableDeclarator`] nodes.
    pub declarators: Vec<NodeRef>,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expr: NodeRef,
}

#[derive(Debug, Clone)]
pub struct If {
    pub condition: NodeRef,
    pub then_branch: NodeRef,
    pub else_branch: Option<NodeRef>,
}

/// `for (init; condition; update) body`
#[derive(Debug, Clone)]
pub struct For {
    /// Local declarations or expression statements.
    pub init: Vec<NodeRef>,
    pub condition: Option<NodeRef>,
    /// Expressions evaluated after each iteration.
    pub update: Vec<NodeRef>,
    pub body: NodeRef,
}

/// `for (Type name : iterable) body`
#[derive(Debug, Clone)]
pub struct EnhancedFor {
    pub type_ref: TypeRef,
    pub name: String,
    pub iterable: NodeRef,
    pub body: NodeRef,
}

#[derive(Debug, Clone)]
pub struct While {
    pub condition: NodeRef,
    pub body: NodeRef,
}

#[derive(Debug, Clone)]
pub struct DoWhile {
    pub body: NodeRef,
    pub condition: NodeRef,
}

#[derive(Debug, Clone)]
pub struct Return {
    pub value: Option<NodeRef>,
}

#[derive(Debug, Clone)]
pub struct Throw {
    pub expr: NodeRef,
}

#[derive(Debug, Clone)]
pub struct Try {
    pub block: NodeRef,
    /// [`Catch`] nodes, tried in order.
    pub catches: Vec<NodeRef>,
    pub finally: Option<NodeRef>,
}

/// `catch (Type name) block`
#[derive(Debug, Clone)]
pub struct Catch {
    pub type_ref: TypeRef,
    pub name: String,
    pub block: NodeRef,
}
