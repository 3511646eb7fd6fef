//! Declaration payloads.
//!
//! Members of a class are child nodes, not inline structs, so that every
//! member carries its own location and parent link.

use std::fmt;

use apex_core::{Annotation, Modifiers, TypeRef};

use crate::node::NodeRef;

/// `class Name extends Super implements I1, I2 { members }`
#[derive(Debug, Clone)]
pub struct ClassDeclaration {
    pub name: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub super_class: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    /// Fields, properties, methods, constructors and nested types.
    pub members: Vec<NodeRef>,
}

/// `interface Name extends I1 { method signatures }`
#[derive(Debug, Clone)]
pub struct InterfaceDeclaration {
    pub name: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub extends: Vec<TypeRef>,
    pub members: Vec<NodeRef>,
}

/// When a trigger fires relative to the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerTiming {
    Before,
    After,
}

/// Which write operation fires a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerOperation {
    Insert,
    Update,
    Delete,
    Undelete,
}

/// One `before insert`-style event in a trigger header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerEvent {
    pub timing: TriggerTiming,
    pub operation: TriggerOperation,
}

impl TriggerEvent {
    pub fn new(timing: TriggerTiming, operation: TriggerOperation) -> Self {
        Self { timing, operation }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timing = match self.timing {
            TriggerTiming::Before => "before",
            TriggerTiming::After => "after",
        };
        let op = match self.operation {
            TriggerOperation::Insert => "insert",
            TriggerOperation::Update => "update",
            TriggerOperation::Delete => "delete",
            TriggerOperation::Undelete => "undelete",
        };
        write!(f, "{timing} {op}")
    }
}

/// `trigger Name on Object (events) { body }`
#[derive(Debug, Clone)]
pub struct TriggerDeclaration {
    pub name: String,
    pub object: TypeRef,
    pub events: Vec<TriggerEvent>,
    pub body: NodeRef,
}

#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    pub name: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub return_type: TypeRef,
    /// [`Parameter`] nodes.
    pub params: Vec<NodeRef>,
    /// `None` for abstract and interface methods.
    pub body: Option<NodeRef>,
}

#[derive(Debug, Clone)]
pub struct ConstructorDeclaration {
    pub name: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub params: Vec<NodeRef>,
    pub body: NodeRef,
}

/// `modifiers Type a = 1, b;`
#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub type_ref: TypeRef,
    /// [`VariableDeclarator`] nodes.
    pub declarators: Vec<NodeRef>,
}

/// One `name = init` inside a field or local declaration.
#[derive(Debug, Clone)]
pub struct VariableDeclarator {
    pub name: String,
    pub init: Option<NodeRef>,
}

/// `modifiers Type Name { get; set; }`
#[derive(Debug, Clone)]
pub struct PropertyDeclaration {
    pub name: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub type_ref: TypeRef,
    /// [`PropertyAccessor`] nodes.
    pub getter: Option<NodeRef>,
    pub setter: Option<NodeRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Get,
    Set,
}

/// `get { ... }` or `set;`. A missing body is an automatic accessor.
#[derive(Debug, Clone)]
pub struct PropertyAccessor {
    pub kind: AccessorKind,
    pub modifiers: Modifiers,
    pub body: Option<NodeRef>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub modifiers: Modifiers,
    pub type_ref: TypeRef,
}
