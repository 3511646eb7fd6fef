//! The program-tree node.
//!
//! A [`Node`] is a closed sum over every syntactic kind plus a source
//! [`Location`] and a weak back-reference to its parent. Children are owned
//! through [`NodeRef`] (`Rc<Node>`); parents are `Weak`, so a tree never
//! forms an ownership cycle. Parent links are set after construction with
//! [`link_parents`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use apex_core::Location;

use crate::decl::*;
use crate::expr::*;
use crate::stmt::*;

/// Shared owning handle to a node.
pub type NodeRef = Rc<Node>;

/// Every node kind.
#[derive(Debug, Clone)]
pub enum NodeKind {
    // === Declarations ===
    Class(ClassDeclaration),
    Interface(InterfaceDeclaration),
    Trigger(TriggerDeclaration),
    Method(MethodDeclaration),
    Constructor(ConstructorDeclaration),
    Field(FieldDeclaration),
    VariableDeclarator(VariableDeclarator),
    Property(PropertyDeclaration),
    PropertyAccessor(PropertyAccessor),
    Parameter(Parameter),

    // === Statements ===
    Block(Block),
    LocalVariable(LocalVariableDeclaration),
    ExpressionStatement(ExpressionStatement),
    If(If),
    For(For),
    EnhancedFor(EnhancedFor),
    While(While),
    DoWhile(DoWhile),
    Return(Return),
    Break,
    Continue,
    Throw(Throw),
    Try(Try),
    Catch(Catch),

    // === Expressions ===
    Literal(Literal),
    Name(Name),
    FieldAccess(FieldAccess),
    MethodInvocation(MethodInvocation),
    New(New),
    Cast(Cast),
    InstanceOf(InstanceOf),
    Binary(Binary),
    Unary(Unary),
    Assignment(Assignment),
    Ternary(Ternary),
    This,
    Super,
    ArrayAccess(ArrayAccess),
    Soql(Soql),
}

impl NodeKind {
    /// Human-readable kind name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Class(_) => "class declaration",
            NodeKind::Interface(_) => "interface declaration",
            NodeKind::Trigger(_) => "trigger declaration",
            NodeKind::Method(_) => "method declaration",
            NodeKind::Constructor(_) => "constructor declaration",
            NodeKind::Field(_) => "field declaration",
            NodeKind::VariableDeclarator(_) => "variable declarator",
            NodeKind::Property(_) => "property declaration",
            NodeKind::PropertyAccessor(_) => "property accessor",
            NodeKind::Parameter(_) => "parameter",
            NodeKind::Block(_) => "block",
            NodeKind::LocalVariable(_) => "local variable declaration",
            NodeKind::ExpressionStatement(_) => "expression statement",
            NodeKind::If(_) => "if statement",
            NodeKind::For(_) => "for statement",
            NodeKind::EnhancedFor(_) => "enhanced for statement",
            NodeKind::While(_) => "while statement",
            NodeKind::DoWhile(_) => "do-while statement",
            NodeKind::Return(_) => "return statement",
            NodeKind::Break => "break statement",
            NodeKind::Continue => "continue statement",
            NodeKind::Throw(_) => "throw statement",
            NodeKind::Try(_) => "try statement",
            NodeKind::Catch(_) => "catch clause",
            NodeKind::Literal(_) => "literal",
            NodeKind::Name(_) => "name",
            NodeKind::FieldAccess(_) => "field access",
            NodeKind::MethodInvocation(_) => "method invocation",
            NodeKind::New(_) => "new expression",
            NodeKind::Cast(_) => "cast",
            NodeKind::InstanceOf(_) => "instanceof",
            NodeKind::Binary(_) => "binary operator",
            NodeKind::Unary(_) => "unary operator",
            NodeKind::Assignment(_) => "assignment",
            NodeKind::Ternary(_) => "ternary operator",
            NodeKind::This => "this",
            NodeKind::Super => "super",
            NodeKind::ArrayAccess(_) => "array access",
            NodeKind::Soql(_) => "query",
        }
    }
}

/// A node in the program tree.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub location: Location,
    parent: RefCell<Weak<Node>>,
}

impl Node {
    pub fn new(kind: NodeKind, location: Location) -> NodeRef {
        Rc::new(Node {
            kind,
            location,
            parent: RefCell::new(Weak::new()),
        })
    }

    /// A node with no source position.
    pub fn synthetic(kind: NodeKind) -> NodeRef {
        Self::new(kind, Location::synthetic())
    }

    pub fn set_parent(&self, parent: &NodeRef) {
        *self.parent.borrow_mut() = Rc::downgrade(parent);
    }

    /// The parent, if linked and still alive.
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().upgrade()
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Semantically meaningful children, in source order.
    pub fn children(&self) -> Vec<&NodeRef> {
        let mut out = Vec::new();
        match &self.kind {
            NodeKind::Class(d) => out.extend(&d.members),
            NodeKind::Interface(d) => out.extend(&d.members),
            NodeKind::Trigger(d) => out.push(&d.body),
            NodeKind::Method(d) => {
                out.extend(&d.params);
                out.extend(&d.body);
            }
            NodeKind::Constructor(d) => {
                out.extend(&d.params);
                out.push(&d.body);
            }
            NodeKind::Field(d) => out.extend(&d.declarators),
            NodeKind::VariableDeclarator(d) => out.extend(&d.init),
            NodeKind::Property(d) => {
                out.extend(&d.getter);
                out.extend(&d.setter);
            }
            NodeKind::PropertyAccessor(d) => out.extend(&d.body),
            NodeKind::Parameter(_) => {}
            NodeKind::Block(b) => out.extend(&b.statements),
            NodeKind::LocalVariable(d) => out.extend(&d.declarators),
            NodeKind::ExpressionStatement(s) => out.push(&s.expr),
            NodeKind::If(s) => {
                out.push(&s.condition);
                out.push(&s.then_branch);
                out.extend(&s.else_branch);
            }
            NodeKind::For(s) => {
                out.extend(&s.init);
                out.extend(&s.condition);
                out.extend(&s.update);
                out.push(&s.body);
            }
            NodeKind::EnhancedFor(s) => {
                out.push(&s.iterable);
                out.push(&s.body);
            }
            NodeKind::While(s) => {
                out.push(&s.condition);
                out.push(&s.body);
            }
            NodeKind::DoWhile(s) => {
                out.push(&s.body);
                out.push(&s.condition);
            }
            NodeKind::Return(s) => out.extend(&s.value),
            NodeKind::Break | NodeKind::Continue => {}
            NodeKind::Throw(s) => out.push(&s.expr),
            NodeKind::Try(s) => {
                out.push(&s.block);
                out.extend(&s.catches);
                out.extend(&s.finally);
            }
            NodeKind::Catch(c) => out.push(&c.block),
            NodeKind::Literal(_) | NodeKind::Name(_) => {}
            NodeKind::FieldAccess(e) => out.push(&e.receiver),
            NodeKind::MethodInvocation(e) => {
                out.extend(&e.receiver);
                out.extend(&e.args);
            }
            NodeKind::New(e) => {
                out.extend(&e.args);
                match &e.init {
                    Some(CollectionInit::Elements(items)) => out.extend(items),
                    Some(CollectionInit::Pairs(pairs)) => {
                        for (k, v) in pairs {
                            out.push(k);
                            out.push(v);
                        }
                    }
                    None => {}
                }
            }
            NodeKind::Cast(e) => out.push(&e.expr),
            NodeKind::InstanceOf(e) => out.push(&e.expr),
            NodeKind::Binary(e) => {
                out.push(&e.left);
                out.push(&e.right);
            }
            NodeKind::Unary(e) => out.push(&e.operand),
            NodeKind::Assignment(e) => {
                out.push(&e.target);
                out.push(&e.value);
            }
            NodeKind::Ternary(e) => {
                out.push(&e.condition);
                out.push(&e.then_expr);
                out.push(&e.else_expr);
            }
            NodeKind::This | NodeKind::Super => {}
            NodeKind::ArrayAccess(e) => {
                out.push(&e.receiver);
                out.push(&e.index);
            }
            NodeKind::Soql(q) => out.extend(q.binds.iter().map(|b| &b.expr)),
        }
        out
    }

    // === Typed views ===

    pub fn as_class(&self) -> Option<&ClassDeclaration> {
        match &self.kind {
            NodeKind::Class(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodDeclaration> {
        match &self.kind {
            NodeKind::Method(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&Parameter> {
        match &self.kind {
            NodeKind::Parameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_declarator(&self) -> Option<&VariableDeclarator> {
        match &self.kind {
            NodeKind::VariableDeclarator(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_accessor(&self) -> Option<&PropertyAccessor> {
        match &self.kind {
            NodeKind::PropertyAccessor(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_catch(&self) -> Option<&Catch> {
        match &self.kind {
            NodeKind::Catch(c) => Some(c),
            _ => None,
        }
    }

    /// Whether this is a statement kind.
    pub fn is_statement(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Block(_)
                | NodeKind::LocalVariable(_)
                | NodeKind::ExpressionStatement(_)
                | NodeKind::If(_)
                | NodeKind::For(_)
                | NodeKind::EnhancedFor(_)
                | NodeKind::While(_)
                | NodeKind::DoWhile(_)
                | NodeKind::Return(_)
                | NodeKind::Break
                | NodeKind::Continue
                | NodeKind::Throw(_)
                | NodeKind::Try(_)
        )
    }
}

/// Point every descendant of `root` at its parent.
pub fn link_parents(root: &NodeRef) {
    let mut stack = vec![Rc::clone(root)];
    while let Some(node) = stack.pop() {
        for child in node.children() {
            child.set_parent(&node);
            stack.push(Rc::clone(child));
        }
    }
}
