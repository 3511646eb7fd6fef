//! Builder helpers for constructing trees without a grammar layer.
//!
//! Hosts and tests use these to assemble the trees the parser would produce.
//! Expression and statement helpers are free functions returning
//! [`NodeRef`]; declarations use [`ClassBuilder`] and [`MethodBuilder`].
//! Type strings such as `"Map<String, List<Integer>>"` or `"Account[]"` are
//! parsed by [`ty`].
//!
//! ```
//! use apex_ast::build::*;
//! use apex_core::Modifiers;
//!
//! let class = ClassBuilder::new("Counter")
//!     .modifiers(Modifiers::PUBLIC)
//!     .field(Modifiers::PRIVATE, "Integer", "count", Some(int(0)))
//!     .method(
//!         MethodBuilder::new("increment")
//!             .modifiers(Modifiers::PUBLIC)
//!             .returns("Integer")
//!             .body(vec![ret(Some(unary(apex_ast::UnaryOp::PreInc, name("count"))))]),
//!     )
//!     .build();
//! assert_eq!(class.children().len(), 2);
//! ```

use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

use apex_core::{Annotation, Location, Modifiers, TypeRef};

use crate::decl::*;
use crate::expr::*;
use crate::node::{Node, NodeKind, NodeRef, link_parents};
use crate::ops::{BinaryOp, UnaryOp};
use crate::stmt::*;

// ============================================================================
// Types
// ============================================================================

/// Parse a type string such as `ns.Outer.Inner`, `List<Integer>` or `String[][]`.
pub fn ty(text: &str) -> TypeRef {
    let mut chars = text.chars().peekable();
    parse_type(&mut chars)
}

fn skip_ws(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn parse_type(chars: &mut Peekable<Chars<'_>>) -> TypeRef {
    skip_ws(chars);
    let mut dotted = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            dotted.push(c);
            chars.next();
        } else {
            break;
        }
    }
    let mut type_ref = TypeRef::new(&dotted);
    skip_ws(chars);
    if chars.peek() == Some(&'<') {
        chars.next();
        let mut args = Vec::new();
        loop {
            args.push(parse_type(chars));
            skip_ws(chars);
            match chars.next() {
                Some(',') => continue,
                _ => break,
            }
        }
        type_ref = type_ref.with_args(args);
        skip_ws(chars);
    }
    let mut dimensions = 0;
    while chars.peek() == Some(&'[') {
        chars.next();
        skip_ws(chars);
        if chars.peek() == Some(&']') {
            chars.next();
        }
        dimensions += 1;
        skip_ws(chars);
    }
    type_ref.with_dimensions(dimensions)
}

fn split_dotted(dotted: &str) -> Vec<String> {
    dotted.split('.').map(str::to_string).collect()
}

fn node(kind: NodeKind) -> NodeRef {
    Node::synthetic(kind)
}

// ============================================================================
// Expressions
// ============================================================================

pub fn int(value: i64) -> NodeRef {
    node(NodeKind::Literal(Literal::Integer(value)))
}

pub fn double(value: f64) -> NodeRef {
    node(NodeKind::Literal(Literal::Double(value)))
}

pub fn string(value: &str) -> NodeRef {
    node(NodeKind::Literal(Literal::String(value.to_string())))
}

pub fn boolean(value: bool) -> NodeRef {
    node(NodeKind::Literal(Literal::Boolean(value)))
}

pub fn null() -> NodeRef {
    node(NodeKind::Literal(Literal::Null))
}

/// A dotted name in value position.
pub fn name(dotted: &str) -> NodeRef {
    node(NodeKind::Name(Name {
        names: split_dotted(dotted),
    }))
}

pub fn field(receiver: NodeRef, field_name: &str) -> NodeRef {
    node(NodeKind::FieldAccess(FieldAccess {
        receiver,
        name: field_name.to_string(),
    }))
}

/// `a.b.method(args)` with the whole chain as names.
pub fn call(dotted: &str, args: Vec<NodeRef>) -> NodeRef {
    node(NodeKind::MethodInvocation(MethodInvocation {
        receiver: None,
        names: split_dotted(dotted),
        args,
    }))
}

/// `receiver.path(args)`.
pub fn call_on(receiver: NodeRef, dotted: &str, args: Vec<NodeRef>) -> NodeRef {
    node(NodeKind::MethodInvocation(MethodInvocation {
        receiver: Some(receiver),
        names: split_dotted(dotted),
        args,
    }))
}

pub fn new_object(type_name: &str, args: Vec<NodeRef>) -> NodeRef {
    node(NodeKind::New(New {
        type_ref: ty(type_name),
        args,
        init: None,
    }))
}

/// `new List<T>{...}` or `new Set<T>{...}`.
pub fn new_collection(type_name: &str, elements: Vec<NodeRef>) -> NodeRef {
    node(NodeKind::New(New {
        type_ref: ty(type_name),
        args: Vec::new(),
        init: Some(CollectionInit::Elements(elements)),
    }))
}

/// `new Map<K, V>{k => v, ...}`.
pub fn new_map(type_name: &str, pairs: Vec<(NodeRef, NodeRef)>) -> NodeRef {
    node(NodeKind::New(New {
        type_ref: ty(type_name),
        args: Vec::new(),
        init: Some(CollectionInit::Pairs(pairs)),
    }))
}

pub fn cast(type_name: &str, expr: NodeRef) -> NodeRef {
    node(NodeKind::Cast(Cast {
        type_ref: ty(type_name),
        expr,
    }))
}

pub fn instance_of(expr: NodeRef, type_name: &str) -> NodeRef {
    node(NodeKind::InstanceOf(InstanceOf {
        expr,
        type_ref: ty(type_name),
    }))
}

pub fn binary(op: BinaryOp, left: NodeRef, right: NodeRef) -> NodeRef {
    node(NodeKind::Binary(Binary { op, left, right }))
}

pub fn unary(op: UnaryOp, operand: NodeRef) -> NodeRef {
    node(NodeKind::Unary(Unary { op, operand }))
}

pub fn assign(target: NodeRef, value: NodeRef) -> NodeRef {
    node(NodeKind::Assignment(Assignment {
        op: None,
        target,
        value,
    }))
}

/// `target op= value`.
pub fn compound(op: BinaryOp, target: NodeRef, value: NodeRef) -> NodeRef {
    node(NodeKind::Assignment(Assignment {
        op: Some(op),
        target,
        value,
    }))
}

pub fn ternary(condition: NodeRef, then_expr: NodeRef, else_expr: NodeRef) -> NodeRef {
    node(NodeKind::Ternary(Ternary {
        condition,
        then_expr,
        else_expr,
    }))
}

pub fn this() -> NodeRef {
    node(NodeKind::This)
}

pub fn super_() -> NodeRef {
    node(NodeKind::Super)
}

pub fn index(receiver: NodeRef, index: NodeRef) -> NodeRef {
    node(NodeKind::ArrayAccess(ArrayAccess { receiver, index }))
}

pub fn soql(query: &str, object: &str, binds: Vec<(&str, NodeRef)>) -> NodeRef {
    node(NodeKind::Soql(Soql {
        query: query.to_string(),
        object: ty(object),
        binds: binds
            .into_iter()
            .map(|(name, expr)| SoqlBind {
                name: name.to_string(),
                expr,
            })
            .collect(),
    }))
}

// ============================================================================
// Statements
// ============================================================================

pub fn block(statements: Vec<NodeRef>) -> NodeRef {
    node(NodeKind::Block(Block { statements }))
}

fn declarator(var_name: &str, init: Option<NodeRef>) -> NodeRef {
    node(NodeKind::VariableDeclarator(VariableDeclarator {
        name: var_name.to_string(),
        init,
    }))
}

/// `Type name = init;`
pub fn local(type_name: &str, var_name: &str, init: Option<NodeRef>) -> NodeRef {
    node(NodeKind::LocalVariable(LocalVariableDeclaration {
        modifiers: Modifiers::empty(),
        type_ref: ty(type_name),
        declarators: vec![declarator(var_name, init)],
    }))
}

pub fn expr_stmt(expr: NodeRef) -> NodeRef {
    node(NodeKind::ExpressionStatement(ExpressionStatement { expr }))
}

pub fn if_(condition: NodeRef, then_branch: NodeRef, else_branch: Option<NodeRef>) -> NodeRef {
    node(NodeKind::If(If {
        condition,
        then_branch,
        else_branch,
    }))
}

pub fn for_(
    init: Vec<NodeRef>,
    condition: Option<NodeRef>,
    update: Vec<NodeRef>,
    body: NodeRef,
) -> NodeRef {
    node(NodeKind::For(For {
        init,
        condition,
        update,
        body,
    }))
}

pub fn for_each(type_name: &str, var_name: &str, iterable: NodeRef, body: NodeRef) -> NodeRef {
    node(NodeKind::EnhancedFor(EnhancedFor {
        type_ref: ty(type_name),
        name: var_name.to_string(),
        iterable,
        body,
    }))
}

pub fn while_(condition: NodeRef, body: NodeRef) -> NodeRef {
    node(NodeKind::While(While { condition, body }))
}

pub fn do_while(body: NodeRef, condition: NodeRef) -> NodeRef {
    node(NodeKind::DoWhile(DoWhile { body, condition }))
}

pub fn ret(value: Option<NodeRef>) -> NodeRef {
    node(NodeKind::Return(Return { value }))
}

pub fn brk() -> NodeRef {
    node(NodeKind::Break)
}

pub fn cont() -> NodeRef {
    node(NodeKind::Continue)
}

pub fn throw(expr: NodeRef) -> NodeRef {
    node(NodeKind::Throw(Throw { expr }))
}

pub fn try_(block: NodeRef, catches: Vec<NodeRef>, finally: Option<NodeRef>) -> NodeRef {
    node(NodeKind::Try(Try {
        block,
        catches,
        finally,
    }))
}

pub fn catch(type_name: &str, var_name: &str, block: NodeRef) -> NodeRef {
    node(NodeKind::Catch(Catch {
        type_ref: ty(type_name),
        name: var_name.to_string(),
        block,
    }))
}

// ============================================================================
// Declarations
// ============================================================================

/// Body of a property accessor.
#[derive(Debug, Clone)]
pub enum Accessor {
    /// No accessor of this kind.
    Absent,
    /// `get;` / `set;`
    Auto,
    /// `get { ... }` / `set { ... }`
    Body(Vec<NodeRef>),
}

/// Builds a method or constructor declaration.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    modifiers: Modifiers,
    annotations: Vec<Annotation>,
    return_type: TypeRef,
    params: Vec<(TypeRef, String)>,
    body: Option<Vec<NodeRef>>,
    location: Location,
}

impl MethodBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            return_type: ty("void"),
            params: Vec::new(),
            body: Some(Vec::new()),
            location: Location::synthetic(),
        }
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn returns(mut self, type_name: &str) -> Self {
        self.return_type = ty(type_name);
        self
    }

    pub fn param(mut self, type_name: &str, param_name: &str) -> Self {
        self.params.push((ty(type_name), param_name.to_string()));
        self
    }

    pub fn body(mut self, statements: Vec<NodeRef>) -> Self {
        self.body = Some(statements);
        self
    }

    /// No body: abstract or interface method.
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    fn param_nodes(&self) -> Vec<NodeRef> {
        self.params
            .iter()
            .map(|(type_ref, name)| {
                Node::new(
                    NodeKind::Parameter(Parameter {
                        name: name.clone(),
                        modifiers: Modifiers::empty(),
                        type_ref: type_ref.clone(),
                    }),
                    self.location.clone(),
                )
            })
            .collect()
    }

    pub fn build(self) -> NodeRef {
        let params = self.param_nodes();
        let node = Node::new(
            NodeKind::Method(MethodDeclaration {
                name: self.name,
                modifiers: self.modifiers,
                annotations: self.annotations,
                return_type: self.return_type,
                params,
                body: self.body.map(block),
            }),
            self.location,
        );
        link_parents(&node);
        node
    }

    pub fn build_constructor(self) -> NodeRef {
        let params = self.param_nodes();
        let node = Node::new(
            NodeKind::Constructor(ConstructorDeclaration {
                name: self.name,
                modifiers: self.modifiers,
                annotations: self.annotations,
                params,
                body: block(self.body.unwrap_or_default()),
            }),
            self.location,
        );
        link_parents(&node);
        node
    }
}

/// Builds a class or interface declaration.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    is_interface: bool,
    modifiers: Modifiers,
    annotations: Vec<Annotation>,
    super_class: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    members: Vec<NodeRef>,
    location: Location,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_interface: false,
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            location: Location::synthetic(),
        }
    }

    pub fn interface(name: &str) -> Self {
        Self {
            is_interface: true,
            ..Self::new(name)
        }
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn extends(mut self, type_name: &str) -> Self {
        if self.is_interface {
            self.interfaces.push(ty(type_name));
        } else {
            self.super_class = Some(ty(type_name));
        }
        self
    }

    pub fn implements(mut self, type_name: &str) -> Self {
        self.interfaces.push(ty(type_name));
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Add a prebuilt member node.
    pub fn member(mut self, member: NodeRef) -> Self {
        self.members.push(member);
        self
    }

    pub fn field(
        self,
        modifiers: Modifiers,
        type_name: &str,
        field_name: &str,
        init: Option<NodeRef>,
    ) -> Self {
        let location = self.location.clone();
        self.member(Node::new(
            NodeKind::Field(FieldDeclaration {
                modifiers,
                annotations: Vec::new(),
                type_ref: ty(type_name),
                declarators: vec![declarator(field_name, init)],
            }),
            location,
        ))
    }

    pub fn property(
        self,
        modifiers: Modifiers,
        type_name: &str,
        prop_name: &str,
        getter: Accessor,
        setter: Accessor,
    ) -> Self {
        fn accessor(kind: AccessorKind, a: Accessor) -> Option<NodeRef> {
            let body = match a {
                Accessor::Absent => return None,
                Accessor::Auto => None,
                Accessor::Body(stmts) => Some(block(stmts)),
            };
            Some(node(NodeKind::PropertyAccessor(PropertyAccessor {
                kind,
                modifiers: Modifiers::empty(),
                body,
            })))
        }
        let location = self.location.clone();
        self.member(Node::new(
            NodeKind::Property(PropertyDeclaration {
                name: prop_name.to_string(),
                modifiers,
                annotations: Vec::new(),
                type_ref: ty(type_name),
                getter: accessor(AccessorKind::Get, getter),
                setter: accessor(AccessorKind::Set, setter),
            }),
            location,
        ))
    }

    pub fn method(self, method: MethodBuilder) -> Self {
        let method = if self.is_interface {
            method.without_body()
        } else {
            method
        };
        self.member(method.build())
    }

    pub fn constructor(self, ctor: MethodBuilder) -> Self {
        let ctor = MethodBuilder {
            name: self.name.clone(),
            ..ctor
        };
        self.member(ctor.build_constructor())
    }

    pub fn inner(self, class: ClassBuilder) -> Self {
        self.member(class.build())
    }

    pub fn build(self) -> NodeRef {
        let kind = if self.is_interface {
            NodeKind::Interface(InterfaceDeclaration {
                name: self.name,
                modifiers: self.modifiers,
                annotations: self.annotations,
                extends: self.interfaces,
                members: self.members,
            })
        } else {
            NodeKind::Class(ClassDeclaration {
                name: self.name,
                modifiers: self.modifiers,
                annotations: self.annotations,
                super_class: self.super_class,
                interfaces: self.interfaces,
                members: self.members,
            })
        };
        let node = Node::new(kind, self.location);
        link_parents(&node);
        node
    }
}

/// `trigger name on object (events) { body }`
pub fn trigger(
    trigger_name: &str,
    object: &str,
    events: Vec<TriggerEvent>,
    body: Vec<NodeRef>,
) -> NodeRef {
    let decl = node(NodeKind::Trigger(TriggerDeclaration {
        name: trigger_name.to_string(),
        object: ty(object),
        events,
        body: block(body),
    }));
    link_parents(&decl);
    decl
}

/// Shorthand used by tests: a `public static` method running `body`.
pub fn static_method(method_name: &str, returns: &str, body: Vec<NodeRef>) -> MethodBuilder {
    MethodBuilder::new(method_name)
        .modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
        .returns(returns)
        .body(body)
}

/// Clone a handle; reads better than `Rc::clone` inside builder chains.
pub fn share(node: &NodeRef) -> NodeRef {
    Rc::clone(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_nested_generic_array_types() {
        let t = ty("Map<String, List<ns.Foo>>[]");
        assert_eq!(t.names, vec!["Map".to_string()]);
        assert_eq!(t.dimensions, 1);
        assert_eq!(t.type_args.len(), 2);
        assert_eq!(t.type_args[1].type_args[0].names, vec!["ns", "Foo"]);
        assert_eq!(t.to_string(), "Map<String, List<ns.Foo>>[]");
    }

    #[test]
    fn class_builder_links_members() {
        let class = ClassBuilder::new("A")
            .field(Modifiers::PUBLIC, "Integer", "x", None)
            .method(MethodBuilder::new("run"))
            .build();
        for member in class.children() {
            assert!(Rc::ptr_eq(&member.parent().unwrap(), &class));
        }
    }

    #[test]
    fn interface_methods_have_no_body() {
        let iface = ClassBuilder::interface("Shape")
            .method(MethodBuilder::new("area").returns("Double"))
            .build();
        let method = iface.children()[0].as_method().unwrap();
        assert!(method.body.is_none());
    }
}
