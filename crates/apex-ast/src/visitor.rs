//! Visitor pattern for traversing the program tree.
//!
//! Each `visit_*` method corresponds to one node kind and is called when that
//! kind is encountered. The default implementations call the matching
//! `walk_*` function, which visits the children. Override any `visit_*` to
//! customize behavior; call the `walk_*` function from the override to keep
//! descending.
//!
//! ```
//! use apex_ast::build::*;
//! use apex_ast::visitor::{Visitor, walk_literal};
//! use apex_ast::{Literal, NodeRef};
//!
//! #[derive(Default)]
//! struct LiteralCounter(usize);
//!
//! impl Visitor for LiteralCounter {
//!     fn visit_literal(&mut self, _node: &NodeRef, lit: &Literal) {
//!         self.0 += 1;
//!         walk_literal(self, lit);
//!     }
//! }
//!
//! let tree = block(vec![expr_stmt(int(1)), ret(Some(int(2)))]);
//! let mut counter = LiteralCounter::default();
//! counter.visit_node(&tree);
//! assert_eq!(counter.0, 2);
//! ```

use crate::decl::*;
use crate::expr::*;
use crate::node::{NodeKind, NodeRef};
use crate::stmt::*;

/// Visitor trait for traversing nodes.
pub trait Visitor: Sized {
    /// Entry point: dispatch on the node's kind.
    fn visit_node(&mut self, node: &NodeRef) {
        walk_node(self, node);
    }

    // === Declarations ===

    fn visit_class(&mut self, _node: &NodeRef, decl: &ClassDeclaration) {
        walk_class(self, decl);
    }

    fn visit_interface(&mut self, _node: &NodeRef, decl: &InterfaceDeclaration) {
        walk_interface(self, decl);
    }

    fn visit_trigger(&mut self, _node: &NodeRef, decl: &TriggerDeclaration) {
        walk_trigger(self, decl);
    }

    fn visit_method(&mut self, _node: &NodeRef, decl: &MethodDeclaration) {
        walk_method(self, decl);
    }

    fn visit_constructor(&mut self, _node: &NodeRef, decl: &ConstructorDeclaration) {
        walk_constructor(self, decl);
    }

    fn visit_field(&mut self, _node: &NodeRef, decl: &FieldDeclaration) {
        walk_field(self, decl);
    }

    fn visit_variable_declarator(&mut self, _node: &NodeRef, decl: &VariableDeclarator) {
        walk_variable_declarator(self, decl);
    }

    fn visit_property(&mut self, _node: &NodeRef, decl: &PropertyDeclaration) {
        walk_property(self, decl);
    }

    fn visit_property_accessor(&mut self, _node: &NodeRef, accessor: &PropertyAccessor) {
        walk_property_accessor(self, accessor);
    }

    fn visit_parameter(&mut self, _node: &NodeRef, _param: &Parameter) {
        // Leaf node, no children
    }

    // === Statements ===

    fn visit_block(&mut self, _node: &NodeRef, block: &Block) {
        walk_block(self, block);
    }

    fn visit_local_variable(&mut self, _node: &NodeRef, decl: &LocalVariableDeclaration) {
        walk_local_variable(self, decl);
    }

    fn visit_expression_statement(&mut self, _node: &NodeRef, stmt: &ExpressionStatement) {
        self.visit_node(&stmt.expr);
    }

    fn visit_if(&mut self, _node: &NodeRef, stmt: &If) {
        walk_if(self, stmt);
    }

    fn visit_for(&mut self, _node: &NodeRef, stmt: &For) {
        walk_for(self, stmt);
    }

    fn visit_enhanced_for(&mut self, _node: &NodeRef, stmt: &EnhancedFor) {
        walk_enhanced_for(self, stmt);
    }

    fn visit_while(&mut self, _node: &NodeRef, stmt: &While) {
        self.visit_node(&stmt.condition);
        self.visit_node(&stmt.body);
    }

    fn visit_do_while(&mut self, _node: &NodeRef, stmt: &DoWhile) {
        self.visit_node(&stmt.body);
        self.visit_node(&stmt.condition);
    }

    fn visit_return(&mut self, _node: &NodeRef, stmt: &Return) {
        if let Some(value) = &stmt.value {
            self.visit_node(value);
        }
    }

    fn visit_break(&mut self, _node: &NodeRef) {}

    fn visit_continue(&mut self, _node: &NodeRef) {}

    fn visit_throw(&mut self, _node: &NodeRef, stmt: &Throw) {
        self.visit_node(&stmt.expr);
    }

    fn visit_try(&mut self, _node: &NodeRef, stmt: &Try) {
        walk_try(self, stmt);
    }

    fn visit_catch(&mut self, _node: &NodeRef, clause: &Catch) {
        self.visit_node(&clause.block);
    }

    // === Expressions ===

    fn visit_literal(&mut self, _node: &NodeRef, lit: &Literal) {
        walk_literal(self, lit);
    }

    fn visit_name(&mut self, _node: &NodeRef, _name: &Name) {}

    fn visit_field_access(&mut self, _node: &NodeRef, expr: &FieldAccess) {
        self.visit_node(&expr.receiver);
    }

    fn visit_method_invocation(&mut self, _node: &NodeRef, expr: &MethodInvocation) {
        walk_method_invocation(self, expr);
    }

    fn visit_new(&mut self, _node: &NodeRef, expr: &New) {
        walk_new(self, expr);
    }

    fn visit_cast(&mut self, _node: &NodeRef, expr: &Cast) {
        self.visit_node(&expr.expr);
    }

    fn visit_instance_of(&mut self, _node: &NodeRef, expr: &InstanceOf) {
        self.visit_node(&expr.expr);
    }

    fn visit_binary(&mut self, _node: &NodeRef, expr: &Binary) {
        self.visit_node(&expr.left);
        self.visit_node(&expr.right);
    }

    fn visit_unary(&mut self, _node: &NodeRef, expr: &Unary) {
        self.visit_node(&expr.operand);
    }

    fn visit_assignment(&mut self, _node: &NodeRef, expr: &Assignment) {
        self.visit_node(&expr.target);
        self.visit_node(&expr.value);
    }

    fn visit_ternary(&mut self, _node: &NodeRef, expr: &Ternary) {
        self.visit_node(&expr.condition);
        self.visit_node(&expr.then_expr);
        self.visit_node(&expr.else_expr);
    }

    fn visit_this(&mut self, _node: &NodeRef) {}

    fn visit_super(&mut self, _node: &NodeRef) {}

    fn visit_array_access(&mut self, _node: &NodeRef, expr: &ArrayAccess) {
        self.visit_node(&expr.receiver);
        self.visit_node(&expr.index);
    }

    fn visit_soql(&mut self, _node: &NodeRef, query: &Soql) {
        walk_soql(self, query);
    }
}

// ============================================================================
// Walk functions
// ============================================================================

/// Dispatch `node` to the visitor method for its kind.
pub fn walk_node<V: Visitor>(v: &mut V, node: &NodeRef) {
    match &node.kind {
        NodeKind::Class(d) => v.visit_class(node, d),
        NodeKind::Interface(d) => v.visit_interface(node, d),
        NodeKind::Trigger(d) => v.visit_trigger(node, d),
        NodeKind::Method(d) => v.visit_method(node, d),
        NodeKind::Constructor(d) => v.visit_constructor(node, d),
        NodeKind::Field(d) => v.visit_field(node, d),
        NodeKind::VariableDeclarator(d) => v.visit_variable_declarator(node, d),
        NodeKind::Property(d) => v.visit_property(node, d),
        NodeKind::PropertyAccessor(a) => v.visit_property_accessor(node, a),
        NodeKind::Parameter(p) => v.visit_parameter(node, p),
        NodeKind::Block(b) => v.visit_block(node, b),
        NodeKind::LocalVariable(d) => v.visit_local_variable(node, d),
        NodeKind::ExpressionStatement(s) => v.visit_expression_statement(node, s),
        NodeKind::If(s) => v.visit_if(node, s),
        NodeKind::For(s) => v.visit_for(node, s),
        NodeKind::EnhancedFor(s) => v.visit_enhanced_for(node, s),
        NodeKind::While(s) => v.visit_while(node, s),
        NodeKind::DoWhile(s) => v.visit_do_while(node, s),
        NodeKind::Return(s) => v.visit_return(node, s),
        NodeKind::Break => v.visit_break(node),
        NodeKind::Continue => v.visit_continue(node),
        NodeKind::Throw(s) => v.visit_throw(node, s),
        NodeKind::Try(s) => v.visit_try(node, s),
        NodeKind::Catch(c) => v.visit_catch(node, c),
        NodeKind::Literal(l) => v.visit_literal(node, l),
        NodeKind::Name(n) => v.visit_name(node, n),
        NodeKind::FieldAccess(e) => v.visit_field_access(node, e),
        NodeKind::MethodInvocation(e) => v.visit_method_invocation(node, e),
        NodeKind::New(e) => v.visit_new(node, e),
        NodeKind::Cast(e) => v.visit_cast(node, e),
        NodeKind::InstanceOf(e) => v.visit_instance_of(node, e),
        NodeKind::Binary(e) => v.visit_binary(node, e),
        NodeKind::Unary(e) => v.visit_unary(node, e),
        NodeKind::Assignment(e) => v.visit_assignment(node, e),
        NodeKind::Ternary(e) => v.visit_ternary(node, e),
        NodeKind::This => v.visit_this(node),
        NodeKind::Super => v.visit_super(node),
        NodeKind::ArrayAccess(e) => v.visit_array_access(node, e),
        NodeKind::Soql(q) => v.visit_soql(node, q),
    }
}

fn walk_all<V: Visitor>(v: &mut V, nodes: &[NodeRef]) {
    for node in nodes {
        v.visit_node(node);
    }
}

pub fn walk_class<V: Visitor>(v: &mut V, decl: &ClassDeclaration) {
    walk_all(v, &decl.members);
}

pub fn walk_interface<V: Visitor>(v: &mut V, decl: &InterfaceDeclaration) {
    walk_all(v, &decl.members);
}

pub fn walk_trigger<V: Visitor>(v: &mut V, decl: &TriggerDeclaration) {
    v.visit_node(&decl.body);
}

pub fn walk_method<V: Visitor>(v: &mut V, decl: &MethodDeclaration) {
    walk_all(v, &decl.params);
    if let Some(body) = &decl.body {
        v.visit_node(body);
    }
}

pub fn walk_constructor<V: Visitor>(v: &mut V, decl: &ConstructorDeclaration) {
    walk_all(v, &decl.params);
    v.visit_node(&decl.body);
}

pub fn walk_field<V: Visitor>(v: &mut V, decl: &FieldDeclaration) {
    walk_all(v, &decl.declarators);
}

pub fn walk_variable_declarator<V: Visitor>(v: &mut V, decl: &VariableDeclarator) {
    if let Some(init) = &decl.init {
        v.visit_node(init);
    }
}

pub fn walk_property<V: Visitor>(v: &mut V, decl: &PropertyDeclaration) {
    if let Some(getter) = &decl.getter {
        v.visit_node(getter);
    }
    if let Some(setter) = &decl.setter {
        v.visit_node(setter);
    }
}

pub fn walk_property_accessor<V: Visitor>(v: &mut V, accessor: &PropertyAccessor) {
    if let Some(body) = &accessor.body {
        v.visit_node(body);
    }
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) {
    walk_all(v, &block.statements);
}

pub fn walk_local_variable<V: Visitor>(v: &mut V, decl: &LocalVariableDeclaration) {
    walk_all(v, &decl.declarators);
}

pub fn walk_if<V: Visitor>(v: &mut V, stmt: &If) {
    v.visit_node(&stmt.condition);
    v.visit_node(&stmt.then_branch);
    if let Some(else_branch) = &stmt.else_branch {
        v.visit_node(else_branch);
    }
}

pub fn walk_for<V: Visitor>(v: &mut V, stmt: &For) {
    walk_all(v, &stmt.init);
    if let Some(cond) = &stmt.condition {
        v.visit_node(cond);
    }
    walk_all(v, &stmt.update);
    v.visit_node(&stmt.body);
}

pub fn walk_enhanced_for<V: Visitor>(v: &mut V, stmt: &EnhancedFor) {
    v.visit_node(&stmt.iterable);
    v.visit_node(&stmt.body);
}

pub fn walk_try<V: Visitor>(v: &mut V, stmt: &Try) {
    v.visit_node(&stmt.block);
    walk_all(v, &stmt.catches);
    if let Some(finally) = &stmt.finally {
        v.visit_node(finally);
    }
}

pub fn walk_literal<V: Visitor>(_v: &mut V, _lit: &Literal) {
    // Leaf node, no children
}

pub fn walk_method_invocation<V: Visitor>(v: &mut V, expr: &MethodInvocation) {
    if let Some(receiver) = &expr.receiver {
        v.visit_node(receiver);
    }
    walk_all(v, &expr.args);
}

pub fn walk_new<V: Visitor>(v: &mut V, expr: &New) {
    walk_all(v, &expr.args);
    match &expr.init {
        Some(CollectionInit::Elements(items)) => walk_all(v, items),
        Some(CollectionInit::Pairs(pairs)) => {
            for (key, value) in pairs {
                v.visit_node(key);
                v.visit_node(value);
            }
        }
        None => {}
    }
}

pub fn walk_soql<V: Visitor>(v: &mut V, query: &Soql) {
    for bind in &query.binds {
        v.visit_node(&bind.expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::*;
    use crate::ops::BinaryOp;

    #[derive(Default)]
    struct KindRecorder(Vec<&'static str>);

    impl Visitor for KindRecorder {
        fn visit_node(&mut self, node: &NodeRef) {
            self.0.push(node.kind_name());
            walk_node(self, node);
        }
    }

    #[test]
    fn default_traversal_reaches_every_node() {
        let tree = if_(
            binary(BinaryOp::Less, name("i"), int(3)),
            block(vec![brk()]),
            Some(ret(None)),
        );
        let mut rec = KindRecorder::default();
        rec.visit_node(&tree);
        assert_eq!(
            rec.0,
            vec![
                "if statement",
                "binary operator",
                "name",
                "literal",
                "block",
                "break statement",
                "return statement",
            ]
        );
    }

    struct NoDescent(usize);

    impl Visitor for NoDescent {
        fn visit_block(&mut self, _node: &NodeRef, _block: &Block) {
            self.0 += 1;
        }
    }

    #[test]
    fn overriding_stops_descent() {
        let tree = block(vec![block(vec![expr_stmt(int(1))])]);
        let mut v = NoDescent(0);
        v.visit_node(&tree);
        assert_eq!(v.0, 1);
    }
}
