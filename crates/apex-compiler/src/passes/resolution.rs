//! Resolution Pass - resolve every type mention.
//!
//! Runs once all classes are registered, so forward and mutually recursive
//! references resolve. For each declared class it resolves the header
//! (superclass, interfaces), member signatures (field, parameter and return
//! types) and every type mention inside bodies: local declarations, `new`,
//! casts, `instanceof`, enhanced-for variables, catch clauses and query
//! targets. Trigger targets and bodies are resolved with no enclosing class,
//! and schema object fields are resolved like any other field.
//!
//! Registry members hold their own copies of signature types; body nodes
//! are shared with the tree and resolved in place. A failure is recorded
//! and the pass moves on to the next mention.

use tracing::{debug, warn};

use apex_ast::visitor::{
    Visitor, walk_enhanced_for, walk_local_variable, walk_new, walk_soql,
};
use apex_ast::{Cast, Catch, EnhancedFor, InstanceOf, LocalVariableDeclaration, New, NodeRef, Soql};
use apex_core::{Diagnostics, Location, TypeRef};
use apex_registry::{Accessor, ClassKind, ClassType, NamespaceStore};

use crate::type_resolver::TypeResolver;

/// Output of the resolution pass.
#[derive(Debug, Default)]
pub struct ResolutionOutput {
    pub classes: usize,
    pub triggers: usize,
    pub diagnostics: Diagnostics,
}

/// Resolves type mentions of every declared class and trigger.
pub struct ResolutionPass<'a> {
    store: &'a NamespaceStore,
    output: ResolutionOutput,
}

impl<'a> ResolutionPass<'a> {
    pub fn new(store: &'a NamespaceStore) -> Self {
        Self {
            store,
            output: ResolutionOutput::default(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> ResolutionOutput {
        let store = self.store;
        // Schema objects carry field types as written in the metadata.
        let pending = store
            .classes()
            .filter(|c| c.declaration.is_some() || c.kind == ClassKind::SObject);
        for class in pending {
            self.resolve_class(class);
        }
        for trigger in store.triggers() {
            let types = TypeResolver::new(store);
            self.resolve(types, &trigger.object, &trigger.location);
            self.resolve_body(types, &trigger.body);
            self.output.triggers += 1;
        }
        self.output
    }

    fn resolve_class(&mut self, class: &ClassType) {
        let types = TypeResolver::new(self.store).within(Some(class.type_hash));
        let before = self.output.diagnostics.len();

        if let Some(super_ref) = &class.super_ref {
            self.resolve(types, super_ref, &class.location);
        }
        for interface in &class.interface_refs {
            self.resolve(types, interface, &class.location);
        }

        for field in class.all_fields() {
            self.resolve(types, &field.type_ref, &field.location);
            if let Some(init) = &field.initializer {
                self.resolve_body(types, init);
            }
            if let Some(property) = &field.property {
                for accessor in [&property.getter, &property.setter].into_iter().flatten() {
                    if let Accessor::Body(body) = accessor {
                        self.resolve_body(types, body);
                    }
                }
            }
        }

        for method in class.all_methods() {
            self.resolve(types, &method.return_type, &method.location);
            for param in &method.params {
                self.resolve(types, &param.type_ref, &param.location);
            }
            if let Some(body) = &method.body {
                self.resolve_body(types, body);
            }
        }

        self.output.classes += 1;
        debug!(
            class = %class.qualified_name,
            errors = self.output.diagnostics.len() - before,
            "resolved class"
        );
    }

    fn resolve(&mut self, types: TypeResolver<'_>, type_ref: &TypeRef, at: &Location) {
        if let Err(e) = types.resolve(type_ref, at) {
            warn!(error = %e, "type resolution failed");
            self.output.diagnostics.push(e);
        }
    }

    fn resolve_body(&mut self, types: TypeResolver<'_>, body: &NodeRef) {
        let mut visitor = BodyTypes {
            types,
            diagnostics: &mut self.output.diagnostics,
        };
        visitor.visit_node(body);
    }
}

/// Resolves the type mentions inside one body.
struct BodyTypes<'a, 'd> {
    types: TypeResolver<'a>,
    diagnostics: &'d mut Diagnostics,
}

impl BodyTypes<'_, '_> {
    fn resolve(&mut self, type_ref: &TypeRef, at: &Location) {
        if let Err(e) = self.types.resolve(type_ref, at) {
            warn!(error = %e, "type resolution failed");
            self.diagnostics.push(e);
        }
    }
}

impl Visitor for BodyTypes<'_, '_> {
    fn visit_local_variable(&mut self, node: &NodeRef, decl: &LocalVariableDeclaration) {
        self.resolve(&decl.type_ref, &node.location);
        walk_local_variable(self, decl);
    }

    fn visit_enhanced_for(&mut self, node: &NodeRef, stmt: &EnhancedFor) {
        self.resolve(&stmt.type_ref, &node.location);
        walk_enhanced_for(self, stmt);
    }

    fn visit_catch(&mut self, node: &NodeRef, clause: &Catch) {
        self.resolve(&clause.type_ref, &node.location);
        self.visit_node(&clause.block);
    }

    fn visit_new(&mut self, node: &NodeRef, expr: &New) {
        self.resolve(&expr.type_ref, &node.location);
        walk_new(self, expr);
    }

    fn visit_cast(&mut self, node: &NodeRef, expr: &Cast) {
        self.resolve(&expr.type_ref, &node.location);
        self.visit_node(&expr.expr);
    }

    fn visit_instance_of(&mut self, node: &NodeRef, expr: &InstanceOf) {
        self.resolve(&expr.type_ref, &node.location);
        self.visit_node(&expr.expr);
    }

    fn visit_soql(&mut self, node: &NodeRef, query: &Soql) {
        self.resolve(&query.object, &node.location);
        walk_soql(self, query);
    }
}
