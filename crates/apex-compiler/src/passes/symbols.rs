//! Symbol Pass - check that names in bodies refer to something.
//!
//! Walks every body with a lexical environment of declared local types
//! (parameters, locals, loop and catch variables, `value` in setters) and
//! resolves each bare name and each receiver-less call through
//! [`SymbolResolver`].
//!
//! Calls and `new` expressions are then checked against their overloads.
//! When every argument has a type evident from the tree (a literal, `null`,
//! `new`, a cast, or a declared variable) the full selection runs and
//! reports no match or an ambiguity. Otherwise only visibility and arity
//! are checked, and the interpreter selects from the runtime types.
//!
//! `this(...)` and `super(...)` constructor chaining calls are left to the
//! interpreter.

use tracing::{debug, warn};

use apex_ast::visitor::{Visitor, walk_block, walk_for, walk_method_invocation, walk_new};
use apex_ast::{
    Block, Catch, EnhancedFor, FieldAccess, For, Literal, LocalVariableDeclaration,
    MethodInvocation, Name, New, NodeKind, NodeRef,
};
use apex_core::{DataType, Diagnostics, Env, Location, ResolutionError, TypeHash, builtins};
use apex_registry::{Accessor, ClassType, Method, MethodKind, MethodRef, NamespaceStore};

use crate::resolver::SymbolResolver;
use crate::visibility::is_visible;

/// Output of the symbol pass.
#[derive(Debug, Default)]
pub struct SymbolOutput {
    pub bodies: usize,
    pub diagnostics: Diagnostics,
}

/// Checks names in every declared body.
pub struct SymbolPass<'a> {
    store: &'a NamespaceStore,
    output: SymbolOutput,
}

impl<'a> SymbolPass<'a> {
    pub fn new(store: &'a NamespaceStore) -> Self {
        Self {
            store,
            output: SymbolOutput::default(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> SymbolOutput {
        let store = self.store;
        for class in store.classes().filter(|c| c.declaration.is_some()) {
            self.check_class(class);
        }
        for trigger in store.triggers() {
            self.walk(None, true, Env::new(), &trigger.body);
        }
        self.output
    }

    fn check_class(&mut self, class: &ClassType) {
        let hash = Some(class.type_hash);
        let before = self.output.diagnostics.len();

        for field in class.all_fields() {
            if let Some(init) = &field.initializer {
                self.walk(hash, field.is_static(), Env::new(), init);
            }
            let Some(property) = &field.property else {
                continue;
            };
            if let Some(Accessor::Body(body)) = &property.getter {
                self.walk(hash, field.is_static(), Env::new(), body);
            }
            if let Some(Accessor::Body(body)) = &property.setter {
                let mut env = Env::new();
                env.define("value", field.data_type());
                self.walk(hash, field.is_static(), env, body);
            }
        }

        for method in class.all_methods() {
            if let Some(body) = &method.body {
                self.walk(hash, method.is_static(), parameter_env(method), body);
            }
        }

        debug!(
            class = %class.qualified_name,
            errors = self.output.diagnostics.len() - before,
            "checked symbols"
        );
    }

    fn walk(
        &mut self,
        class: Option<TypeHash>,
        is_static: bool,
        env: Env<DataType>,
        body: &NodeRef,
    ) {
        let mut symbols = BodySymbols {
            store: self.store,
            class,
            is_static,
            env,
            diagnostics: &mut self.output.diagnostics,
        };
        symbols.visit_node(body);
        self.output.bodies += 1;
    }
}

fn parameter_env(method: &Method) -> Env<DataType> {
    let mut env = Env::new();
    for param in &method.params {
        env.define(param.name.as_str(), param.data_type());
    }
    env
}

/// Walks one body, tracking the declared types of locals.
struct BodySymbols<'a, 'd> {
    store: &'a NamespaceStore,
    class: Option<TypeHash>,
    is_static: bool,
    env: Env<DataType>,
    diagnostics: &'d mut Diagnostics,
}

impl BodySymbols<'_, '_> {
    fn resolver(&self) -> SymbolResolver<'_> {
        SymbolResolver::new(self.store, &self.env).in_class(self.class, self.is_static)
    }

    fn report(&mut self, result: Result<(), ResolutionError>) {
        if let Err(e) = result {
            warn!(error = %e, "symbol resolution failed");
            self.diagnostics.push(e);
        }
    }

    fn check_variable(&mut self, names: &[String], location: &Location) {
        let result = self.resolver().resolve_variable(names, location).map(|_| ());
        self.report(result);
    }

    /// Type of `expr` known without evaluating it.
    fn static_type(&self, expr: &NodeRef) -> Option<DataType> {
        match &expr.kind {
            NodeKind::Literal(literal) => Some(match literal {
                Literal::Integer(_) => DataType::integer(),
                Literal::Double(_) => DataType::double(),
                Literal::String(_) => DataType::string(),
                Literal::Boolean(_) => DataType::boolean(),
                Literal::Null => DataType::null(),
            }),
            NodeKind::New(new) => new.type_ref.resolved().cloned(),
            NodeKind::Cast(cast) => cast.type_ref.resolved().cloned(),
            NodeKind::Name(name) => self.variable_type(&name.names, &expr.location),
            NodeKind::FieldAccess(access) => {
                let NodeKind::Name(receiver) = &access.receiver.kind else {
                    return None;
                };
                let mut names = receiver.names.clone();
                names.push(access.name.clone());
                self.variable_type(&names, &expr.location)
            }
            _ => None,
        }
    }

    fn variable_type(&self, names: &[String], location: &Location) -> Option<DataType> {
        let resolved = self.resolver().resolve_variable(names, location).ok()?;
        (!resolved.is_class()).then_some(resolved.ty)
    }

    /// Check a call with `args` against `candidates`.
    fn check_overloads(
        &self,
        candidates: &[MethodRef],
        args: &[NodeRef],
        name: &str,
        location: &Location,
    ) -> Result<(), ResolutionError> {
        let known: Option<Vec<DataType>> = args.iter().map(|a| self.static_type(a)).collect();
        if let Some(arg_types) = known {
            return self
                .resolver()
                .select(candidates, &arg_types, name, location)
                .map(|_| ());
        }

        let visible: Vec<&Method> = candidates
            .iter()
            .filter_map(|r| self.store.method(r))
            .filter(|m| is_visible(self.store, m.modifiers, m.owner, self.class))
            .collect();
        if visible.is_empty() {
            return Err(ResolutionError::NotVisible {
                name: name.to_string(),
                location: location.clone(),
            });
        }
        if visible.iter().any(|m| m.arity() == args.len()) {
            return Ok(());
        }
        let shown: Vec<String> = args
            .iter()
            .map(|a| self.static_type(a).map_or_else(|| "?".to_string(), |t| t.to_string()))
            .collect();
        Err(ResolutionError::NoMatchingOverload {
            name: name.to_string(),
            args: shown.join(", "),
            location: location.clone(),
        })
    }

    /// Check `new class(args)`.
    ///
    /// A class without constructors takes no arguments, except that an
    /// exception subclass passes them to its parent's constructors.
    fn check_construction(
        &self,
        class: TypeHash,
        args: &[NodeRef],
        location: &Location,
    ) -> Result<(), ResolutionError> {
        let mut current = class;
        loop {
            let Some(declared) = self.store.class(current) else {
                return Ok(());
            };
            if current == class && declared.is_abstract() {
                return Ok(());
            }
            let candidates = self.store.method_candidates(current, "", MethodKind::Constructor);
            if !candidates.is_empty() {
                return self.check_overloads(&candidates, args, &declared.name, location);
            }
            if args.is_empty() {
                return Ok(());
            }
            match declared.superclass() {
                Some(parent) if self.store.is_subclass_of(current, builtins::EXCEPTION) => {
                    current = parent;
                }
                _ => {
                    let shown: Vec<String> = args
                        .iter()
                        .map(|a| {
                            self.static_type(a)
                                .map_or_else(|| "?".to_string(), |t| t.to_string())
                        })
                        .collect();
                    return Err(ResolutionError::NoMatchingOverload {
                        name: declared.qualified_name.clone(),
                        args: shown.join(", "),
                        location: location.clone(),
                    });
                }
            }
        }
    }

    fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        self.env.push_scope();
        f(self);
        self.env.pop_scope();
    }
}

impl Visitor for BodySymbols<'_, '_> {
    fn visit_block(&mut self, _node: &NodeRef, block: &Block) {
        self.scoped(|s| walk_block(s, block));
    }

    fn visit_local_variable(&mut self, _node: &NodeRef, decl: &LocalVariableDeclaration) {
        let ty = decl.type_ref.resolved().cloned().unwrap_or_else(DataType::object);
        for declarator in &decl.declarators {
            let Some(var) = declarator.as_declarator() else {
                continue;
            };
            // The initializer cannot see the variable it initializes.
            if let Some(init) = &var.init {
                self.visit_node(init);
            }
            self.env.define(var.name.as_str(), ty.clone());
        }
    }

    fn visit_for(&mut self, _node: &NodeRef, stmt: &For) {
        self.scoped(|s| walk_for(s, stmt));
    }

    fn visit_enhanced_for(&mut self, _node: &NodeRef, stmt: &EnhancedFor) {
        self.visit_node(&stmt.iterable);
        let ty = stmt.type_ref.resolved().cloned().unwrap_or_else(DataType::object);
        self.scoped(|s| {
            s.env.define(stmt.name.as_str(), ty);
            s.visit_node(&stmt.body);
        });
    }

    fn visit_catch(&mut self, _node: &NodeRef, clause: &Catch) {
        let ty = clause.type_ref.resolved().cloned().unwrap_or_else(DataType::object);
        self.scoped(|s| {
            s.env.define(clause.name.as_str(), ty);
            s.visit_node(&clause.block);
        });
    }

    fn visit_name(&mut self, node: &NodeRef, name: &Name) {
        self.check_variable(&name.names, &node.location);
    }

    fn visit_field_access(&mut self, node: &NodeRef, expr: &FieldAccess) {
        // `a.b` written as an access on a bare name is one chain.
        if let NodeKind::Name(receiver) = &expr.receiver.kind {
            let mut names = receiver.names.clone();
            names.push(expr.name.clone());
            self.check_variable(&names, &node.location);
        } else {
            self.visit_node(&expr.receiver);
        }
    }

    fn visit_method_invocation(&mut self, node: &NodeRef, expr: &MethodInvocation) {
        let chaining = expr.names.len() == 1
            && (expr.names[0].eq_ignore_ascii_case("this")
                || expr.names[0].eq_ignore_ascii_case("super"));
        if expr.receiver.is_none() && !chaining {
            let result = self
                .resolver()
                .resolve_call(&expr.names, &node.location)
                .and_then(|call| {
                    self.check_overloads(&call.candidates, &expr.args, &call.name, &node.location)
                });
            self.report(result);
        }
        walk_method_invocation(self, expr);
    }

    fn visit_new(&mut self, node: &NodeRef, expr: &New) {
        if let Some(ty) = expr.type_ref.resolved() {
            let result = self.check_construction(ty.base, &expr.args, &node.location);
            self.report(result);
        }
        walk_new(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{RegistrationPass, ResolutionPass};
    use apex_ast::build::*;
    use apex_ast::{TriggerEvent, TriggerOperation, TriggerTiming};
    use apex_core::Modifiers;
    use apex_registry::ClassKind;
    use pretty_assertions::assert_eq;

    fn run(decls: &[NodeRef]) -> Vec<String> {
        let mut store = NamespaceStore::new();
        for name in ["String", "Integer", "Exception"] {
            store
                .register_class(ClassType::in_namespace("System", name, ClassKind::Class))
                .unwrap();
        }
        let system = ClassType::in_namespace("System", "System", ClassKind::Class).with_method(
            Method::new("debug", apex_core::TypeRef::resolved_to(DataType::void()))
                .with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
                .with_params(vec![apex_registry::Parameter::typed("o", DataType::object())]),
        );
        store.register_class(system).unwrap();
        let registered = RegistrationPass::new(&mut store).run(decls);
        assert!(registered.diagnostics.is_empty(), "{}", registered.diagnostics);
        let resolved = ResolutionPass::new(&store).run();
        assert!(resolved.diagnostics.is_empty(), "{}", resolved.diagnostics);
        SymbolPass::new(&store)
            .run()
            .diagnostics
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn locals_params_and_fields_resolve() {
        let class = ClassBuilder::new("Counter")
            .field(Modifiers::PRIVATE, "Integer", "count", Some(int(0)))
            .method(MethodBuilder::new("add").param("Integer", "n").body(vec![
                local(
                    "Integer",
                    "total",
                    Some(binary(apex_ast::BinaryOp::Add, name("count"), name("n"))),
                ),
                expr_stmt(assign(name("count"), name("total"))),
                for_each(
                    "String",
                    "s",
                    name("items"),
                    block(vec![expr_stmt(call("System.debug", vec![name("s")]))]),
                ),
            ]))
            .field(Modifiers::PRIVATE, "List<String>", "items", None)
            .build();
        assert_eq!(run(&[class]), Vec::<String>::new());
    }

    #[test]
    fn unknown_names_are_reported_with_their_location() {
        let class = ClassBuilder::new("A")
            .method(
                MethodBuilder::new("run")
                    .at(Location::new("A.cls", 4, 2))
                    .body(vec![expr_stmt(name("ghost"))]),
            )
            .build();
        let errors = run(&[class]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].ends_with("`ghost` is not found in this scope"), "{}", errors[0]);
    }

    #[test]
    fn block_scopes_end_with_the_block() {
        let class = ClassBuilder::new("A")
            .method(MethodBuilder::new("run").body(vec![
                if_(boolean(true), block(vec![local("Integer", "x", Some(int(1)))]), None),
                expr_stmt(name("x")),
            ]))
            .build();
        assert_eq!(run(&[class]).len(), 1);
    }

    #[test]
    fn static_methods_cannot_reach_instance_members() {
        let class = ClassBuilder::new("A")
            .field(Modifiers::PUBLIC, "Integer", "n", None)
            .method(MethodBuilder::new("inst"))
            .method(static_method(
                "run",
                "void",
                vec![expr_stmt(name("n")), expr_stmt(call("inst", vec![]))],
            ))
            .build();
        let errors = run(&[class]);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.contains("static context")), "{errors:?}");
    }

    #[test]
    fn unknown_methods_are_reported_but_chaining_is_not() {
        let class = ClassBuilder::new("A")
            .constructor(MethodBuilder::new("A").body(vec![expr_stmt(call("this", vec![int(1)]))]))
            .constructor(MethodBuilder::new("A").param("Integer", "n"))
            .method(MethodBuilder::new("run").body(vec![expr_stmt(call("System.nope", vec![]))]))
            .build();
        let errors = run(&[class]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("method `nope` is not found"), "{}", errors[0]);
    }

    #[test]
    fn setters_bind_value_and_catch_binds_its_variable() {
        let class = ClassBuilder::new("A")
            .property(
                Modifiers::PUBLIC,
                "Integer",
                "size",
                apex_ast::build::Accessor::Auto,
                apex_ast::build::Accessor::Body(vec![expr_stmt(call(
                    "System.debug",
                    vec![name("value")],
                ))]),
            )
            .method(MethodBuilder::new("run").body(vec![try_(
                block(vec![]),
                vec![catch("Exception", "e", block(vec![expr_stmt(name("e"))]))],
                None,
            )]))
            .build();
        assert_eq!(run(&[class]), Vec::<String>::new());
    }

    #[test]
    fn trigger_bodies_have_no_receiver() {
        let account = ClassBuilder::new("Account").build();
        let t = trigger(
            "T",
            "Account",
            vec![TriggerEvent::new(TriggerTiming::After, TriggerOperation::Update)],
            vec![expr_stmt(this())],
        );
        assert_eq!(run(&[account, t]), Vec::<String>::new());

        let t = trigger(
            "U",
            "Account",
            vec![TriggerEvent::new(TriggerTiming::After, TriggerOperation::Update)],
            vec![expr_stmt(name("this.x"))],
        );
        assert_eq!(run(&[ClassBuilder::new("Account").build(), t]).len(), 1);
    }

    fn pair(first: &str, second: &str) -> NodeRef {
        ClassBuilder::new("Pair")
            .method(static_method("f", "void", vec![]).param(first, "a"))
            .method(static_method("f", "void", vec![]).param(second, "b"))
            .method(static_method("one", "Integer", vec![ret(Some(int(1)))]).param("Integer", "x"))
            .build()
    }

    #[test]
    fn wrong_arity_is_reported_at_the_call() {
        let main = ClassBuilder::new("Main")
            .method(static_method(
                "run",
                "void",
                vec![
                    expr_stmt(call("Pair.one", vec![int(1), int(2)])),
                    local("Integer", "n", Some(int(3))),
                    expr_stmt(call(
                        "Pair.one",
                        vec![binary(apex_ast::BinaryOp::Add, name("n"), int(1)), name("n")],
                    )),
                ],
            ))
            .build();
        let errors = run(&[pair("String", "Integer"), main]);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(
            errors[0].contains("no overload of `one` accepts (Integer, Integer)"),
            "{}",
            errors[0]
        );
        assert!(errors[1].contains("accepts (?, Integer)"), "{}", errors[1]);
    }

    #[test]
    fn null_argument_between_two_overloads_is_ambiguous() {
        let main = ClassBuilder::new("Main")
            .method(static_method(
                "run",
                "void",
                vec![
                    expr_stmt(call("Pair.f", vec![null()])),
                    expr_stmt(call("Pair.f", vec![int(4)])),
                ],
            ))
            .build();
        let errors = run(&[pair("String", "Integer"), main]);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].contains("is ambiguous between 2 overloads"), "{}", errors[0]);
    }

    #[test]
    fn declared_types_feed_overload_selection() {
        let main = ClassBuilder::new("Main")
            .method(
                static_method("run", "void", vec![expr_stmt(call("Pair.f", vec![name("s")]))])
                    .param("String", "s"),
            )
            .build();
        assert_eq!(run(&[pair("String", "Integer"), main]), Vec::<String>::new());
    }

    #[test]
    fn constructor_arguments_are_checked() {
        let point = ClassBuilder::new("Point")
            .constructor(
                MethodBuilder::new("Point")
                    .modifiers(Modifiers::PUBLIC)
                    .param("Integer", "x"),
            )
            .build();
        let plain = ClassBuilder::new("Plain").build();
        let main = ClassBuilder::new("Main")
            .method(static_method(
                "run",
                "void",
                vec![
                    expr_stmt(new_object("Point", vec![int(1)])),
                    expr_stmt(new_object("Point", vec![])),
                    expr_stmt(new_object("Plain", vec![int(1)])),
                ],
            ))
            .build();
        let errors = run(&[point, plain, main]);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("no overload of `Point` accepts ()"), "{}", errors[0]);
        assert!(errors[1].contains("no overload of `Plain` accepts (Integer)"), "{}", errors[1]);
    }
}
