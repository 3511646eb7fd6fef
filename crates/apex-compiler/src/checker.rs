//! Structural class checks.
//!
//! Every rule runs on every class and all violations are collected:
//!
//! - parameter names are unique within one signature (case-sensitive)
//! - no two overloads of a name share a parameter-type tuple; return types
//!   do not disambiguate
//! - an `override` instance method has a same-signature instance method
//!   somewhere up the superclass chain
//! - an `override` static method has a superclass (nothing more is matched)
//! - an `override` field shadows an `abstract` or `virtual` superclass field
//! - a field without `override` does not reuse a superclass field name
//! - no class inherits from itself, directly or through interfaces

use apex_core::{CheckError, Diagnostics, TypeHash};
use apex_registry::{ClassType, Method, MethodKind, NamespaceStore};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};

/// Runs the structural rules against a fully resolved store.
pub struct ClassChecker<'a> {
    store: &'a NamespaceStore,
}

impl<'a> ClassChecker<'a> {
    pub fn new(store: &'a NamespaceStore) -> Self {
        Self { store }
    }

    /// Check one class, appending violations to `out`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_class(&self, class: &ClassType, out: &mut Diagnostics) {
        for method in class.all_methods() {
            check_parameters(method, out);
        }
        check_duplicates(class, out);
        self.check_method_overrides(class, out);
        self.check_fields(class, out);
    }

    fn check_method_overrides(&self, class: &ClassType, out: &mut Diagnostics) {
        let superclass = class.superclass();
        let overrides = class
            .instance_methods
            .values()
            .chain(class.static_methods.values())
            .flatten()
            .filter(|m| m.modifiers.is_override());
        for method in overrides {
            let found = match superclass {
                // Statics only need a superclass to exist.
                Some(_) if method.is_static() => true,
                Some(parent) => self.super_declares(parent, method),
                None => false,
            };
            if !found {
                out.push(CheckError::MissingSuperMethod {
                    name: method.name.clone(),
                    location: method.location.clone(),
                });
            }
        }
    }

    /// Whether `parent` or one of its superclasses has an instance method matching `method`.
    ///
    /// Visibility is not considered.
    fn super_declares(&self, parent: TypeHash, method: &Method) -> bool {
        self.store.super_chain(parent).into_iter().any(|owner| {
            self.store.class(owner).is_some_and(|c| {
                c.methods(&method.name, MethodKind::Instance)
                    .iter()
                    .any(|m| m.same_signature(method))
            })
        })
    }

    fn check_fields(&self, class: &ClassType, out: &mut Diagnostics) {
        let superclass = class.superclass();
        for field in class.all_fields() {
            let inherited = superclass.and_then(|s| self.store.find_field(s, &field.name));
            if field.modifiers.is_override() {
                match inherited {
                    None => out.push(CheckError::MissingSuperField {
                        name: field.name.clone(),
                        location: field.location.clone(),
                    }),
                    Some(parent) if !parent.modifiers.is_overridable() => {
                        out.push(CheckError::FieldNotOverridable {
                            name: field.name.clone(),
                            super_class: self.class_name(parent.owner),
                            location: field.location.clone(),
                        })
                    }
                    Some(_) => {}
                }
            } else if inherited.is_some() {
                out.push(CheckError::FieldHidden {
                    name: field.name.clone(),
                    class: class.name.clone(),
                    location: field.location.clone(),
                });
            }
        }
    }

    /// Every class on an inheritance cycle, in registration order.
    ///
    /// Edges run from a class to its superclass and to each interface.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn find_cycles(&self) -> Vec<CheckError> {
        let mut graph: DiGraph<TypeHash, ()> = DiGraph::new();
        let mut nodes: FxHashMap<TypeHash, NodeIndex> = FxHashMap::default();
        for class in self.store.classes() {
            nodes.insert(class.type_hash, graph.add_node(class.type_hash));
        }
        for class in self.store.classes() {
            let from = nodes[&class.type_hash];
            for parent in class.superclass().into_iter().chain(class.interfaces()) {
                if let Some(&to) = nodes.get(&parent) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut cyclic = FxHashSet::default();
        for component in tarjan_scc(&graph) {
            let self_loop = component.len() == 1 && graph.contains_edge(component[0], component[0]);
            if component.len() > 1 || self_loop {
                cyclic.extend(component.into_iter().map(|n| graph[n]));
            }
        }

        self.store
            .classes()
            .filter(|c| cyclic.contains(&c.type_hash))
            .map(|c| CheckError::CircularInheritance {
                class: c.qualified_name.clone(),
                location: c.location.clone(),
            })
            .collect()
    }

    fn class_name(&self, hash: TypeHash) -> String {
        self.store
            .class(hash)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| hash.to_string())
    }
}

fn check_parameters(method: &Method, out: &mut Diagnostics) {
    let mut seen = FxHashSet::default();
    for param in &method.params {
        if !seen.insert(param.name.as_str()) {
            out.push(CheckError::DuplicateParameter {
                name: param.name.clone(),
                location: param.location.clone(),
            });
        }
    }
}

/// Instance and static overloads share one name space; constructors have their own.
fn check_duplicates(class: &ClassType, out: &mut Diagnostics) {
    let mut groups: Vec<Vec<&Method>> = Vec::new();
    groups.push(class.constructors.iter().collect());
    for name in class.instance_methods.names().chain(class.static_methods.names()) {
        if groups.iter().skip(1).any(|g| g[0].name.eq_ignore_ascii_case(name)) {
            continue;
        }
        let group: Vec<&Method> = class
            .methods(name, MethodKind::Instance)
            .iter()
            .chain(class.methods(name, MethodKind::Static))
            .collect();
        if !group.is_empty() {
            groups.push(group);
        }
    }

    for group in groups {
        for (i, method) in group.iter().enumerate() {
            if group[..i].iter().any(|earlier| earlier.same_signature(method)) {
                out.push(CheckError::DuplicateMethod {
                    name: method.name.clone(),
                    location: method.location.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_core::{DataType, Location, Modifiers, TypeRef};
    use apex_registry::{ClassKind, Field, Parameter};
    use pretty_assertions::assert_eq;

    fn method(name: &str, modifiers: Modifiers, params: &[(&str, DataType)]) -> Method {
        Method::new(name, TypeRef::resolved_to(DataType::void()))
            .with_modifiers(modifiers)
            .with_params(
                params
                    .iter()
                    .map(|(n, t)| Parameter::typed(*n, t.clone()))
                    .collect(),
            )
            .at(Location::new("T.cls", 3, 1))
    }

    fn field(name: &str, modifiers: Modifiers) -> Field {
        Field::new(name, TypeRef::resolved_to(DataType::integer())).with_modifiers(modifiers)
    }

    fn check(classes: Vec<ClassType>, target: &str) -> Vec<String> {
        let mut store = NamespaceStore::new();
        for class in classes {
            store.register_class(class).unwrap();
        }
        let class = store.class(TypeHash::from_name(target)).unwrap();
        let mut out = Diagnostics::new();
        ClassChecker::new(&store).check_class(class, &mut out);
        out.iter().map(ToString::to_string).collect()
    }

    fn base() -> ClassType {
        ClassType::new("Base", ClassKind::Class)
            .with_modifiers(Modifiers::VIRTUAL)
            .with_method(method("run", Modifiers::VIRTUAL, &[("x", DataType::integer())]))
            .with_field(field("open", Modifiers::VIRTUAL))
            .with_field(field("closed", Modifiers::PUBLIC))
    }

    fn child() -> ClassType {
        ClassType::new("Child", ClassKind::Class).with_super(TypeRef::resolved_to(DataType::simple(
            TypeHash::from_name("base"),
            "Base",
        )))
    }

    #[test]
    fn distinct_overloads_pass() {
        let class = ClassType::new("A", ClassKind::Class)
            .with_method(method("f", Modifiers::PUBLIC, &[("x", DataType::integer())]))
            .with_method(method("f", Modifiers::PUBLIC, &[("x", DataType::string())]))
            .with_method(method("f", Modifiers::STATIC, &[]));
        assert!(check(vec![class], "a").is_empty());
    }

    #[test]
    fn return_type_does_not_disambiguate() {
        let mut other = method("F", Modifiers::STATIC, &[("y", DataType::integer())]);
        other.return_type = TypeRef::resolved_to(DataType::string());
        let class = ClassType::new("A", ClassKind::Class)
            .with_method(method("f", Modifiers::PUBLIC, &[("x", DataType::integer())]))
            .with_method(other);
        assert_eq!(
            check(vec![class], "a"),
            vec!["at T.cls:3:1: method `F` is duplicated"]
        );
    }

    #[test]
    fn duplicated_constructors_are_reported() {
        let ctor = method("A", Modifiers::PUBLIC, &[("x", DataType::integer())]);
        let class = ClassType::new("A", ClassKind::Class)
            .with_constructor(ctor.clone())
            .with_constructor(ctor);
        assert_eq!(check(vec![class], "a").len(), 1);
    }

    #[test]
    fn parameter_names_are_case_sensitive() {
        let class = ClassType::new("A", ClassKind::Class)
            .with_method(method(
                "f",
                Modifiers::PUBLIC,
                &[("x", DataType::integer()), ("x", DataType::string())],
            ))
            .with_method(method(
                "g",
                Modifiers::PUBLIC,
                &[("x", DataType::integer()), ("X", DataType::string())],
            ));
        assert_eq!(
            check(vec![class], "a"),
            vec!["at 0:0: parameter name is duplicated: `x`"]
        );
    }

    #[test]
    fn override_needs_a_matching_super_method() {
        let child = child()
            .with_method(method("run", Modifiers::OVERRIDE, &[("x", DataType::integer())]))
            .with_method(method("run", Modifiers::OVERRIDE, &[("x", DataType::string())]));
        assert_eq!(
            check(vec![base(), child], "child"),
            vec!["at T.cls:3:1: method `run` missing on super class"]
        );

        let orphan = ClassType::new("Orphan", ClassKind::Class)
            .with_method(method("run", Modifiers::OVERRIDE, &[]));
        assert_eq!(check(vec![orphan], "orphan").len(), 1);
    }

    #[test]
    fn static_override_only_needs_a_superclass() {
        let child = child().with_method(method(
            "anything",
            Modifiers::OVERRIDE | Modifiers::STATIC,
            &[],
        ));
        assert!(check(vec![base(), child], "child").is_empty());

        let orphan = ClassType::new("Orphan", ClassKind::Class).with_method(method(
            "anything",
            Modifiers::OVERRIDE | Modifiers::STATIC,
            &[],
        ));
        assert_eq!(check(vec![orphan], "orphan").len(), 1);
    }

    #[test]
    fn field_override_rules() {
        let child = child()
            .with_field(field("open", Modifiers::OVERRIDE))
            .with_field(field("closed", Modifiers::OVERRIDE))
            .with_field(field("missing", Modifiers::OVERRIDE));
        let errors = check(vec![base(), child], "child");
        assert_eq!(
            errors,
            vec![
                "at 0:0: field `closed` of `Base` is neither abstract nor virtual",
                "at 0:0: field `missing` missing on super class",
            ]
        );
    }

    #[test]
    fn hiding_a_field_requires_override() {
        let child = child().with_field(field("OPEN", Modifiers::PUBLIC));
        assert_eq!(
            check(vec![base(), child], "child"),
            vec!["at 0:0: field `OPEN` is not defined in `Child`"]
        );
    }

    #[test]
    fn cycles_are_found_through_superclasses_and_interfaces() {
        let a = ClassType::new("A", ClassKind::Class)
            .with_super(TypeRef::resolved_to(DataType::simple(TypeHash::from_name("b"), "B")));
        let b = ClassType::new("B", ClassKind::Class)
            .with_super(TypeRef::resolved_to(DataType::simple(TypeHash::from_name("a"), "A")));
        let looped = ClassType::new("I", ClassKind::Interface)
            .with_interface(TypeRef::resolved_to(DataType::simple(TypeHash::from_name("i"), "I")));
        let fine = ClassType::new("C", ClassKind::Class)
            .with_super(TypeRef::resolved_to(DataType::simple(TypeHash::from_name("a"), "A")));

        let mut store = NamespaceStore::new();
        for class in [a, b, looped, fine] {
            store.register_class(class).unwrap();
        }
        let cycles: Vec<String> = ClassChecker::new(&store)
            .find_cycles()
            .into_iter()
            .filter_map(|e| match e {
                CheckError::CircularInheritance { class, .. } => Some(class),
                _ => None,
            })
            .collect();
        assert_eq!(cycles, vec!["A", "B", "I"]);
    }
}
