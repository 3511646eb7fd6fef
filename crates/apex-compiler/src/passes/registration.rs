//! Registration Pass - index declarations into the namespace store.
//!
//! Turns each top-level class, interface or trigger declaration into store
//! entries. Members are partitioned by kind: methods are appended to
//! overload lists keyed by name, fields and properties are split into the
//! static and instance tables, constructors are collected, and nested type
//! declarations are registered recursively as inner classes.
//!
//! No types are resolved here. A class containing a member that is not a
//! field, property, method, constructor or nested type is rejected as a
//! whole with [`RegistrationError::MalformedMember`]; other classes are
//! still registered.

use std::rc::Rc;

use tracing::debug;

use apex_ast::{
    AccessorKind, ClassDeclaration, InterfaceDeclaration, MethodDeclaration, Node, NodeKind,
    NodeRef, PropertyDeclaration, TriggerDeclaration,
};
use apex_core::{DataType, Diagnostics, Modifiers, RegistrationError, TypeHash, TypeRef};
use apex_registry::{
    Accessor, ClassKind, ClassType, Field, Method, NamespaceStore, Parameter, Property, Trigger,
};

/// Output of the registration pass.
#[derive(Debug, Default)]
pub struct RegistrationOutput {
    /// Registered classes in declaration order, inner classes after their outer class.
    pub classes: Vec<TypeHash>,
    pub triggers: usize,
    pub diagnostics: Diagnostics,
}

/// Registers declarations into a [`NamespaceStore`].
pub struct RegistrationPass<'a> {
    store: &'a mut NamespaceStore,
    output: RegistrationOutput,
}

impl<'a> RegistrationPass<'a> {
    pub fn new(store: &'a mut NamespaceStore) -> Self {
        Self {
            store,
            output: RegistrationOutput::default(),
        }
    }

    /// Register every declaration, collecting failures.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, declarations: &[NodeRef]) -> RegistrationOutput {
        for decl in declarations {
            let result = match &decl.kind {
                NodeKind::Class(_) | NodeKind::Interface(_) => self.register_type(decl),
                NodeKind::Trigger(t) => self.register_trigger(decl, t),
                _ => Err(RegistrationError::UnexpectedDeclaration {
                    kind: decl.kind_name(),
                    location: decl.location.clone(),
                }),
            };
            if let Err(e) = result {
                self.output.diagnostics.push(e);
            }
        }
        self.output
    }

    fn register_type(&mut self, decl: &NodeRef) -> Result<(), RegistrationError> {
        let mut classes = Vec::new();
        build_type(decl, None, &mut classes)?;
        for class in classes {
            let hash = self.store.register_class(class)?;
            self.output.classes.push(hash);
        }
        Ok(())
    }

    fn register_trigger(
        &mut self,
        node: &NodeRef,
        decl: &TriggerDeclaration,
    ) -> Result<(), RegistrationError> {
        self.store.register_trigger(Trigger {
            name: decl.name.clone(),
            object: decl.object.clone(),
            events: decl.events.clone(),
            body: Rc::clone(&decl.body),
            location: node.location.clone(),
        })?;
        self.output.triggers += 1;
        Ok(())
    }
}

// ============================================================================
// Declaration to ClassType
// ============================================================================

/// Build `decl` and its nested types into `out`, outer class first.
fn build_type(
    decl: &NodeRef,
    outer: Option<&ClassType>,
    out: &mut Vec<ClassType>,
) -> Result<(), RegistrationError> {
    let (mut class, members) = match &decl.kind {
        NodeKind::Class(c) => {
            let mut class = new_class(&c.name, ClassKind::Class, outer);
            apply_class_header(&mut class, c);
            (class, &c.members)
        }
        NodeKind::Interface(i) => {
            let mut class = new_class(&i.name, ClassKind::Interface, outer);
            apply_interface_header(&mut class, i);
            (class, &i.members)
        }
        _ => {
            return Err(RegistrationError::UnexpectedDeclaration {
                kind: decl.kind_name(),
                location: decl.location.clone(),
            });
        }
    };
    class.declaration = Some(Rc::clone(decl));
    class.location = decl.location.clone();
    let kind = class.kind;

    let slot = out.len();
    out.push(class);
    let mut nested = Vec::new();
    for member in members {
        let class = &mut out[slot];
        match &member.kind {
            NodeKind::Class(_) | NodeKind::Interface(_) => nested.push(Rc::clone(member)),
            NodeKind::Field(field) => {
                for declarator in &field.declarators {
                    let Some(var) = declarator.as_declarator() else {
                        return Err(malformed(class, declarator));
                    };
                    let mut entry = Field::new(var.name.as_str(), field.type_ref.clone())
                        .with_modifiers(field.modifiers)
                        .with_annotations(field.annotations.clone())
                        .at(declarator.location.clone());
                    entry.initializer = var.init.clone();
                    add_field(class, entry)?;
                }
            }
            NodeKind::Property(prop) => {
                let entry = property_field(class, member, prop)?;
                add_field(class, entry)?;
            }
            NodeKind::Method(method) => {
                let entry = build_method(class, member, method)?;
                class.add_method(entry);
            }
            NodeKind::Constructor(ctor) if kind == ClassKind::Class => {
                let params = build_params(class, &ctor.params)?;
                let entry = Method::new(ctor.name.as_str(), TypeRef::resolved_to(DataType::void()))
                    .with_modifiers(ctor.modifiers)
                    .with_annotations(ctor.annotations.clone())
                    .with_params(params)
                    .with_body(Rc::clone(&ctor.body))
                    .at(member.location.clone());
                class.constructors.push(entry);
            }
            _ => return Err(malformed(class, member)),
        }
    }

    for inner in nested {
        let inner_slot = out.len();
        let outer = out[slot].clone();
        build_type(&inner, Some(&outer), out)?;
        let (inner_name, inner_hash) = (out[inner_slot].name.clone(), out[inner_slot].type_hash);
        out[slot].inner_classes.insert(inner_name, inner_hash);
    }
    debug!(class = %out[slot].qualified_name, "built class from declaration");
    Ok(())
}

fn new_class(name: &str, kind: ClassKind, outer: Option<&ClassType>) -> ClassType {
    match outer {
        Some(outer) => ClassType::nested(outer, name, kind),
        None => ClassType::new(name, kind),
    }
}

fn apply_class_header(class: &mut ClassType, decl: &ClassDeclaration) {
    class.modifiers = decl.modifiers;
    class.annotations = decl.annotations.clone();
    class.super_ref = decl.super_class.clone();
    class.interface_refs = decl.interfaces.clone();
}

fn apply_interface_header(class: &mut ClassType, decl: &InterfaceDeclaration) {
    class.modifiers = decl.modifiers;
    class.annotations = decl.annotations.clone();
    class.interface_refs = decl.extends.clone();
}

fn build_method(
    class: &ClassType,
    node: &NodeRef,
    decl: &MethodDeclaration,
) -> Result<Method, RegistrationError> {
    let mut modifiers = decl.modifiers;
    if class.is_interface() {
        modifiers |= Modifiers::PUBLIC | Modifiers::ABSTRACT;
    }
    let mut method = Method::new(decl.name.as_str(), decl.return_type.clone())
        .with_modifiers(modifiers)
        .with_annotations(decl.annotations.clone())
        .with_params(build_params(class, &decl.params)?)
        .at(node.location.clone());
    method.body = decl.body.clone();
    Ok(method)
}

fn build_params(
    class: &ClassType,
    params: &[NodeRef],
) -> Result<Vec<Parameter>, RegistrationError> {
    params
        .iter()
        .map(|node| {
            let p = node.as_parameter().ok_or_else(|| malformed(class, node))?;
            Ok(Parameter {
                name: p.name.clone(),
                modifiers: p.modifiers,
                type_ref: p.type_ref.clone(),
                location: node.location.clone(),
            })
        })
        .collect()
}

fn property_field(
    class: &ClassType,
    node: &NodeRef,
    decl: &PropertyDeclaration,
) -> Result<Field, RegistrationError> {
    let mut property = Property::default();
    for accessor_node in decl.getter.iter().chain(&decl.setter) {
        let accessor = accessor_node
            .as_accessor()
            .ok_or_else(|| malformed(class, accessor_node))?;
        let body = match &accessor.body {
            Some(body) => Accessor::Body(Rc::clone(body)),
            None => Accessor::Auto,
        };
        match accessor.kind {
            AccessorKind::Get => property.getter = Some(body),
            AccessorKind::Set => property.setter = Some(body),
        }
    }
    Ok(Field::new(decl.name.as_str(), decl.type_ref.clone())
        .with_modifiers(decl.modifiers)
        .with_annotations(decl.annotations.clone())
        .with_property(property)
        .at(node.location.clone()))
}

fn add_field(class: &mut ClassType, field: Field) -> Result<(), RegistrationError> {
    if class.field(&field.name).is_some() {
        return Err(RegistrationError::DuplicateField {
            name: field.name,
            class: class.qualified_name.clone(),
            location: field.location,
        });
    }
    class.add_field(field);
    Ok(())
}

fn malformed(class: &ClassType, node: &Node) -> RegistrationError {
    RegistrationError::MalformedMember {
        class: class.qualified_name.clone(),
        kind: node.kind_name(),
        location: node.location.clone(),
    }
}
