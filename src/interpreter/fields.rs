//! Variable chains, instance fields, static fields and properties.
//!
//! Static fields of a class are created the first time any of them is
//! touched: every slot starts as `null`, then the initializers run in
//! declaration order. A property whose accessor has a body runs it on every
//! read or write, except from inside that same accessor, which sees the
//! backing slot.

use tracing::debug;

use apex_compiler::{FieldStep, ResolvedVariable, VariableRoot};
use apex_core::{IdentMap, Location, ResolutionError, RuntimeError, TypeHash, Value};
use apex_registry::{Accessor, Field};

use super::{Eval, Frame, Interpreter, Unwind, coerce};

/// An assignable location.
#[derive(Debug, Clone)]
pub(crate) enum Place {
    Local(String),
    Static { owner: TypeHash, name: String },
    Field { object: Value, name: String },
    Index { collection: Value, index: Value },
}

/// Which accessor of a property is wanted.
#[derive(Clone, Copy)]
enum Access {
    Get,
    Set,
}

impl Interpreter<'_> {
    // ========================================================================
    // Chains
    // ========================================================================

    /// Value of a resolved variable chain.
    pub(crate) fn read_resolved(
        &mut self,
        resolved: &ResolvedVariable,
        at: &Location,
    ) -> Eval<Value> {
        let (mut value, steps) = self.chain_start(resolved, at)?;
        for step in steps {
            value = self.read_step(&value, step, at)?;
        }
        Ok(value)
    }

    /// The location a resolved chain names, for assignment.
    pub(crate) fn place_of(&mut self, resolved: &ResolvedVariable, at: &Location) -> Eval<Place> {
        match (&resolved.root, resolved.steps.split_last()) {
            (VariableRoot::Local(name), None) => Ok(Place::Local(name.clone())),
            (_, None) => Err(RuntimeError::InvalidAssignmentTarget {
                location: at.clone(),
            }
            .into()),
            (_, Some((last, _))) => {
                if last.is_static {
                    return Ok(Place::Static {
                        owner: last.owner,
                        name: last.name.clone(),
                    });
                }
                let (mut object, steps) = self.chain_start(resolved, at)?;
                for step in &steps[..steps.len().saturating_sub(1)] {
                    object = self.read_step(&object, step, at)?;
                }
                Ok(Place::Field {
                    object,
                    name: last.name.clone(),
                })
            }
        }
    }

    /// Value of the chain root and the steps still to walk.
    fn chain_start<'r>(
        &mut self,
        resolved: &'r ResolvedVariable,
        at: &Location,
    ) -> Eval<(Value, &'r [FieldStep])> {
        match &resolved.root {
            VariableRoot::Local(name) => {
                let value = self
                    .frame()
                    .env
                    .lookup(name)
                    .map(|slot| slot.value.clone())
                    .ok_or_else(|| ResolutionError::VariableNotFound {
                        name: name.clone(),
                        location: at.clone(),
                    })?;
                Ok((value, resolved.steps.as_slice()))
            }
            VariableRoot::This | VariableRoot::Super => {
                Ok((self.frame().this.clone(), resolved.steps.as_slice()))
            }
            VariableRoot::Class(_) => {
                let Some((first, rest)) = resolved.steps.split_first() else {
                    return Err(RuntimeError::Unsupported {
                        message: format!("type `{}` used as a value", resolved.ty),
                        location: at.clone(),
                    }
                    .into());
                };
                Ok((self.read_static(first.owner, &first.name, at)?, rest))
            }
        }
    }

    fn read_step(&mut self, target: &Value, step: &FieldStep, at: &Location) -> Eval<Value> {
        if step.is_static {
            self.read_static(step.owner, &step.name, at)
        } else {
            self.read_field(target, &step.name, at)
        }
    }

    pub(crate) fn read_place(&mut self, place: &Place, at: &Location) -> Eval<Value> {
        match place {
            Place::Local(name) => Ok(self
                .frame()
                .env
                .lookup(name)
                .map(|slot| slot.value.clone())
                .unwrap_or_default()),
            Place::Static { owner, name } => self.read_static(*owner, name, at),
            Place::Field { object, name } => self.read_field(object, name, at),
            Place::Index { collection, index } => self.index_get(collection, index, at),
        }
    }

    pub(crate) fn write_place(&mut self, place: &Place, value: Value, at: &Location) -> Eval<()> {
        match place {
            Place::Local(name) => {
                let Some(slot) = self.frame_mut().env.lookup_mut(name) else {
                    return Err(ResolutionError::VariableNotFound {
                        name: name.clone(),
                        location: at.clone(),
                    }
                    .into());
                };
                slot.value = coerce(&slot.ty, value);
                Ok(())
            }
            Place::Static { owner, name } => self.write_static(*owner, name, value, at),
            Place::Field { object, name } => self.write_field(object, name, value, at),
            Place::Index { collection, index } => {
                self.index_set(collection, index.clone(), value, at)
            }
        }
    }

    // ========================================================================
    // Instance fields
    // ========================================================================

    /// Field `name` of `object`, through its getter if it has a body.
    pub(crate) fn read_field(&mut self, object: &Value, name: &str, at: &Location) -> Eval<Value> {
        let store = self.store;
        let class = self.receiver_class(object, at)?;
        let Some(field) = store.find_field(class, name) else {
            return self.record_field(object, name, at);
        };
        if field.is_static() {
            return self.read_static(field.owner, name, at);
        }
        if let Some(body) = self.accessor_body(field, object, Access::Get, at)? {
            return self.run_accessor(field, object.clone(), body, None);
        }
        let Some(obj) = object.as_object() else {
            return Err(self.null_pointer());
        };
        Ok(obj.borrow().fields.get(name).cloned().unwrap_or_default())
    }

    /// Assign field `name` of `object`, through its setter if it has a body.
    pub(crate) fn write_field(
        &mut self,
        object: &Value,
        name: &str,
        value: Value,
        at: &Location,
    ) -> Eval<()> {
        let store = self.store;
        let class = self.receiver_class(object, at)?;
        let Some(field) = store.find_field(class, name) else {
            return Err(field_not_found(name, object, at));
        };
        if field.is_static() {
            return self.write_static(field.owner, name, value, at);
        }
        if let Some(body) = self.accessor_body(field, object, Access::Set, at)? {
            self.run_accessor(field, object.clone(), body, Some(value))?;
            return Ok(());
        }
        let value = coerce(&field.data_type(), value);
        if let Some(obj) = object.as_object() {
            obj.borrow_mut().fields.insert(field.name.as_str(), value);
        }
        Ok(())
    }

    fn receiver_class(&self, object: &Value, at: &Location) -> Eval<TypeHash> {
        match object {
            Value::Object(obj) => Ok(obj.borrow().class.base),
            Value::Null => Err(self.null_pointer()),
            other => Err(RuntimeError::TypeMismatch {
                expected: "an object".to_string(),
                actual: other.type_name(),
                location: at.clone(),
            }
            .into()),
        }
    }

    /// Records built by a query runner may carry fields the schema omits.
    fn record_field(&self, object: &Value, name: &str, at: &Location) -> Eval<Value> {
        object
            .as_object()
            .and_then(|obj| obj.borrow().fields.get(name).cloned())
            .ok_or_else(|| field_not_found(name, object, at))
    }

    // ========================================================================
    // Static fields
    // ========================================================================

    pub(crate) fn read_static(
        &mut self,
        owner: TypeHash,
        name: &str,
        at: &Location,
    ) -> Eval<Value> {
        self.ensure_statics(owner)?;
        let store = self.store;
        let field = store
            .class(owner)
            .and_then(|c| c.static_fields.get(name))
            .ok_or_else(|| static_not_found(store, owner, name, at))?;
        if let Some(body) = self.accessor_body(field, &Value::Null, Access::Get, at)? {
            return self.run_accessor(field, Value::Null, body, None);
        }
        Ok(self
            .state
            .statics
            .get(&owner)
            .and_then(|slots| slots.get(name))
            .cloned()
            .unwrap_or_default())
    }

    pub(crate) fn write_static(
        &mut self,
        owner: TypeHash,
        name: &str,
        value: Value,
        at: &Location,
    ) -> Eval<()> {
        self.ensure_statics(owner)?;
        let store = self.store;
        let field = store
            .class(owner)
            .and_then(|c| c.static_fields.get(name))
            .ok_or_else(|| static_not_found(store, owner, name, at))?;
        if let Some(body) = self.accessor_body(field, &Value::Null, Access::Set, at)? {
            self.run_accessor(field, Value::Null, body, Some(value))?;
            return Ok(());
        }
        let value = coerce(&field.data_type(), value);
        self.state
            .statics
            .entry(owner)
            .or_default()
            .insert(field.name.as_str(), value);
        Ok(())
    }

    /// Create the static slots of `class` and run their initializers, once.
    ///
    /// If an initializer fails the slots are dropped, so the class counts as
    /// uninitialized again.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn ensure_statics(&mut self, class: TypeHash) -> Eval<()> {
        if self.state.is_initialized(class) {
            return Ok(());
        }
        let store = self.store;
        let Some(declared) = store.class(class) else {
            return Ok(());
        };
        // Slots exist before any initializer runs, so initializers may read
        // each other and a re-entrant access does not initialize twice.
        let mut slots = IdentMap::new();
        for field in declared.static_fields.values() {
            slots.insert(field.name.as_str(), Value::Null);
        }
        self.state.statics.insert(class, slots);
        debug!(
            class = %declared.qualified_name,
            fields = declared.static_fields.len(),
            "initializing statics"
        );

        for field in declared.static_fields.values() {
            let Some(init) = &field.initializer else {
                continue;
            };
            let value = match self.eval_in(Frame::new(Some(class), true, Value::Null), init) {
                Ok(value) => coerce(&field.data_type(), value),
                Err(unwind) => {
                    // The next access starts over and raises again.
                    self.state.statics.remove(&class);
                    return Err(unwind);
                }
            };
            if let Some(slots) = self.state.statics.get_mut(&class) {
                slots.insert(field.name.as_str(), value);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// The accessor body to run for this access, if any.
    ///
    /// `None` means the backing slot is used directly: plain fields, `get;`
    /// and `set;` accessors, and accesses from inside the property's own
    /// accessor.
    fn accessor_body(
        &self,
        field: &Field,
        object: &Value,
        access: Access,
        at: &Location,
    ) -> Eval<Option<apex_ast::NodeRef>> {
        let Some(property) = &field.property else {
            return Ok(None);
        };
        if self.in_accessor_of(field, object) {
            return Ok(None);
        }
        let (accessor, kind) = match access {
            Access::Get => (&property.getter, "get"),
            Access::Set => (&property.setter, "set"),
        };
        match accessor {
            Some(Accessor::Body(body)) => Ok(Some(body.clone())),
            Some(Accessor::Auto) => Ok(None),
            None => Err(RuntimeError::Unsupported {
                message: format!("property `{}` has no {kind} accessor", field.name),
                location: at.clone(),
            }
            .into()),
        }
    }

    fn in_accessor_of(&self, field: &Field, object: &Value) -> bool {
        let frame = self.frame();
        frame.accessor.as_ref().is_some_and(|(owner, name)| {
            *owner == field.owner && name.eq_ignore_ascii_case(&field.name)
        }) && frame.this.same(object)
    }

    /// Run a property accessor; setters see the assigned value as `value`.
    fn run_accessor(
        &mut self,
        field: &Field,
        this: Value,
        body: apex_ast::NodeRef,
        value: Option<Value>,
    ) -> Eval<Value> {
        let mut frame = Frame::new(Some(field.owner), field.is_static(), this);
        frame.accessor = Some((field.owner, field.name.clone()));
        if let Some(value) = value {
            frame.define("value", field.data_type(), value);
        }
        let result = self.run_frame(frame, &body)?;
        Ok(coerce(&field.data_type(), result))
    }
}

fn field_not_found(name: &str, object: &Value, at: &Location) -> Unwind {
    ResolutionError::FieldNotFound {
        name: name.to_string(),
        owner: object.type_name(),
        location: at.clone(),
    }
    .into()
}

fn static_not_found(
    store: &apex_registry::NamespaceStore,
    owner: TypeHash,
    name: &str,
    at: &Location,
) -> Unwind {
    ResolutionError::FieldNotFound {
        name: name.to_string(),
        owner: store
            .class(owner)
            .map(|c| c.qualified_name.clone())
            .unwrap_or_else(|| owner.to_string()),
        location: at.clone(),
    }
    .into()
}
