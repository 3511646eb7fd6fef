//! Method invocation, native calls and object construction.
//!
//! ## Call resolution
//!
//! A receiver-less chain such as `a.b.m(x)` is resolved by the compiler's
//! [`SymbolResolver`](apex_compiler::SymbolResolver); a call on an
//! arbitrary expression looks the method up on the receiver's runtime
//! class. Either way the overload is selected from the runtime types of the
//! evaluated arguments, then dispatched on the receiver's runtime class.
//! `super.m()` and static calls are not dispatched.
//!
//! ## Construction
//!
//! ```text
//! new C(args)
//!   ├─ every instance field of C and its superclasses starts as null
//!   └─ construct(C, args)
//!        ├─ this(...) first  → construct(C, ...), then the rest of the body
//!        └─ otherwise        → construct(super, super-args or none),
//!                              C's field initializers, the rest of the body
//! ```

use tracing::trace;

use apex_ast::{CollectionInit, MethodInvocation, New, NodeKind, NodeRef};
use apex_compiler::CallReceiver;
use apex_core::{
    CallContext, DataType, Location, NativeError, NativeFn, ResolutionError, RuntimeError,
    TypeHash, Value, builtins,
};
use apex_registry::{Method, MethodKind, MethodRef};

use super::{ControlFlow, Eval, Frame, Interpreter, Unwind, coerce, escape};

impl Interpreter<'_> {
    // ========================================================================
    // Calls
    // ========================================================================

    pub(crate) fn eval_call(&mut self, call: &MethodInvocation, at: &Location) -> Eval<Value> {
        if call.receiver.is_none() && chaining_kind(call).is_some() {
            return Err(RuntimeError::Unsupported {
                message: format!(
                    "`{}(...)` must be the first statement of a constructor",
                    call.method_name()
                ),
                location: at.clone(),
            }
            .into());
        }

        if let Some(receiver) = &call.receiver {
            let mut target = self.eval(receiver)?;
            let Some((method, path)) = call.names.split_last() else {
                return Err(method_not_found("", &target, at));
            };
            for field in path {
                target = self.read_field(&target, field, at)?;
            }
            let args = self.eval_args(&call.args)?;
            return self.call_on_value(&target, method, args, at);
        }

        let resolved = self.resolver().resolve_call(&call.names, at)?;
        if let CallReceiver::Value(chain) = &resolved.receiver {
            let target = self.read_resolved(chain, at)?;
            let args = self.eval_args(&call.args)?;
            return self.call_on_value(&target, &resolved.name, args, at);
        }

        let args = self.eval_args(&call.args)?;
        let arg_types = types_of(&args);
        let selected = self
            .resolver()
            .select(&resolved.candidates, &arg_types, &resolved.name, at)?
            .method;
        match resolved.receiver {
            CallReceiver::This if selected.kind == MethodKind::Instance => {
                let this = self.frame().this.clone();
                let target = self.store.dispatch(this.data_type().base, &selected);
                self.invoke(&target, this, args, at)
            }
            CallReceiver::Super => {
                let this = self.frame().this.clone();
                self.invoke(&selected, this, args, at)
            }
            _ => self.invoke(&selected, Value::Null, args, at),
        }
    }

    /// Call instance method `name` on `target`, dispatching on its runtime class.
    pub(crate) fn call_on_value(
        &mut self,
        target: &Value,
        name: &str,
        args: Vec<Value>,
        at: &Location,
    ) -> Eval<Value> {
        if target.is_null() {
            return Err(self.null_pointer());
        }
        let store = self.store;
        let runtime = target.data_type();
        let candidates = store.method_candidates(runtime.base, name, MethodKind::Instance);
        if candidates.is_empty() {
            return Err(method_not_found(name, target, at));
        }
        let selected = self
            .resolver()
            .select(&candidates, &types_of(&args), name, at)?
            .method;
        let dispatched = store.dispatch(runtime.base, &selected);
        self.invoke(&dispatched, target.clone(), args, at)
    }

    fn eval_args(&mut self, args: &[NodeRef]) -> Eval<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    /// Run the method at `target` with `this` bound.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn invoke(
        &mut self,
        target: &MethodRef,
        this: Value,
        args: Vec<Value>,
        at: &Location,
    ) -> Eval<Value> {
        let store = self.store;
        let Some(method) = store.method(target) else {
            return Err(method_not_found(&target.name, &this, at));
        };
        trace!(method = %self.label(method), args = args.len(), "invoking");

        if let Some(native) = &method.native {
            return self.call_native(method, native, &this, &args);
        }
        let Some(body) = &method.body else {
            return Err(RuntimeError::MissingBody {
                method: self.label(method),
            }
            .into());
        };
        let mut frame = Frame::new(Some(method.owner), method.is_static(), this);
        for (param, arg) in method.params.iter().zip(args) {
            frame.define(&param.name, param.data_type(), arg);
        }
        let result = self.run_frame(frame, body)?;
        Ok(coerce(&method.return_data_type(), result))
    }

    /// Call a native closure. A raised native exception becomes a catchable
    /// exception of the same class; any other native failure is fatal.
    fn call_native(
        &mut self,
        method: &Method,
        native: &NativeFn,
        this: &Value,
        args: &[Value],
    ) -> Eval<Value> {
        let store = self.store;
        let render = |value: &Value| crate::inspect::inspect(store, value);
        let mut ctx = CallContext::new(this, args, &mut self.state.shared, &render);
        match native.call(&mut ctx) {
            Ok(value) => Ok(value),
            Err(NativeError::Exception { class, message, .. }) => Err(self.raise(class, message)),
            Err(source) => Err(RuntimeError::Native {
                method: self.label(method),
                source,
            }
            .into()),
        }
    }

    /// `Class.method` for diagnostics.
    fn label(&self, method: &Method) -> String {
        let class = self
            .store
            .class(method.owner)
            .map(|c| c.qualified_name.as_str())
            .unwrap_or("?");
        format!("{class}.{}", method.name)
    }

    // ========================================================================
    // Construction
    // ========================================================================

    pub(crate) fn eval_new(&mut self, expr: &New, at: &Location) -> Eval<Value> {
        let ty = self.resolve_type(&expr.type_ref, at)?;
        let store = self.store;
        let Some(class) = store.class(ty.base) else {
            return Err(ResolutionError::TypeNotFound {
                name: ty.to_string(),
                location: at.clone(),
            }
            .into());
        };
        if class.is_abstract() {
            return Err(RuntimeError::AbstractInstantiation {
                class: class.qualified_name.clone(),
                location: at.clone(),
            }
            .into());
        }

        let args = self.eval_args(&expr.args)?;
        let object = self.allocate(ty);
        self.construct(class.type_hash, &object, args, at)?;

        match &expr.init {
            Some(CollectionInit::Elements(elements)) => {
                for element in elements {
                    let value = self.eval(element)?;
                    self.call_on_value(&object, "add", vec![value], at)?;
                }
            }
            Some(CollectionInit::Pairs(pairs)) => {
                for (key, value) in pairs {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    self.call_on_value(&object, "put", vec![key, value], at)?;
                }
            }
            None => {}
        }
        Ok(object)
    }

    /// A new instance of `ty` with every declared instance field set to null,
    /// superclass fields first.
    fn allocate(&self, ty: DataType) -> Value {
        let chain = self.store.super_chain(ty.base);
        let object = Value::new_object(ty);
        if let Some(obj) = object.as_object() {
            let mut obj = obj.borrow_mut();
            for class in chain.iter().rev().filter_map(|h| self.store.class(*h)) {
                for field in class.instance_fields.values() {
                    obj.fields.insert(field.name.as_str(), Value::Null);
                }
            }
        }
        object
    }

    /// Run the constructor of `class` that fits `args` on `object`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn construct(
        &mut self,
        class: TypeHash,
        object: &Value,
        args: Vec<Value>,
        at: &Location,
    ) -> Eval<()> {
        let store = self.store;
        let Some(declared) = store.class(class) else {
            return Ok(());
        };

        if declared.constructors.is_empty() {
            let parent = declared.superclass();
            // Exception subclasses keep the message constructors of their parent.
            let inherits_message =
                !args.is_empty() && store.is_subclass_of(class, builtins::EXCEPTION);
            if !args.is_empty() && !inherits_message {
                self.resolver()
                    .resolve_constructor(class, &types_of(&args), at)?;
            }
            if let Some(parent) = parent {
                let parent_args = if inherits_message { args } else { Vec::new() };
                self.construct(parent, object, parent_args, at)?;
            }
            return self.initialize_fields(class, object);
        }

        let candidates = store.method_candidates(class, "", MethodKind::Constructor);
        let selected = self
            .resolver()
            .select(&candidates, &types_of(&args), &declared.name, at)?
            .method;
        let Some(method) = store.method(&selected) else {
            return Ok(());
        };
        trace!(constructor = %self.label(method), args = args.len(), "constructing");

        if let Some(native) = &method.native {
            self.call_native(method, native, object, &args)?;
            return Ok(());
        }
        let Some(body) = &method.body else {
            return Err(RuntimeError::MissingBody {
                method: self.label(method),
            }
            .into());
        };

        let mut frame = Frame::new(Some(class), false, object.clone());
        for (param, arg) in method.params.iter().zip(args) {
            frame.define(&param.name, param.data_type(), arg);
        }
        self.enter()?;
        self.frames.push(frame);
        let result = self.constructor_body(class, body, object, at);
        self.frames.pop();
        self.leave();
        result
    }

    /// Chain to `this(...)` or the superclass, initialize fields, then run
    /// the remaining statements.
    fn constructor_body(
        &mut self,
        class: TypeHash,
        body: &NodeRef,
        object: &Value,
        at: &Location,
    ) -> Eval<()> {
        let statements = match &body.kind {
            NodeKind::Block(block) => block.statements.as_slice(),
            _ => std::slice::from_ref(body),
        };
        let chained = statements.first().and_then(chaining_call);
        let rest = if chained.is_some() {
            &statements[1..]
        } else {
            statements
        };

        match chained {
            Some((Chain::This, call)) => {
                let args = self.eval_args(&call.args)?;
                self.construct(class, object, args, &call_location(statements, at))?;
            }
            Some((Chain::Super, call)) => {
                let args = self.eval_args(&call.args)?;
                if let Some(parent) = self.store.superclass(class) {
                    self.construct(parent, object, args, &call_location(statements, at))?;
                }
                self.initialize_fields(class, object)?;
            }
            None => {
                if let Some(parent) = self.store.superclass(class) {
                    self.construct(parent, object, Vec::new(), at)?;
                }
                self.initialize_fields(class, object)?;
            }
        }

        for statement in rest {
            match self.exec(statement)? {
                ControlFlow::Normal => {}
                ControlFlow::Return(_) => break,
                ControlFlow::Raise(exception) => return Err(Unwind::Raise(exception)),
                ControlFlow::Break => return Err(escape("break", statement)),
                ControlFlow::Continue => return Err(escape("continue", statement)),
            }
        }
        Ok(())
    }

    /// Run the instance field initializers `class` declares, in order.
    fn initialize_fields(&mut self, class: TypeHash, object: &Value) -> Eval<()> {
        let store = self.store;
        let Some(declared) = store.class(class) else {
            return Ok(());
        };
        for field in declared.instance_fields.values() {
            let Some(init) = &field.initializer else {
                continue;
            };
            let value = self.eval_in(Frame::new(Some(class), false, object.clone()), init)?;
            let value = coerce(&field.data_type(), value);
            if let Some(obj) = object.as_object() {
                obj.borrow_mut().fields.insert(field.name.as_str(), value);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Chain {
    This,
    Super,
}

fn chaining_kind(call: &MethodInvocation) -> Option<Chain> {
    match call.names.as_slice() {
        [name] if name.eq_ignore_ascii_case("this") => Some(Chain::This),
        [name] if name.eq_ignore_ascii_case("super") => Some(Chain::Super),
        _ => None,
    }
}

/// `this(...)` or `super(...)` as an expression statement.
fn chaining_call(statement: &NodeRef) -> Option<(Chain, &MethodInvocation)> {
    let NodeKind::ExpressionStatement(stmt) = &statement.kind else {
        return None;
    };
    let NodeKind::MethodInvocation(call) = &stmt.expr.kind else {
        return None;
    };
    if call.receiver.is_some() {
        return None;
    }
    chaining_kind(call).map(|kind| (kind, call))
}

fn call_location(statements: &[NodeRef], fallback: &Location) -> Location {
    statements
        .first()
        .map(|s| s.location.clone())
        .unwrap_or_else(|| fallback.clone())
}

fn types_of(args: &[Value]) -> Vec<DataType> {
    args.iter().map(Value::data_type).collect()
}

fn method_not_found(name: &str, receiver: &Value, at: &Location) -> Unwind {
    ResolutionError::MethodNotFound {
        name: name.to_string(),
        owner: receiver.type_name(),
        location: at.clone(),
    }
    .into()
}
