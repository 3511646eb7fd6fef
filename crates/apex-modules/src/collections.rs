//! Generic collections: `List<T>`, `Set<T>` and `Map<K, V>`.
//!
//! Instances keep their elements in [`Payload`]; an instance created by
//! `new` starts with [`Payload::None`] until a constructor runs, so every
//! method treats an empty payload as an empty collection of its kind.
//!
//! Set elements and map keys are compared with [`Value::key`]: value
//! equality for primitives (case-sensitive for strings) and identity for
//! objects. Iteration order is insertion order.

use apex_core::{CallContext, DataType, NativeError, Object, Payload, Value, ValueMap, builtins};
use apex_registry::{ClassType, Method, Module};

use crate::{native, system_class};

fn list_error(message: String) -> NativeError {
    NativeError::raise(builtins::LIST_EXCEPTION, "ListException", message)
}

fn out_of_bounds(index: i64) -> NativeError {
    list_error(format!("List index out of bounds: {index}"))
}

/// Run `f` on the receiver's list storage.
fn with_list<R>(
    ctx: &CallContext<'_>,
    f: impl FnOnce(&mut Vec<Value>) -> Result<R, NativeError>,
) -> Result<R, NativeError> {
    let obj = ctx.this_object()?.clone();
    let mut obj = obj.borrow_mut();
    if matches!(obj.payload, Payload::None) {
        obj.payload = Payload::List(Vec::new());
    }
    match &mut obj.payload {
        Payload::List(items) => f(items),
        _ => Err(NativeError::invalid_this("expected a List")),
    }
}

/// Run `f` on the receiver's set or map storage.
fn with_entries<R>(
    ctx: &CallContext<'_>,
    f: impl FnOnce(&mut ValueMap) -> Result<R, NativeError>,
) -> Result<R, NativeError> {
    let obj = ctx.this_object()?.clone();
    let mut obj = obj.borrow_mut();
    if matches!(obj.payload, Payload::None) {
        obj.payload = if obj.class.is(builtins::MAP) {
            Payload::Map(ValueMap::default())
        } else {
            Payload::Set(ValueMap::default())
        };
    }
    match &mut obj.payload {
        Payload::Set(entries) | Payload::Map(entries) => f(entries),
        _ => Err(NativeError::invalid_this("expected a Set or Map")),
    }
}

/// Elements of a list or set value, for copy constructors.
fn elements_of(value: &Value) -> Result<Vec<Value>, NativeError> {
    let Some(obj) = value.as_object() else {
        return Err(NativeError::ArgumentType {
            index: 0,
            expected: "List or Set",
            actual: value.type_name(),
        });
    };
    let obj = obj.borrow();
    match &obj.payload {
        Payload::List(items) => Ok(items.clone()),
        Payload::Set(entries) => Ok(entries.keys().cloned().collect()),
        Payload::None => Ok(Vec::new()),
        Payload::Map(_) => Err(NativeError::ArgumentType {
            index: 0,
            expected: "List or Set",
            actual: obj.class.to_string(),
        }),
    }
}

fn index_arg(
    ctx: &CallContext<'_>,
    index: usize,
    len: usize,
    inclusive: bool,
) -> Result<usize, NativeError> {
    let i = ctx.arg_integer(index)?;
    let limit = if inclusive { len } else { len.saturating_sub(1) };
    if i < 0 || (!inclusive && len == 0) || i as usize > limit {
        return Err(out_of_bounds(i));
    }
    Ok(i as usize)
}

// =============================================================================
// LIST
// =============================================================================

fn list_new(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let items = match ctx.arg_count() {
        0 => Vec::new(),
        _ => elements_of(ctx.arg(0)?)?,
    };
    ctx.this_object()?.borrow_mut().payload = Payload::List(items);
    Ok(Value::Null)
}

fn list_add(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let item = ctx.arg(0)?.clone();
    with_list(ctx, |items| {
        items.push(item);
        Ok(Value::Null)
    })
}

fn list_insert(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let item = ctx.arg(1)?.clone();
    with_list(ctx, |items| {
        let at = index_arg(ctx, 0, items.len(), true)?;
        items.insert(at, item);
        Ok(Value::Null)
    })
}

fn list_add_all(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let more = elements_of(ctx.arg(0)?)?;
    with_list(ctx, |items| {
        items.extend(more);
        Ok(Value::Null)
    })
}

fn list_get(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    with_list(ctx, |items| {
        let at = index_arg(ctx, 0, items.len(), false)?;
        Ok(items[at].clone())
    })
}

fn list_set(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let item = ctx.arg(1)?.clone();
    with_list(ctx, |items| {
        let at = index_arg(ctx, 0, items.len(), false)?;
        items[at] = item;
        Ok(Value::Null)
    })
}

fn list_remove(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    with_list(ctx, |items| {
        let at = index_arg(ctx, 0, items.len(), false)?;
        Ok(items.remove(at))
    })
}

fn list_size(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    with_list(ctx, |items| Ok(Value::Integer(items.len() as i64)))
}

fn list_is_empty(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    with_list(ctx, |items| Ok(Value::Boolean(items.is_empty())))
}

fn list_clear(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    with_list(ctx, |items| {
        items.clear();
        Ok(Value::Null)
    })
}

fn list_contains(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let needle = ctx.arg(0)?.clone();
    with_list(ctx, |items| Ok(Value::Boolean(items.iter().any(|v| v.same(&needle)))))
}

fn list_index_of(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let needle = ctx.arg(0)?.clone();
    with_list(ctx, |items| {
        let found = items.iter().position(|v| v.same(&needle));
        Ok(Value::Integer(found.map_or(-1, |i| i as i64)))
    })
}

fn render_list(obj: &Object, render: &dyn Fn(&Value) -> String) -> String {
    let items: Vec<String> = match &obj.payload {
        Payload::List(items) => items.iter().map(render).collect(),
        _ => Vec::new(),
    };
    format!("({})", items.join(", "))
}

fn list_class() -> ClassType {
    let element = DataType::object();
    let integer = DataType::integer();
    let boolean = DataType::boolean();
    let void = DataType::void();
    system_class("List")
        .with_generic_params(&["T"])
        .with_to_string(render_list)
        .with_constructor(Method::native("List", vec![], void.clone(), native(list_new)))
        .with_constructor(Method::native(
            "List",
            vec![element.clone()],
            void.clone(),
            native(list_new),
        ))
        .with_method(Method::native("add", vec![element.clone()], void.clone(), native(list_add)))
        .with_method(Method::native(
            "add",
            vec![integer.clone(), element.clone()],
            void.clone(),
            native(list_insert),
        ))
        .with_method(Method::native(
            "addAll",
            vec![element.clone()],
            void.clone(),
            native(list_add_all),
        ))
        .with_method(Method::native(
            "get",
            vec![integer.clone()],
            element.clone(),
            native(list_get),
        ))
        .with_method(Method::native(
            "set",
            vec![integer.clone(), element.clone()],
            void.clone(),
            native(list_set),
        ))
        .with_method(Method::native(
            "remove",
            vec![integer.clone()],
            element.clone(),
            native(list_remove),
        ))
        .with_method(Method::native("size", vec![], integer.clone(), native(list_size)))
        .with_method(Method::native("isEmpty", vec![], boolean.clone(), native(list_is_empty)))
        .with_method(Method::native("clear", vec![], void, native(list_clear)))
        .with_method(Method::native(
            "contains",
            vec![element.clone()],
            boolean,
            native(list_contains),
        ))
        .with_method(Method::native("indexOf", vec![element], integer, native(list_index_of)))
}

// =============================================================================
// SET
// =============================================================================

fn set_new(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let mut entries = ValueMap::default();
    if ctx.arg_count() > 0 {
        for item in elements_of(ctx.arg(0)?)? {
            entries.insert(item, Value::Null);
        }
    }
    ctx.this_object()?.borrow_mut().payload = Payload::Set(entries);
    Ok(Value::Null)
}

fn set_add(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let item = ctx.arg(0)?.clone();
    with_entries(ctx, |entries| {
        let added = !entries.contains(&item);
        if added {
            entries.insert(item, Value::Null);
        }
        Ok(Value::Boolean(added))
    })
}

fn set_add_all(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let more = elements_of(ctx.arg(0)?)?;
    with_entries(ctx, |entries| {
        let before = entries.len();
        for item in more {
            entries.insert(item, Value::Null);
        }
        Ok(Value::Boolean(entries.len() > before))
    })
}

fn set_remove(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let item = ctx.arg(0)?.clone();
    with_entries(ctx, |entries| Ok(Value::Boolean(entries.remove(&item).is_some())))
}

fn entries_contains(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let item = ctx.arg(0)?.clone();
    with_entries(ctx, |entries| Ok(Value::Boolean(entries.contains(&item))))
}

fn entries_size(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    with_entries(ctx, |entries| Ok(Value::Integer(entries.len() as i64)))
}

fn entries_is_empty(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    with_entries(ctx, |entries| Ok(Value::Boolean(entries.is_empty())))
}

fn entries_clear(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    with_entries(ctx, |entries| {
        entries.clear();
        Ok(Value::Null)
    })
}

fn render_set(obj: &Object, render: &dyn Fn(&Value) -> String) -> String {
    let items: Vec<String> = match &obj.payload {
        Payload::Set(entries) => entries.keys().map(render).collect(),
        _ => Vec::new(),
    };
    format!("{{{}}}", items.join(", "))
}

fn set_class() -> ClassType {
    let element = DataType::object();
    let boolean = DataType::boolean();
    let void = DataType::void();
    system_class("Set")
        .with_generic_params(&["T"])
        .with_to_string(render_set)
        .with_constructor(Method::native("Set", vec![], void.clone(), native(set_new)))
        .with_constructor(Method::native(
            "Set",
            vec![element.clone()],
            void.clone(),
            native(set_new),
        ))
        .with_method(Method::native("add", vec![element.clone()], boolean.clone(), native(set_add)))
        .with_method(Method::native(
            "addAll",
            vec![element.clone()],
            boolean.clone(),
            native(set_add_all),
        ))
        .with_method(Method::native(
            "remove",
            vec![element.clone()],
            boolean.clone(),
            native(set_remove),
        ))
        .with_method(Method::native(
            "contains",
            vec![element],
            boolean.clone(),
            native(entries_contains),
        ))
        .with_method(Method::native("size", vec![], DataType::integer(), native(entries_size)))
        .with_method(Method::native("isEmpty", vec![], boolean, native(entries_is_empty)))
        .with_method(Method::native("clear", vec![], void, native(entries_clear)))
}

// =============================================================================
// MAP
// =============================================================================

fn map_new(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let mut entries = ValueMap::default();
    if ctx.arg_count() > 0 {
        let source = ctx.arg(0)?;
        match source.as_object().map(|o| o.borrow()) {
            Some(obj) => match &obj.payload {
                Payload::Map(other) => entries = other.clone(),
                Payload::None => {}
                _ => {
                    return Err(NativeError::ArgumentType {
                        index: 0,
                        expected: "Map",
                        actual: obj.class.to_string(),
                    });
                }
            },
            None => {
                return Err(NativeError::ArgumentType {
                    index: 0,
                    expected: "Map",
                    actual: source.type_name(),
                });
            }
        }
    }
    ctx.this_object()?.borrow_mut().payload = Payload::Map(entries);
    Ok(Value::Null)
}

fn map_put(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let key = ctx.arg(0)?.clone();
    let value = ctx.arg(1)?.clone();
    with_entries(ctx, |entries| Ok(entries.insert(key, value).unwrap_or_default()))
}

fn map_get(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let key = ctx.arg(0)?.clone();
    with_entries(ctx, |entries| Ok(entries.get(&key).cloned().unwrap_or_default()))
}

fn map_remove(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let key = ctx.arg(0)?.clone();
    with_entries(ctx, |entries| Ok(entries.remove(&key).unwrap_or_default()))
}

fn map_key_set(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let key_type = ctx.this_object()?.borrow().class.type_arg(0);
    let keys = with_entries(ctx, |entries| Ok(entries.keys().cloned().collect::<Vec<_>>()))?;
    Ok(Value::set(key_type, keys))
}

fn map_values(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let value_type = ctx.this_object()?.borrow().class.type_arg(1);
    let values = with_entries(ctx, |entries| Ok(entries.values().cloned().collect()))?;
    Ok(Value::list(value_type, values))
}

fn render_map(obj: &Object, render: &dyn Fn(&Value) -> String) -> String {
    let items: Vec<String> = match &obj.payload {
        Payload::Map(entries) => entries
            .iter()
            .map(|(k, v)| format!("{}={}", render(k), render(v)))
            .collect(),
        _ => Vec::new(),
    };
    format!("{{{}}}", items.join(", "))
}

fn map_class() -> ClassType {
    let object = DataType::object();
    let boolean = DataType::boolean();
    let void = DataType::void();
    system_class("Map")
        .with_generic_params(&["K", "V"])
        .with_to_string(render_map)
        .with_constructor(Method::native("Map", vec![], void.clone(), native(map_new)))
        .with_constructor(Method::native(
            "Map",
            vec![object.clone()],
            void.clone(),
            native(map_new),
        ))
        .with_method(Method::native(
            "put",
            vec![object.clone(), object.clone()],
            object.clone(),
            native(map_put),
        ))
        .with_method(Method::native("get", vec![object.clone()], object.clone(), native(map_get)))
        .with_method(Method::native(
            "remove",
            vec![object.clone()],
            object.clone(),
            native(map_remove),
        ))
        .with_method(Method::native(
            "containsKey",
            vec![object.clone()],
            boolean.clone(),
            native(entries_contains),
        ))
        .with_method(Method::native(
            "keySet",
            vec![],
            DataType::set_of(object.clone()),
            native(map_key_set),
        ))
        .with_method(Method::native(
            "values",
            vec![],
            DataType::list_of(object),
            native(map_values),
        ))
        .with_method(Method::native("size", vec![], DataType::integer(), native(entries_size)))
        .with_method(Method::native("isEmpty", vec![], boolean, native(entries_is_empty)))
        .with_method(Method::native("clear", vec![], void, native(entries_clear)))
}

/// `List`, `Set` and `Map`.
pub fn module() -> Module {
    Module::new("collections")
        .with_class(list_class())
        .with_class(set_class())
        .with_class(map_class())
}
