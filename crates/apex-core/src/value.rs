//! Runtime values.
//!
//! Primitive values are held inline; instances are reference-counted
//! [`Object`]s shared by every variable that points at them. Reference
//! equality for objects is `Rc::ptr_eq`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::data_type::DataType;
use crate::ident_map::IdentMap;

/// Shared handle to a heap instance.
pub type ObjectRef = Rc<RefCell<Object>>;

/// Key under which exception objects keep their message in [`Object::extra`].
pub const MESSAGE_KEY: &str = "message";

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Double(f64),
    String(String),
    Boolean(bool),
    Object(ObjectRef),
}

impl Value {
    /// Allocate a fresh instance of `class` with no fields set.
    pub fn new_object(class: DataType) -> Value {
        Value::Object(Rc::new(RefCell::new(Object::new(class))))
    }

    /// Allocate a `List<element>` holding `items`.
    pub fn list(element: DataType, items: Vec<Value>) -> Value {
        let mut obj = Object::new(DataType::list_of(element));
        obj.payload = Payload::List(items);
        Value::Object(Rc::new(RefCell::new(obj)))
    }

    /// Allocate a `Set<element>` holding `items` (duplicates collapse).
    pub fn set(element: DataType, items: impl IntoIterator<Item = Value>) -> Value {
        let mut map = ValueMap::default();
        for item in items {
            map.insert(item, Value::Null);
        }
        let mut obj = Object::new(DataType::set_of(element));
        obj.payload = Payload::Set(map);
        Value::Object(Rc::new(RefCell::new(obj)))
    }

    /// Static type of this value as seen at runtime.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::null(),
            Value::Integer(_) => DataType::integer(),
            Value::Double(_) => DataType::double(),
            Value::String(_) => DataType::string(),
            Value::Boolean(_) => DataType::boolean(),
            Value::Object(obj) => obj.borrow().class.clone(),
        }
    }

    /// Name of the runtime type, for diagnostics.
    pub fn type_name(&self) -> String {
        self.data_type().to_string()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view, widening integers.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Identity for objects, value equality for primitives.
    ///
    /// Strings compare case-sensitively here; the `==` operator applies the
    /// language's case-insensitive rule on top.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Integer(a), Value::Double(b)) | (Value::Double(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Hashable key for set and map payloads.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Integer(i) => ValueKey::Integer(*i),
            Value::Double(d) => ValueKey::Double(OrderedFloat(*d)),
            Value::String(s) => ValueKey::String(s.clone()),
            Value::Boolean(b) => ValueKey::Boolean(*b),
            Value::Object(obj) => ValueKey::Object(Rc::as_ptr(obj) as usize),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Object(obj) => match obj.try_borrow() {
                Ok(o) => write!(f, "<{}>", o.class),
                Err(_) => write!(f, "<object>"),
            },
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Hashable projection of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Integer(i64),
    Double(OrderedFloat<f64>),
    String(String),
    Boolean(bool),
    Object(usize),
}

/// A heap instance.
#[derive(Debug)]
pub struct Object {
    /// Runtime class, including bound generics.
    pub class: DataType,
    /// Declared instance fields.
    pub fields: IdentMap<Value>,
    /// Native backing storage for collections.
    pub payload: Payload,
    /// Open-ended state for native-backed classes (exception messages etc.).
    pub extra: FxHashMap<String, Value>,
}

impl Object {
    pub fn new(class: DataType) -> Self {
        Self {
            class,
            fields: IdentMap::new(),
            payload: Payload::None,
            extra: FxHashMap::default(),
        }
    }
}

/// Native storage behind collection classes.
#[derive(Debug, Default)]
pub enum Payload {
    #[default]
    None,
    List(Vec<Value>),
    Set(ValueMap),
    Map(ValueMap),
}

/// Insertion-ordered map keyed by [`ValueKey`].
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
    index: FxHashMap<ValueKey, usize>,
}

impl ValueMap {
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.index.get(&key.key()) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.key(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.index.get(&key.key()).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.index.contains_key(&key.key())
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let i = self.index.remove(&key.key())?;
        let (_, value) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}
