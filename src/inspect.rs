//! String rendering of runtime values.
//!
//! This is the form `System.debug` prints and assertion messages quote:
//!
//! | Value            | Rendering                          |
//! |------------------|------------------------------------|
//! | `null`           | `null`                             |
//! | Double           | `2.0`, `0.25`                      |
//! | List             | `(1, 2)`                           |
//! | Set              | `{1, 2}`                           |
//! | Map              | `{a=1, b=2}`                       |
//! | Exception        | `System.MathException: Divide by 0` |
//! | other instances  | `Name:[field=value, ...]`          |
//!
//! Builtin classes render through their native hook, found on the class
//! or its nearest superclass. An instance reached again while it is being
//! rendered prints as `Name:[...]`.

use std::cell::RefCell;
use std::rc::Rc;

use apex_core::{Object, Value};
use apex_registry::NamespaceStore;

/// Render `value` against the classes of `store`.
pub fn inspect(store: &NamespaceStore, value: &Value) -> String {
    Inspector {
        store,
        active: RefCell::new(Vec::new()),
    }
    .render(value)
}

struct Inspector<'a> {
    store: &'a NamespaceStore,
    /// Instances on the current rendering path.
    active: RefCell<Vec<usize>>,
}

impl Inspector<'_> {
    fn render(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Double(d) => format_double(*d),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Object(obj) => {
                let id = Rc::as_ptr(obj) as usize;
                if self.active.borrow().contains(&id) {
                    return format!("{}:[...]", obj.borrow().class.name);
                }
                self.active.borrow_mut().push(id);
                let text = self.render_object(&obj.borrow());
                self.active.borrow_mut().pop();
                text
            }
        }
    }

    fn render_object(&self, obj: &Object) -> String {
        let hook = self
            .store
            .super_chain(obj.class.base)
            .into_iter()
            .find_map(|h| self.store.class(h)?.to_string_hook);
        if let Some(hook) = hook {
            return hook(obj, &|v| self.render(v));
        }
        let fields: Vec<String> = obj
            .fields
            .iter()
            .map(|(name, v)| format!("{name}={}", self.render(v)))
            .collect();
        format!("{}:[{}]", obj.class.name, fields.join(", "))
    }
}

fn format_double(d: f64) -> String {
    if d.is_finite() && d.fract() == 0.0 {
        format!("{d:.1}")
    } else {
        d.to_string()
    }
}
