//! The `Trigger` context class.
//!
//! Its static fields describe the event being processed. They hold `null`
//! outside a trigger; the interpreter assigns them before running a trigger
//! body.

use apex_core::{DataType, Modifiers, TypeRef, builtins};
use apex_registry::{Field, Module};

use crate::system_class;

/// Names of the Boolean context flags, in the order they are assigned.
pub const FLAGS: &[&str] = &[
    "isExecuting",
    "isBefore",
    "isAfter",
    "isInsert",
    "isUpdate",
    "isDelete",
    "isUndelete",
];

fn context_field(name: &str, ty: DataType) -> Field {
    Field::new(name, TypeRef::resolved_to(ty)).with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
}

pub fn module() -> Module {
    let records = DataType::list_of(DataType::simple(builtins::SOBJECT, "SObject"));
    let class = FLAGS.iter().fold(
        system_class("Trigger")
            .with_field(context_field("new", records.clone()))
            .with_field(context_field("old", records))
            .with_field(context_field("size", DataType::integer())),
        |class, flag| class.with_field(context_field(flag, DataType::boolean())),
    );
    Module::new("trigger").with_class(class)
}
