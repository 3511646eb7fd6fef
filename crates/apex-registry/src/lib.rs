//! Class registry for the Apex interpreter.
//!
//! - [`ClassType`], [`Method`], [`Field`] and [`Parameter`]: registered members
//! - [`NamespaceStore`]: the class table, namespaces and triggers
//! - [`Module`]: batches of native classes installed at startup
//! - [`SchemaMap`] and [`register_schema`]: record classes from external metadata

mod class_type;
mod module;
mod schema;
mod store;
mod trigger;

pub use class_type::{
    Accessor, ClassKind, ClassType, Field, Method, MethodKind, MethodRef, Parameter, Property,
    ToStringHook,
};
pub use module::Module;
pub use schema::{SchemaField, SchemaMap, register_schema};
pub use store::{ClassMap, NamespaceStore, SCHEMA_NAMESPACE, SYSTEM_NAMESPACE};
pub use trigger::Trigger;
