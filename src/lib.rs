//! Apex-style object-oriented language engine.
//!
//! This crate ties the workspace together: it installs the standard library
//! into a class table, compiles parsed declarations against it and runs the
//! result with a tree-walking interpreter.
//!
//! ## Architecture
//!
//! ```text
//! Context ──create_unit──▶ Unit ──build──▶ Compiler (register, resolve, check)
//!    │                       │
//!    └─ modules, schema      └─ invoke / fire_trigger ──▶ Interpreter
//! ```
//!
//! - [`Context`]: engine configuration, installed modules and schema. It is
//!   the single writer of the class table; once a unit has been built from
//!   it, further installs are rejected.
//! - [`Unit`]: one compilation unit. Holds the declarations, the compiled
//!   class table and the runtime state (static fields, debug output) that
//!   persists between invocations.
//! - [`Interpreter`](interpreter::Interpreter): evaluates bodies with
//!   [`ControlFlow`] sentinels for `return`, `break`, `continue` and raised
//!   exceptions.
//! - [`QueryRunner`]: host collaborator that answers embedded queries.
//! - [`inspect`]: renders values the way `System.debug` prints them.
//!
//! The grammar layer is external: trees are supplied already parsed, or
//! assembled with [`apex_ast::build`].
//!
//! # Example
//!
//! ```
//! use apex::{Context, Value};
//! use apex_ast::build::*;
//! use apex_ast::BinaryOp;
//!
//! let ctx = Context::with_default_modules().unwrap();
//! let mut unit = ctx.create_unit();
//! unit.add_declaration(
//!     ClassBuilder::new("Calc")
//!         .method(static_method(
//!             "run",
//!             "Integer",
//!             vec![ret(Some(binary(
//!                 BinaryOp::Add,
//!                 int(1),
//!                 binary(BinaryOp::Mul, int(2), int(3)),
//!             )))],
//!         ))
//!         .build(),
//! )
//! .unwrap();
//! unit.build().unwrap();
//! assert_eq!(unit.invoke("Calc.run", &[]).unwrap().as_integer(), Some(7));
//! ```

mod context;
mod inspect;
pub mod interpreter;
mod query;
mod unit;

pub use context::{Context, EngineConfig};
pub use inspect::inspect;
pub use interpreter::ControlFlow;
pub use query::{BindEvaluator, QueryError, QueryRequest, QueryRunner};
pub use unit::{Unit, UnitError};

pub use apex_core::{
    ApexError, ContextError, DataType, Diagnostic, Diagnostics, RuntimeError, TypeHash, Value,
};
pub use apex_registry::SchemaMap;
