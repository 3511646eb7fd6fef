//! Program-tree node model.
//!
//! The grammar layer (external to this workspace) produces trees of
//! [`Node`]s. This crate defines:
//!
//! - the closed [`NodeKind`] sum type and its payload structs
//! - parent back-links ([`link_parents`])
//! - the [`visitor::Visitor`] traversal
//! - [`build`] helpers for assembling trees by hand

pub mod build;
mod decl;
mod expr;
mod node;
mod ops;
mod stmt;
pub mod visitor;

pub use decl::*;
pub use expr::*;
pub use node::{Node, NodeKind, NodeRef, link_parents};
pub use ops::{BinaryOp, UnaryOp};
pub use stmt::*;
