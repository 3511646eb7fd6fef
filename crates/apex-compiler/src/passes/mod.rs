//! Compilation passes, in the order the driver runs them.
//!
//! 1. [`RegistrationPass`]: declarations into the namespace store
//! 2. [`ResolutionPass`]: every type mention resolved
//! 3. [`SymbolPass`]: every name in every body refers to something
//! 4. [`CheckingPass`]: structural class rules

mod checking;
mod registration;
mod resolution;
mod symbols;

pub use checking::{CheckingOutput, CheckingPass};
pub use registration::{RegistrationOutput, RegistrationPass};
pub use resolution::{ResolutionOutput, ResolutionPass};
pub use symbols::{SymbolOutput, SymbolPass};
