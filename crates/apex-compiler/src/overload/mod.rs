//! Overload resolution for method and constructor calls.
//!
//! Selects exactly one method from a candidate list given the argument
//! types at the call site.
//!
//! ## Algorithm
//!
//! 1. Drop candidates not visible from the calling class
//! 2. Keep candidates whose parameter count equals the argument count
//! 3. Rank each remaining candidate (see [`MatchTier`]); reject candidates
//!    with any argument that does not fit its parameter
//! 4. Exactly one candidate must sit in the lowest non-empty tier; more than
//!    one is ambiguous, none is a failed match
//!
//! Argument types are whatever the caller knows: the interpreter passes the
//! runtime types of the evaluated arguments.

mod ranking;

pub use ranking::{MatchTier, find_best_match, match_tier};

use apex_core::{DataType, Location, ResolutionError, TypeHash};
use apex_registry::{MethodRef, NamespaceStore};

use crate::visibility::is_visible;

/// Result of successful overload resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverloadMatch {
    pub method: MethodRef,
    pub tier: MatchTier,
}

/// Select one of `candidates` for a call with `arg_types` made from `caller`.
///
/// `name` and `location` are used for diagnostics only.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn select_overload(
    store: &NamespaceStore,
    candidates: &[MethodRef],
    arg_types: &[DataType],
    caller: Option<TypeHash>,
    name: &str,
    location: &Location,
) -> Result<OverloadMatch, ResolutionError> {
    let visible: Vec<_> = candidates
        .iter()
        .filter_map(|r| Some((r, store.method(r)?)))
        .filter(|(_, m)| is_visible(store, m.modifiers, m.owner, caller))
        .collect();
    if visible.is_empty() && !candidates.is_empty() {
        return Err(ResolutionError::NotVisible {
            name: name.to_string(),
            location: location.clone(),
        });
    }

    let viable: Vec<OverloadMatch> = visible
        .into_iter()
        .filter(|(_, m)| m.arity() == arg_types.len())
        .filter_map(|(r, m)| {
            let tier = match_tier(store, &m.param_types(), arg_types)?;
            Some(OverloadMatch {
                method: r.clone(),
                tier,
            })
        })
        .collect();

    if viable.is_empty() {
        return Err(ResolutionError::NoMatchingOverload {
            name: name.to_string(),
            args: format_args(arg_types),
            location: location.clone(),
        });
    }
    find_best_match(&viable, name, arg_types, location)
}

/// `Integer, String` for diagnostics.
pub(crate) fn format_args(arg_types: &[DataType]) -> String {
    arg_types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
