//! Tier-based ranking for overload resolution.
//!
//! Each argument is classified against its parameter; a candidate's tier is
//! the worst tier over its arguments. The best candidates are those in the
//! lowest tier, and a tie there is reported rather than broken.

use apex_core::{DataType, Location, ResolutionError};
use apex_registry::NamespaceStore;

use super::{OverloadMatch, format_args};

/// How well an argument list fits a parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    /// Every argument is structurally equal to its parameter, or `null`.
    Exact,
    /// Some argument needs widening, an upcast, or is taken as `Object`.
    Assignable,
}

/// Tier of `arg_types` against `params`, or `None` if some argument does not fit.
///
/// The lists must have equal length; arity is filtered by the caller.
pub fn match_tier(
    store: &NamespaceStore,
    params: &[DataType],
    arg_types: &[DataType],
) -> Option<MatchTier> {
    let mut tier = MatchTier::Exact;
    for (param, arg) in params.iter().zip(arg_types) {
        if arg == param || arg.is_null() {
            continue;
        }
        if !store.is_assignable(arg, param) {
            return None;
        }
        tier = MatchTier::Assignable;
    }
    Some(tier)
}

/// Pick the single candidate in the lowest tier.
///
/// `viable` must be non-empty.
pub fn find_best_match(
    viable: &[OverloadMatch],
    name: &str,
    arg_types: &[DataType],
    location: &Location,
) -> Result<OverloadMatch, ResolutionError> {
    let Some(best) = viable.iter().map(|m| m.tier).min() else {
        return Err(ResolutionError::NoMatchingOverload {
            name: name.to_string(),
            args: format_args(arg_types),
            location: location.clone(),
        });
    };
    let mut winners = viable.iter().filter(|m| m.tier == best);
    match (winners.next(), winners.count()) {
        (Some(winner), 0) => Ok(winner.clone()),
        (_, others) => Err(ResolutionError::AmbiguousOverload {
            name: name.to_string(),
            args: format_args(arg_types),
            candidates: others + 1,
            location: location.clone(),
        }),
    }
}
