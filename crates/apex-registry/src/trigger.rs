//! Registered triggers.

use apex_ast::{NodeRef, TriggerEvent};
use apex_core::{Location, TypeHash, TypeRef};

/// A trigger body bound to an object and the events it fires on.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub name: String,
    /// The object the trigger is declared `on`. Resolved with the classes.
    pub object: TypeRef,
    pub events: Vec<TriggerEvent>,
    pub body: NodeRef,
    pub location: Location,
}

impl Trigger {
    pub fn fires_on(&self, event: TriggerEvent) -> bool {
        self.events.contains(&event)
    }

    /// Identity of the target object once resolved.
    pub fn object_type(&self) -> Option<TypeHash> {
        self.object.resolved().map(|t| t.base)
    }
}
