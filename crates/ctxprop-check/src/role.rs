//! Roles a value can play in a propagation chain.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The part a value plays in a logging chain.
///
/// A value's role is derived from its static type once and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A message under construction (`*Event`). Terminal calls consume it.
    Builder,
    /// A long-lived handle that creates builders (`Logger`).
    Carrier,
    /// An accumulating set of fields that derives carriers (`Context`).
    FieldSet,
}

impl Role {
    /// All roles, in dispatch order.
    pub const ALL: [Role; 3] = [Role::Builder, Role::Carrier, Role::FieldSet];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Builder => write!(f, "builder"),
            Role::Carrier => write!(f, "carrier"),
            Role::FieldSet => write!(f, "field set"),
        }
    }
}
