//! Role-indexed dispatch to the three tracers.

use super::{BuilderTracer, CarrierTracer, FieldSetTracer, RoleTracer};
use crate::role::Role;

/// Owns one tracer per role.
#[derive(Debug, Clone, Default)]
pub struct TracerRegistry {
    builder: BuilderTracer,
    carrier: CarrierTracer,
    field_set: FieldSetTracer,
}

impl TracerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The strategy handling `role`.
    pub fn tracer(&self, role: Role) -> &dyn RoleTracer {
        match role {
            Role::Builder => &self.builder,
            Role::Carrier => &self.carrier,
            Role::FieldSet => &self.field_set,
        }
    }
}
