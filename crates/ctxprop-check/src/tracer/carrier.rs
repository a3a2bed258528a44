//! Tracer for carrier values (`Logger`).

use ctxprop_core::graph::CallSite;
use ctxprop_core::procedure::ProcDef;

use super::{Outcome, RoleTracer, TraceContext};
use crate::role::Role;

/// A carrier holds the marker if it came from the ambient source, or was
/// derived from a field set or carrier that does.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarrierTracer;

impl RoleTracer for CarrierTracer {
    fn role(&self) -> Role {
        Role::Carrier
    }

    fn check_context(
        &self,
        cx: &TraceContext<'_>,
        call: &CallSite,
        callee: &ProcDef,
        receiver_role: Option<Role>,
    ) -> Outcome {
        if cx.classifier.is_ambient_marker_source(callee) {
            return Outcome::Found;
        }

        match (receiver_role, cx.returns_role(callee)) {
            (Some(Role::FieldSet), Some(Role::Carrier)) => Outcome::delegate_receiver(Role::FieldSet, call),
            (Some(Role::Carrier), Some(Role::FieldSet)) => Outcome::delegate_receiver(Role::Carrier, call),
            _ => Outcome::Continue,
        }
    }
}
