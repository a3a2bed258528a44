//! Tracer for builder values (`*Event`).

use ctxprop_core::graph::CallSite;
use ctxprop_core::procedure::ProcDef;

use super::{Outcome, RoleTracer, TraceContext};
use crate::role::Role;

/// Builders get the marker from a setter call on themselves, or inherit it
/// from the carrier or field set that created them.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderTracer;

impl RoleTracer for BuilderTracer {
    fn role(&self) -> Role {
        Role::Builder
    }

    fn check_context(
        &self,
        cx: &TraceContext<'_>,
        call: &CallSite,
        callee: &ProcDef,
        receiver_role: Option<Role>,
    ) -> Outcome {
        if cx.classifier.is_marker_setter(&callee.name)
            && matches!(receiver_role, Some(Role::Builder) | Some(Role::FieldSet))
        {
            return Outcome::Found;
        }
        if cx.classifier.is_ambient_marker_source(callee) {
            return Outcome::Found;
        }

        match (receiver_role, cx.returns_role(callee)) {
            // log.Info() -> trace log
            (Some(Role::Carrier), Some(Role::Builder)) => Outcome::delegate_receiver(Role::Carrier, call),
            // ctx.Logger() -> trace the field set
            (Some(Role::FieldSet), Some(Role::Carrier)) => Outcome::delegate_receiver(Role::FieldSet, call),
            _ => Outcome::Continue,
        }
    }
}
