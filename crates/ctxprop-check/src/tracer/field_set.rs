//! Tracer for field-set values (`Context`).

use ctxprop_core::graph::CallSite;
use ctxprop_core::procedure::ProcDef;

use super::{Outcome, RoleTracer, TraceContext};
use crate::role::Role;

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSetTracer;

impl RoleTracer for FieldSetTracer {
    fn role(&self) -> Role {
        Role::FieldSet
    }

    fn check_context(
        &self,
        cx: &TraceContext<'_>,
        call: &CallSite,
        callee: &ProcDef,
        receiver_role: Option<Role>,
    ) -> Outcome {
        if cx.classifier.is_marker_setter(&callee.name) && receiver_role == Some(Role::FieldSet) {
            return Outcome::Found;
        }

        match (receiver_role, cx.returns_role(callee)) {
            (Some(Role::Carrier), Some(Role::FieldSet)) => Outcome::delegate_receiver(Role::Carrier, call),
            _ => Outcome::Continue,
        }
    }
}
