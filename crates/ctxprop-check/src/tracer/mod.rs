//! Per-role tracing strategies.
//!
//! While the resolution engine walks backward from a terminal call, each step
//! through a call is interpreted by the tracer of the role currently being
//! traced. A tracer answers one question: given this call, its callee and
//! the role of its receiver, is the marker set here, does tracing switch to
//! another role on the receiver, or should it keep going?
//!
//! Delegation names a [`Role`] rather than another tracer, so the three
//! strategies never reference each other. [`TracerRegistry`] maps a role
//! back to its strategy.

pub mod builder;
pub mod carrier;
pub mod field_set;
pub mod registry;

pub use builder::BuilderTracer;
pub use carrier::CarrierTracer;
pub use field_set::FieldSetTracer;
pub use registry::TracerRegistry;

use ctxprop_core::graph::{CallSite, ValueGraph};
use ctxprop_core::id::NodeId;
use ctxprop_core::procedure::ProcDef;

use crate::classify::RoleClassifier;
use crate::role::Role;

/// Result of interpreting one call for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The marker is set (or inherited) at this call.
    Found,
    /// Keep tracing `value` as `role`.
    Delegate { role: Role, value: NodeId },
    /// Nothing decided here.
    Continue,
}

impl Outcome {
    /// Delegation to the receiver of `call`; `Continue` when the call has no
    /// arguments at all.
    pub fn delegate_receiver(role: Role, call: &CallSite) -> Outcome {
        match call.first_arg() {
            Some(value) => Outcome::Delegate { role, value },
            None => Outcome::Continue,
        }
    }
}

/// Read-only view shared by all tracers during one analysis.
#[derive(Clone, Copy)]
pub struct TraceContext<'a> {
    pub graph: &'a ValueGraph,
    pub classifier: &'a dyn RoleClassifier,
}

impl<'a> TraceContext<'a> {
    pub fn new(graph: &'a ValueGraph, classifier: &'a dyn RoleClassifier) -> Self {
        TraceContext { graph, classifier }
    }

    /// Role of the value `callee` returns.
    pub fn returns_role(&self, callee: &ProcDef) -> Option<Role> {
        self.classifier.returns_role(&self.graph.types, callee)
    }

    /// Role of the receiver `callee` is declared on.
    pub fn receiver_role(&self, callee: &ProcDef) -> Option<Role> {
        callee
            .receiver_type()
            .and_then(|ty| self.classifier.role_of(&self.graph.types, ty))
    }

    /// Role of the value produced by `node`.
    pub fn value_role(&self, node: NodeId) -> Option<Role> {
        self.graph
            .type_of(node)
            .and_then(|ty| self.classifier.role_of(&self.graph.types, ty))
    }
}

/// Strategy for one [`Role`].
pub trait RoleTracer {
    /// The role this tracer handles.
    fn role(&self) -> Role;

    /// Interprets `call` to `callee`, whose receiver has `receiver_role`.
    fn check_context(
        &self,
        cx: &TraceContext<'_>,
        call: &CallSite,
        callee: &ProcDef,
        receiver_role: Option<Role>,
    ) -> Outcome;

    /// Whether an undecided call on a receiver of `role` should be traced
    /// further through that receiver.
    fn continues_on_receiver_role(&self, role: Option<Role>) -> bool {
        role == Some(self.role())
    }
}
