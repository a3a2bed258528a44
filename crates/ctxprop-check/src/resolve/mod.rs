//! Backward value resolution.
//!
//! [`Resolver::resolve`] answers "does this value carry the marker?" by
//! walking operands backward from the value. Calls are interpreted by the
//! tracer of the active role; joins, stores, captured variables and
//! immediately-invoked closures fan out into branches that must all carry
//! the marker. Each branch gets its own copy of the visited set, so a node
//! reached along two sibling paths is explored on both, while a cycle on
//! a single path terminates with `false`.

pub mod store;

use std::collections::HashSet;

use ctxprop_core::graph::{CallSite, ValueGraph};
use ctxprop_core::id::{NodeId, ProcId};
use ctxprop_core::ops::ValueOp;

use crate::classify::RoleClassifier;
use crate::role::Role;
use crate::tracer::{Outcome, TraceContext, TracerRegistry};

/// Nodes already explored on the current path.
pub type Visited = HashSet<NodeId>;

/// The resolution engine for one graph and classifier.
pub struct Resolver<'a> {
    cx: TraceContext<'a>,
    registry: &'a TracerRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(graph: &'a ValueGraph, classifier: &'a dyn RoleClassifier, registry: &'a TracerRegistry) -> Self {
        Resolver {
            cx: TraceContext::new(graph, classifier),
            registry,
        }
    }

    /// Resolves `value` as `role` with a fresh visited set.
    pub fn chain_has_marker(&self, value: NodeId, role: Role) -> bool {
        let mut visited = Visited::new();
        self.resolve(value, role, &mut visited)
    }

    /// `true` if `value`, traced as `role`, carries the marker.
    pub fn resolve(&self, value: NodeId, role: Role, visited: &mut Visited) -> bool {
        if !visited.insert(value) {
            return false;
        }
        let graph = self.cx.graph;
        let Some(node) = graph.node(value) else {
            return false;
        };

        match &node.op {
            ValueOp::Call { .. } => match graph.call_site(value) {
                Some(site) => self.resolve_call(&site, role, visited),
                None => false,
            },
            ValueOp::Phi => self.resolve_join(value, role, visited),
            ValueOp::Load => {
                let Some(addr) = graph.operand(value, 0) else {
                    return false;
                };
                let stored = store::stored_values(graph, node.owner, addr);
                if stored.is_empty() {
                    self.resolve(addr, role, visited)
                } else {
                    self.all_resolve(stored, role, visited)
                }
            }
            ValueOp::Alloc => {
                let stored = store::stored_values(graph, node.owner, value);
                self.all_resolve(stored, role, visited)
            }
            ValueOp::CaptureAccess { index } => {
                let bindings = self.capture_bindings(node.owner, *index);
                self.all_resolve(bindings, role, visited)
            }
            ValueOp::Wrap { .. } => match graph.operand(value, 0) {
                Some(inner) => self.resolve(inner, role, visited),
                None => false,
            },
            _ => false,
        }
    }

    fn resolve_call(&self, site: &CallSite, role: Role, visited: &mut Visited) -> bool {
        let graph = self.cx.graph;
        let Some(callee) = site.callee.and_then(|id| graph.procedure(id)) else {
            // Dynamic dispatch: keep following the receiver.
            return match site.first_arg() {
                Some(receiver) => self.resolve(receiver, role, visited),
                None => false,
            };
        };

        if site.closure.is_some() {
            let first_result_role = callee
                .results
                .first()
                .and_then(|&ty| self.cx.classifier.role_of(&graph.types, ty));
            if first_result_role.is_some() {
                let results: Vec<NodeId> = graph
                    .returns(callee.id)
                    .into_iter()
                    .filter_map(|ret| graph.operand(ret, 0))
                    .collect();
                tracing::trace!(closure = callee.name.as_str(), returns = results.len(), "tracing immediately invoked closure");
                return self.all_resolve(results, role, visited);
            }
        }

        let receiver_role = self.cx.receiver_role(callee);
        let tracer = self.registry.tracer(role);
        match tracer.check_context(&self.cx, site, callee, receiver_role) {
            Outcome::Found => {
                tracing::trace!(call = %site.node, callee = callee.name.as_str(), %role, "marker found");
                true
            }
            Outcome::Delegate { role: next, value } => {
                tracing::trace!(call = %site.node, from = %role, to = %next, "delegating");
                self.resolve(value, next, visited)
            }
            Outcome::Continue => {
                if !tracer.continues_on_receiver_role(receiver_role) {
                    return false;
                }
                match site.first_arg() {
                    Some(receiver) => self.resolve(receiver, role, visited),
                    None => false,
                }
            }
        }
    }

    fn resolve_join(&self, phi: NodeId, role: Role, visited: &mut Visited) -> bool {
        let graph = self.cx.graph;
        let edges: Vec<NodeId> = graph
            .operands(phi)
            .into_iter()
            .filter(|&edge| !leads_to(graph, edge, phi, &mut HashSet::new()))
            .filter(|&edge| !graph.op(edge).is_some_and(ValueOp::is_nil))
            .collect();
        self.all_resolve(edges, role, visited)
    }

    /// Bindings at `index` of every creation site of closure `owner` in its
    /// enclosing procedure.
    fn capture_bindings(&self, owner: ProcId, index: u32) -> Vec<NodeId> {
        let graph = self.cx.graph;
        let Some(parent) = graph.procedure(owner).and_then(|p| p.parent) else {
            return Vec::new();
        };
        let Ok(index) = u16::try_from(index) else {
            return Vec::new();
        };
        graph
            .closure_sites(parent, owner)
            .into_iter()
            .filter_map(|site| graph.operand(site, index))
            .collect()
    }

    /// Every value must resolve, each with its own copy of `visited`.
    /// An empty set never resolves.
    fn all_resolve(&self, values: Vec<NodeId>, role: Role, visited: &Visited) -> bool {
        if values.is_empty() {
            return false;
        }
        values.into_iter().all(|value| {
            let mut branch = visited.clone();
            self.resolve(value, role, &mut branch)
        })
    }
}

/// `true` if `value` reaches `target` through receivers, wrappers or joins.
/// Join edges that loop back to their own join are not independent paths.
pub fn leads_to(graph: &ValueGraph, value: NodeId, target: NodeId, seen: &mut HashSet<NodeId>) -> bool {
    if value == target {
        return true;
    }
    if !seen.insert(value) {
        return false;
    }
    match graph.op(value) {
        Some(ValueOp::Call { .. }) | Some(ValueOp::Wrap { .. }) => match graph.operand(value, 0) {
            Some(inner) => leads_to(graph, inner, target, seen),
            None => false,
        },
        Some(ValueOp::Phi) => graph
            .operands(value)
            .into_iter()
            .any(|edge| leads_to(graph, edge, target, seen)),
        _ => false,
    }
}
