//! Terminal-call driver.
//!
//! Walks a procedure's instructions in order and, for each call that ends a
//! builder chain, asks the resolver whether the chain carries the marker.
//! Direct logging calls that bypass builders are reported unconditionally.

use ctxprop_core::graph::{CallSite, ValueGraph};
use ctxprop_core::id::{NodeId, ProcId};

use crate::ambient::AmbientBinding;
use crate::classify::RoleClassifier;
use crate::report::{Finding, FindingKind};
use crate::resolve::Resolver;
use crate::role::Role;
use crate::tracer::{TraceContext, TracerRegistry};

/// Checks procedures of one graph with one classifier.
pub struct Checker<'a> {
    graph: &'a ValueGraph,
    classifier: &'a dyn RoleClassifier,
    registry: TracerRegistry,
}

/// How a call relates to the builder chain.
enum CallKind {
    /// Ends a chain; the value is the builder to trace, if one was found.
    Terminal(Option<NodeId>),
    Bypass,
    Other,
}

impl<'a> Checker<'a> {
    pub fn new(graph: &'a ValueGraph, classifier: &'a dyn RoleClassifier) -> Self {
        Checker {
            graph,
            classifier,
            registry: TracerRegistry::new(),
        }
    }

    /// Findings for `proc`, which has `binding` in scope. Not deduplicated.
    pub fn check_procedure(&self, proc: ProcId, binding: &AmbientBinding) -> Vec<Finding> {
        let resolver = Resolver::new(self.graph, self.classifier, &self.registry);
        let mut findings = Vec::new();

        for node in self.graph.proc_nodes(proc) {
            let Some(site) = self.graph.call_site(node) else {
                continue;
            };
            let kind = match self.classify_call(&site) {
                CallKind::Terminal(value) => {
                    let carries = value.is_some_and(|v| resolver.chain_has_marker(v, Role::Builder));
                    tracing::debug!(%proc, call = %node, carries, "terminal call");
                    if carries {
                        continue;
                    }
                    FindingKind::MissingPropagation
                }
                CallKind::Bypass => FindingKind::BypassCall,
                CallKind::Other => continue,
            };
            findings.push(Finding {
                kind,
                node: Some(node),
                position: self.graph.node(node).and_then(|n| n.pos.clone()),
                marker: binding.name.clone(),
            });
        }

        findings
    }

    fn classify_call(&self, site: &CallSite) -> CallKind {
        let cx = TraceContext::new(self.graph, self.classifier);
        let Some(callee) = site.callee.and_then(|id| self.graph.procedure(id)) else {
            return CallKind::Other;
        };
        let receiver_role = cx.receiver_role(callee);

        if site.deferred {
            if self.classifier.returns_nothing(callee) && receiver_role == Some(Role::Builder) {
                return CallKind::Terminal(site.first_arg());
            }
            return CallKind::Other;
        }

        if self.classifier.is_bypass_call(&self.graph.types, callee, receiver_role) {
            return CallKind::Bypass;
        }
        if !self.classifier.returns_nothing(callee) {
            return CallKind::Other;
        }

        match site.closure {
            // Bound method value: the receiver was captured as binding 0.
            Some(closure) => match self.graph.operand(closure, 0) {
                Some(bound) if cx.value_role(bound) == Some(Role::Builder) => CallKind::Terminal(Some(bound)),
                _ => CallKind::Other,
            },
            None if receiver_role == Some(Role::Builder) => CallKind::Terminal(site.first_arg()),
            None => CallKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use ctxprop_core::node::Position;
    use ctxprop_core::ops::ConstValue;
    use ctxprop_core::procedure::Receiver;
    use ctxprop_core::type_id::TypeId;

    use super::*;
    use crate::classify::RoleTable;

    const ZEROLOG: &str = "github.com/rs/zerolog";

    struct Fixture {
        graph: ValueGraph,
        handler: ProcId,
        info: ProcId,
        msg: ProcId,
        ctx: ProcId,
        print: ProcId,
    }

    fn fixture() -> Fixture {
        let mut graph = ValueGraph::new();
        let named = graph.types.named(ZEROLOG, "Event");
        let event = graph.types.pointer_to(named).unwrap();
        let logger = graph.types.named(ZEROLOG, "Logger");
        let marker = graph.types.named("context", "Context");

        let on = |name: &str, ty: TypeId| Receiver {
            name: name.into(),
            ty,
        };
        let info = graph.add_method("Info", Some(ZEROLOG), on("l", logger), vec![], vec![event]);
        let msg = graph.add_method("Msg", Some(ZEROLOG), on("e", event), vec![("m".into(), TypeId::STRING)], vec![]);
        let ctx = graph.add_method("Ctx", Some(ZEROLOG), on("e", event), vec![("c".into(), marker)], vec![event]);
        let print = graph.add_method("Print", Some(ZEROLOG), on("l", logger), vec![], vec![]);
        let handler = graph.add_function(
            "handler",
            Some("example.com/app"),
            vec![("ctx".into(), marker), ("log".into(), logger)],
            vec![],
        );
        Fixture {
            graph,
            handler,
            info,
            msg,
            ctx,
            print,
        }
    }

    fn binding(f: &Fixture) -> AmbientBinding {
        AmbientBinding {
            name: "ctx".into(),
            origin: f.handler,
        }
    }

    fn run(f: &Fixture) -> Vec<Finding> {
        let table = RoleTable::default();
        Checker::new(&f.graph, &table).check_procedure(f.handler, &binding(f))
    }

    #[test]
    fn missing_setter_is_reported_at_terminal() {
        let mut f = fixture();
        let log = f.graph.add_parameter(f.handler, 1).unwrap();
        let ev = f.graph.add_call(f.handler, f.info, &[log]).unwrap();
        let text = f.graph.add_const(f.handler, ConstValue::Str("x".into()), None).unwrap();
        let done = f.graph.add_call(f.handler, f.msg, &[ev, text]).unwrap();
        f.graph.set_position(done, Position::new("h.go", 5, 2)).unwrap();

        let findings = run(&f);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MissingPropagation);
        assert_eq!(findings[0].node, Some(done));
        assert_eq!(findings[0].position, Some(Position::new("h.go", 5, 2)));
        assert_eq!(findings[0].marker, "ctx");
    }

    #[test]
    fn setter_in_chain_is_clean() {
        let mut f = fixture();
        let ctx = f.graph.add_parameter(f.handler, 0).unwrap();
        let log = f.graph.add_parameter(f.handler, 1).unwrap();
        let ev = f.graph.add_call(f.handler, f.info, &[log]).unwrap();
        let with_ctx = f.graph.add_call(f.handler, f.ctx, &[ev, ctx]).unwrap();
        f.graph.add_call(f.handler, f.msg, &[with_ctx]).unwrap();

        assert!(run(&f).is_empty());
    }

    #[test]
    fn deferred_terminal_is_checked() {
        let mut f = fixture();
        let log = f.graph.add_parameter(f.handler, 1).unwrap();
        let ev = f.graph.add_call(f.handler, f.info, &[log]).unwrap();
        let deferred = f.graph.add_defer(f.handler, f.msg, &[ev]).unwrap();

        let findings = run(&f);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].node, Some(deferred));
    }

    #[test]
    fn bypass_call_is_always_reported() {
        let mut f = fixture();
        let log = f.graph.add_parameter(f.handler, 1).unwrap();
        let call = f.graph.add_call(f.handler, f.print, &[log]).unwrap();

        let findings = run(&f);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::BypassCall);
        assert_eq!(findings[0].node, Some(call));
    }

    #[test]
    fn terminal_without_receiver_is_reported() {
        let mut f = fixture();
        f.graph.add_call(f.handler, f.msg, &[]).unwrap();
        assert_eq!(run(&f).len(), 1);
    }
}
