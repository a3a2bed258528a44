//! Ambient marker bindings.
//!
//! A procedure is checked only if a marker is in scope: either one of its own
//! parameters has the marker type, or it is nested inside a procedure that
//! has one. Discovery runs in two passes: a direct parameter scan, then a
//! fixed-point propagation from parents to nested procedures.

use indexmap::IndexMap;
use serde::Serialize;

use ctxprop_core::graph::ValueGraph;
use ctxprop_core::id::ProcId;

use crate::classify::RoleClassifier;

/// The marker in scope for a procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbientBinding {
    /// Parameter name carrying the marker.
    pub name: String,
    /// Procedure declaring that parameter.
    pub origin: ProcId,
}

/// Bindings keyed by procedure, in `ProcId` order.
pub type Bindings = IndexMap<ProcId, AmbientBinding>;

/// Finds the ambient binding of every procedure that has one.
pub fn discover(graph: &ValueGraph, classifier: &dyn RoleClassifier) -> Bindings {
    let mut bindings = Bindings::new();

    for proc in graph.procedures() {
        let marker_param = proc
            .params
            .iter()
            .find(|(_, ty)| classifier.is_marker_type(&graph.types, *ty));
        if let Some((name, _)) = marker_param {
            bindings.insert(
                proc.id,
                AmbientBinding {
                    name: name.clone(),
                    origin: proc.id,
                },
            );
        }
    }

    let parents: IndexMap<ProcId, ProcId> = graph
        .procedures()
        .iter()
        .filter_map(|proc| proc.parent.map(|parent| (proc.id, parent)))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for (child, parent) in &parents {
            if bindings.contains_key(child) {
                continue;
            }
            if let Some(inherited) = bindings.get(parent).cloned() {
                tracing::trace!(%child, %parent, name = inherited.name.as_str(), "inheriting ambient binding");
                bindings.insert(*child, inherited);
                changed = true;
            }
        }
    }

    bindings.sort_keys();
    bindings
}

#[cfg(test)]
mod tests {
    use ctxprop_core::type_id::TypeId;

    use super::*;
    use crate::classify::RoleTable;

    #[test]
    fn direct_parameter_binding() {
        let mut graph = ValueGraph::new();
        let ctx = graph.types.named("context", "Context");
        let f = graph.add_function(
            "handler",
            None,
            vec![("id".into(), TypeId::INT), ("ctx".into(), ctx), ("other".into(), ctx)],
            vec![],
        );
        let g = graph.add_function("plain", None, vec![("id".into(), TypeId::INT)], vec![]);

        let bindings = discover(&graph, &RoleTable::default());
        assert_eq!(
            bindings.get(&f),
            Some(&AmbientBinding {
                name: "ctx".into(),
                origin: f
            })
        );
        assert!(!bindings.contains_key(&g));
    }

    #[test]
    fn pointer_to_marker_binds() {
        let mut graph = ValueGraph::new();
        let ctx = graph.types.named("context", "Context");
        let ctx_ptr = graph.types.pointer_to(ctx).unwrap();
        let f = graph.add_function("handler", None, vec![("pctx".into(), ctx_ptr)], vec![]);

        let bindings = discover(&graph, &RoleTable::default());
        assert_eq!(bindings[&f].name, "pctx");
    }

    #[test]
    fn nested_closures_inherit_in_any_declaration_order() {
        let mut graph = ValueGraph::new();
        let ctx = graph.types.named("context", "Context");
        let outer = graph.add_function("outer", None, vec![("ctx".into(), ctx)], vec![]);
        let mid = graph.add_closure("outer$1", outer, vec![], vec![], vec![]).unwrap();
        let inner = graph.add_closure("outer$1$1", mid, vec![], vec![], vec![]).unwrap();
        let own = graph
            .add_closure("outer$2", outer, vec![("rctx".into(), ctx)], vec![], vec![])
            .unwrap();

        let bindings = discover(&graph, &RoleTable::default());
        assert_eq!(bindings[&inner].origin, outer);
        assert_eq!(bindings[&mid].name, "ctx");
        assert_eq!(bindings[&own].name, "rctx");
        assert_eq!(bindings[&own].origin, own);
        assert_eq!(bindings.keys().copied().collect::<Vec<_>>(), vec![outer, mid, inner, own]);
    }

    #[test]
    fn unbound_parent_leaves_children_unbound() {
        let mut graph = ValueGraph::new();
        let outer = graph.add_function("outer", None, vec![], vec![]);
        graph.add_closure("outer$1", outer, vec![], vec![], vec![]).unwrap();

        assert!(discover(&graph, &RoleTable::default()).is_empty());
    }
}
