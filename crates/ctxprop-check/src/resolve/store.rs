//! Store matching for reads through addresses.
//!
//! A `Load` or `Alloc` holds whatever the owning procedure stored at an
//! equivalent address. Two addresses are equivalent if they are the same
//! node, field addresses of the same field on the same base, or index
//! addresses on the same base with equal constant indices.

use std::collections::HashSet;

use ctxprop_core::graph::ValueGraph;
use ctxprop_core::id::{NodeId, ProcId};
use ctxprop_core::ops::{ValueOp, WrapKind};

/// Values `owner` stores at an address equivalent to `addr`, skipping
/// stores whose value reads back from that same address.
pub fn stored_values(graph: &ValueGraph, owner: ProcId, addr: NodeId) -> Vec<NodeId> {
    graph
        .stores(owner)
        .into_iter()
        .filter(|store| addresses_match(graph, store.addr, addr))
        .filter(|store| !loads_from(graph, store.value, addr, &mut HashSet::new()))
        .map(|store| store.value)
        .collect()
}

/// Structural address equivalence.
pub fn addresses_match(graph: &ValueGraph, a: NodeId, b: NodeId) -> bool {
    if a == b {
        return true;
    }
    match (graph.op(a), graph.op(b)) {
        (
            Some(ValueOp::Wrap {
                kind: WrapKind::FieldAddr { field: fa },
            }),
            Some(ValueOp::Wrap {
                kind: WrapKind::FieldAddr { field: fb },
            }),
        ) => fa == fb && same_operand(graph, a, b, 0),
        (
            Some(ValueOp::Wrap {
                kind: WrapKind::IndexAddr,
            }),
            Some(ValueOp::Wrap {
                kind: WrapKind::IndexAddr,
            }),
        ) => same_operand(graph, a, b, 0) && constant_indices_equal(graph, a, b),
        _ => false,
    }
}

fn same_operand(graph: &ValueGraph, a: NodeId, b: NodeId, index: u16) -> bool {
    match (graph.operand(a, index), graph.operand(b, index)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn constant_indices_equal(graph: &ValueGraph, a: NodeId, b: NodeId) -> bool {
    let constant = |node: NodeId| match graph.operand(node, 1).and_then(|i| graph.op(i)) {
        Some(ValueOp::Const { value }) => Some(value),
        _ => None,
    };
    match (constant(a), constant(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// `true` if `value` reads from `addr` along its receiver, join or load
/// chain, e.g. `*p = (*p).Str("k", "v")`.
pub fn loads_from(graph: &ValueGraph, value: NodeId, addr: NodeId, seen: &mut HashSet<NodeId>) -> bool {
    if !seen.insert(value) {
        return false;
    }
    match graph.op(value) {
        Some(ValueOp::Load) => match graph.operand(value, 0) {
            Some(inner) => addresses_match(graph, inner, addr) || loads_from(graph, inner, addr, seen),
            None => false,
        },
        Some(ValueOp::Call { .. }) => match graph.operand(value, 0) {
            Some(receiver) => loads_from(graph, receiver, addr, seen),
            None => false,
        },
        Some(ValueOp::Phi) => graph
            .operands(value)
            .into_iter()
            .any(|edge| loads_from(graph, edge, addr, seen)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use ctxprop_core::ops::ConstValue;
    use ctxprop_core::type_id::TypeId;

    use super::*;

    #[test]
    fn field_addresses_match_on_base_and_field() {
        let mut graph = ValueGraph::new();
        let f = graph.add_function("f", None, vec![], vec![]);
        let base = graph.add_alloc(f, TypeId::INT).unwrap();
        let other = graph.add_alloc(f, TypeId::INT).unwrap();

        let a = graph.add_wrap(f, WrapKind::FieldAddr { field: 1 }, base, None, None).unwrap();
        let b = graph.add_wrap(f, WrapKind::FieldAddr { field: 1 }, base, None, None).unwrap();
        let c = graph.add_wrap(f, WrapKind::FieldAddr { field: 2 }, base, None, None).unwrap();
        let d = graph.add_wrap(f, WrapKind::FieldAddr { field: 1 }, other, None, None).unwrap();

        assert!(addresses_match(&graph, a, a));
        assert!(addresses_match(&graph, a, b));
        assert!(!addresses_match(&graph, a, c));
        assert!(!addresses_match(&graph, a, d));
    }

    #[test]
    fn index_addresses_need_equal_constants() {
        let mut graph = ValueGraph::new();
        let f = graph.add_function("f", None, vec![("i".into(), TypeId::INT)], vec![]);
        let base = graph.add_alloc(f, TypeId::INT).unwrap();
        let zero = graph.add_const(f, ConstValue::Int(0), Some(TypeId::INT)).unwrap();
        let zero_again = graph.add_const(f, ConstValue::Int(0), Some(TypeId::INT)).unwrap();
        let one = graph.add_const(f, ConstValue::Int(1), Some(TypeId::INT)).unwrap();
        let dynamic = graph.add_parameter(f, 0).unwrap();

        let a = graph.add_wrap(f, WrapKind::IndexAddr, base, Some(zero), None).unwrap();
        let b = graph.add_wrap(f, WrapKind::IndexAddr, base, Some(zero_again), None).unwrap();
        let c = graph.add_wrap(f, WrapKind::IndexAddr, base, Some(one), None).unwrap();
        let d = graph.add_wrap(f, WrapKind::IndexAddr, base, Some(dynamic), None).unwrap();
        let e = graph.add_wrap(f, WrapKind::IndexAddr, base, Some(dynamic), None).unwrap();

        assert!(addresses_match(&graph, a, b));
        assert!(!addresses_match(&graph, a, c));
        assert!(!addresses_match(&graph, d, e));
    }

    #[test]
    fn self_referential_store_is_skipped() {
        let mut graph = ValueGraph::new();
        let f = graph.add_function("f", None, vec![("v".into(), TypeId::INT)], vec![]);
        let slot = graph.add_alloc(f, TypeId::INT).unwrap();
        let v = graph.add_parameter(f, 0).unwrap();
        graph.add_store(f, slot, v).unwrap();

        let load = graph.add_load(f, slot, Some(TypeId::INT)).unwrap();
        let derived = graph.add_dynamic_call(f, &[load], Some(TypeId::INT)).unwrap();
        graph.add_store(f, slot, derived).unwrap();

        assert!(loads_from(&graph, derived, slot, &mut HashSet::new()));
        assert_eq!(stored_values(&graph, f, slot), vec![v]);
    }

    #[test]
    fn cyclic_join_terminates() {
        let mut graph = ValueGraph::new();
        let f = graph.add_function("f", None, vec![], vec![]);
        let slot = graph.add_alloc(f, TypeId::INT).unwrap();
        let phi = graph.add_phi(f, &[], Some(TypeId::INT)).unwrap();
        graph.add_phi_edge(phi, phi).unwrap();

        assert!(!loads_from(&graph, phi, slot, &mut HashSet::new()));
    }
}
