//! Property tests for join resolution and determinism.
//!
//! 1. A join carries the marker iff every non-nil edge does, and at least
//!    one such edge exists.
//! 2. Analysis of the same graph always yields the same report.
//! 3. Closure capture resolution behaves like a join over creation sites.

mod common;

use proptest::prelude::*;

use ctxprop_core::ConstValue;

use common::{Handler, Zerolog};

/// One incoming join edge: `None` is a nil literal, `Some(marked)` a fresh
/// builder chain with or without the setter.
fn arb_edges() -> impl Strategy<Value = Vec<Option<bool>>> {
    prop::collection::vec(prop::option::of(any::<bool>()), 1..6)
}

fn builder(z: &mut Zerolog, h: Handler, marked: bool) -> ctxprop_core::NodeId {
    let ev = z.info_on(h.proc, h.log);
    if marked {
        z.with_ctx(h.proc, ev, h.ctx)
    } else {
        ev
    }
}

fn join_graph(edges: &[Option<bool>]) -> Zerolog {
    let mut z = Zerolog::new();
    let h = z.handler("handler");
    let event = z.event;
    let values: Vec<_> = edges
        .iter()
        .map(|edge| match edge {
            Some(marked) => builder(&mut z, h, *marked),
            None => z.graph.add_const(h.proc, ConstValue::Nil, Some(event)).unwrap(),
        })
        .collect();
    let joined = z.graph.add_phi(h.proc, &values, Some(event)).unwrap();
    z.msg_at(h.proc, joined, 1);
    z
}

proptest! {
    #[test]
    fn join_law(edges in arb_edges()) {
        let z = join_graph(&edges);
        let eligible: Vec<bool> = edges.iter().flatten().copied().collect();
        let carries = !eligible.is_empty() && eligible.iter().all(|m| *m);

        prop_assert_eq!(z.analyze().is_clean(), carries);
    }

    #[test]
    fn analysis_is_deterministic(edges in arb_edges()) {
        let z = join_graph(&edges);
        prop_assert_eq!(z.analyze(), z.analyze());
    }

    #[test]
    fn capture_sites_join(sites in prop::collection::vec(any::<bool>(), 0..5)) {
        let mut z = Zerolog::new();
        let h = z.handler("handler");
        let event = z.event;
        let emit = z.closure(h.proc, "handler$1", vec![], &[event]);
        let captured = z.graph.add_capture_access(emit, 0).unwrap();
        z.msg_at(emit, captured, 1);

        for marked in &sites {
            let value = builder(&mut z, h, *marked);
            z.graph.add_make_closure(h.proc, emit, &[value]).unwrap();
        }

        let carries = !sites.is_empty() && sites.iter().all(|m| *m);
        prop_assert_eq!(z.analyze().is_clean(), carries);
    }
}
