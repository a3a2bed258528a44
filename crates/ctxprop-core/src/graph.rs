//! ValueGraph: the per-program single-assignment value graph.
//!
//! [`ValueGraph`] is the single entry point for constructing and querying the
//! representation the tracer walks. It holds:
//! - a flat `StableGraph<ValueNode, ValueEdge>` in which every node is owned
//!   by exactly one procedure and edges run from a value to its consumer;
//! - the procedure declaration table, indexed by [`ProcId`];
//! - the [`TypeRegistry`] for the static types values carry.
//!
//! The graph is built once (by an IR supplier, or by tests through the
//! builder methods below) and is read-only afterwards. All queries the tracer
//! needs -- ordered operands, call sites, the store side table, return
//! points and closure creation sites -- live here so the checker never touches
//! petgraph directly.

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Direction, Directed};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::edge::ValueEdge;
use crate::error::CoreError;
use crate::id::{EdgeId, NodeId, ProcId};
use crate::node::{Position, ValueNode};
use crate::ops::{ConstValue, ValueOp, WrapKind};
use crate::procedure::{Capture, ProcDef, Receiver};
use crate::type_id::{TypeId, TypeRegistry};
use crate::types::HostType;

/// Operand list of a node; most nodes have at most a receiver and a few args.
pub type Operands = SmallVec<[NodeId; 4]>;

/// A resolved view of a `Call` or `Defer` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// The call node itself.
    pub node: NodeId,
    /// Statically resolved target: the op's declared callee, or the
    /// procedure of a closure invoked directly. `None` for dynamic dispatch.
    pub callee: Option<ProcId>,
    /// The `MakeClosure` node the call invokes, when it goes through one.
    pub closure: Option<NodeId>,
    /// Positional arguments; the receiver comes first for method calls.
    pub args: Operands,
    /// `true` for `Defer`.
    pub deferred: bool,
}

impl CallSite {
    /// The receiver of a method call, or the first argument otherwise.
    pub fn first_arg(&self) -> Option<NodeId> {
        self.args.first().copied()
    }
}

/// One entry of the store side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreRecord {
    /// The `Store` node.
    pub node: NodeId,
    /// Address written to.
    pub addr: NodeId,
    /// Value written.
    pub value: NodeId,
}

/// The value graph container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueGraph {
    /// Value nodes and operand edges.
    values: StableGraph<ValueNode, ValueEdge, Directed, u32>,
    /// Procedure declarations indexed by ProcId.0
    procedures: Vec<ProcDef>,
    /// Type registry for static value types
    pub types: TypeRegistry,
}

impl ValueGraph {
    /// Creates an empty graph with a fresh type registry.
    pub fn new() -> Self {
        ValueGraph {
            values: StableGraph::new(),
            procedures: Vec::new(),
            types: TypeRegistry::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Returns a read-only reference to the underlying petgraph graph.
    pub fn values(&self) -> &StableGraph<ValueNode, ValueEdge, Directed, u32> {
        &self.values
    }

    /// All procedure declarations, in `ProcId` order.
    pub fn procedures(&self) -> &[ProcDef] {
        &self.procedures
    }

    /// Looks up a procedure declaration.
    pub fn procedure(&self, id: ProcId) -> Option<&ProcDef> {
        self.procedures.get(id.0 as usize)
    }

    /// Mutable procedure lookup, e.g. to attach a declaration position.
    pub fn procedure_mut(&mut self, id: ProcId) -> Option<&mut ProcDef> {
        self.procedures.get_mut(id.0 as usize)
    }

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> Option<&ValueNode> {
        self.values.node_weight(id.into())
    }

    /// Looks up the op of a node.
    pub fn op(&self, id: NodeId) -> Option<&ValueOp> {
        self.node(id).map(|n| &n.op)
    }

    /// Static type of a node's value.
    pub fn type_of(&self, id: NodeId) -> Option<TypeId> {
        self.node(id).and_then(|n| n.ty)
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.values.node_count()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.values.edge_count()
    }

    /// Returns the number of declared procedures.
    pub fn procedure_count(&self) -> usize {
        self.procedures.len()
    }

    // -----------------------------------------------------------------------
    // Procedure declarations
    // -----------------------------------------------------------------------

    /// Declares a top-level free function.
    pub fn add_function(
        &mut self,
        name: &str,
        package: Option<&str>,
        params: Vec<(String, TypeId)>,
        results: Vec<TypeId>,
    ) -> ProcId {
        let id = self.next_proc_id();
        self.procedures.push(ProcDef::function(
            id,
            name.to_string(),
            package.map(str::to_string),
            params,
            results,
        ));
        id
    }

    /// Declares a method on `receiver`.
    pub fn add_method(
        &mut self,
        name: &str,
        package: Option<&str>,
        receiver: Receiver,
        params: Vec<(String, TypeId)>,
        results: Vec<TypeId>,
    ) -> ProcId {
        let id = self.next_proc_id();
        self.procedures.push(ProcDef::method(
            id,
            name.to_string(),
            package.map(str::to_string),
            receiver,
            params,
            results,
        ));
        id
    }

    /// Declares a closure nested in `parent`.
    ///
    /// Errors if the parent procedure does not exist.
    pub fn add_closure(
        &mut self,
        name: &str,
        parent: ProcId,
        params: Vec<(String, TypeId)>,
        results: Vec<TypeId>,
        captures: Vec<Capture>,
    ) -> Result<ProcId, CoreError> {
        if self.procedure(parent).is_none() {
            return Err(CoreError::ProcNotFound { id: parent });
        }
        let id = self.next_proc_id();
        self.procedures.push(ProcDef::closure(
            id,
            name.to_string(),
            parent,
            params,
            results,
            captures,
        ));
        Ok(id)
    }

    fn next_proc_id(&self) -> ProcId {
        ProcId(self.procedures.len() as u32)
    }

    fn require_proc(&self, id: ProcId) -> Result<&ProcDef, CoreError> {
        self.procedure(id).ok_or(CoreError::ProcNotFound { id })
    }

    fn require_node(&self, id: NodeId) -> Result<&ValueNode, CoreError> {
        self.node(id).ok_or(CoreError::NodeNotFound { id })
    }

    // -----------------------------------------------------------------------
    // Node and edge construction
    // -----------------------------------------------------------------------

    /// Adds a node owned by `owner`. Errors if the owner does not exist.
    pub fn add_node(
        &mut self,
        op: ValueOp,
        owner: ProcId,
        ty: Option<TypeId>,
    ) -> Result<NodeId, CoreError> {
        self.require_proc(owner)?;
        let idx = self.values.add_node(ValueNode::new(op, owner, ty));
        Ok(NodeId::from(idx))
    }

    /// Connects `from` as operand `index` of `to`.
    ///
    /// Both nodes must exist and `from` must produce a value.
    pub fn add_operand(&mut self, from: NodeId, to: NodeId, index: u16) -> Result<EdgeId, CoreError> {
        self.connect(from, to, ValueEdge::Operand { index })
    }

    /// Connects `function_value` as the callee operand of the call `call`.
    pub fn set_callee(&mut self, function_value: NodeId, call: NodeId) -> Result<EdgeId, CoreError> {
        if !self.require_node(call)?.op.is_call() {
            return Err(CoreError::InvalidOperand {
                reason: format!("node {} is not a call", call),
            });
        }
        self.connect(function_value, call, ValueEdge::Callee)
    }

    fn connect(&mut self, from: NodeId, to: NodeId, edge: ValueEdge) -> Result<EdgeId, CoreError> {
        let source = self.require_node(from)?;
        if !source.op.is_value() {
            return Err(CoreError::InvalidOperand {
                reason: format!("node {} ({}) produces no value", from, source.op.name()),
            });
        }
        self.require_node(to)?;
        let idx = self.values.add_edge(from.into(), to.into(), edge);
        Ok(EdgeId(idx.index() as u32))
    }

    /// Attaches a source position to a node.
    pub fn set_position(&mut self, id: NodeId, pos: Position) -> Result<(), CoreError> {
        let node = self
            .values
            .node_weight_mut(id.into())
            .ok_or(CoreError::NodeNotFound { id })?;
        node.pos = Some(pos);
        Ok(())
    }

    /// Removes an edge, returning its weight.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<ValueEdge, CoreError> {
        let idx = EdgeIndex::<u32>::new(id.0 as usize);
        self.values.remove_edge(idx).ok_or(CoreError::InvalidOperand {
            reason: format!("edge not found: EdgeId({})", id.0),
        })
    }

    fn add_with_operands(
        &mut self,
        op: ValueOp,
        owner: ProcId,
        ty: Option<TypeId>,
        operands: &[NodeId],
    ) -> Result<NodeId, CoreError> {
        let node = self.add_node(op, owner, ty)?;
        for (i, &operand) in operands.iter().enumerate() {
            self.add_operand(operand, node, i as u16)?;
        }
        Ok(node)
    }

    /// Type of a call returning `results`: the single result, a tuple for
    /// several, nothing for none.
    fn result_type(&mut self, results: &[TypeId]) -> Option<TypeId> {
        match results {
            [] => None,
            [only] => Some(*only),
            many => Some(self.types.intern(HostType::Tuple {
                elements: many.to_vec(),
            })),
        }
    }

    // -----------------------------------------------------------------------
    // Convenience builders
    // -----------------------------------------------------------------------

    /// Adds the `index`-th parameter of `owner`, typed from its declaration.
    pub fn add_parameter(&mut self, owner: ProcId, index: u32) -> Result<NodeId, CoreError> {
        let ty = self
            .require_proc(owner)?
            .params
            .get(index as usize)
            .map(|(_, ty)| *ty)
            .ok_or_else(|| CoreError::InvalidOperand {
                reason: format!("procedure {} has no parameter {}", owner, index),
            })?;
        self.add_node(ValueOp::Parameter { index }, owner, Some(ty))
    }

    /// Adds a literal.
    pub fn add_const(
        &mut self,
        owner: ProcId,
        value: ConstValue,
        ty: Option<TypeId>,
    ) -> Result<NodeId, CoreError> {
        self.add_node(ValueOp::Const { value }, owner, ty)
    }

    /// Adds a static call to `callee`, typed from the callee's results.
    pub fn add_call(&mut self, owner: ProcId, callee: ProcId, args: &[NodeId]) -> Result<NodeId, CoreError> {
        let results = self.require_proc(callee)?.results.clone();
        let ty = self.result_type(&results);
        self.add_with_operands(ValueOp::Call { callee: Some(callee) }, owner, ty, args)
    }

    /// Adds a dynamically dispatched call with no known target.
    pub fn add_dynamic_call(
        &mut self,
        owner: ProcId,
        args: &[NodeId],
        ty: Option<TypeId>,
    ) -> Result<NodeId, CoreError> {
        self.add_with_operands(ValueOp::Call { callee: None }, owner, ty, args)
    }

    /// Adds a call through the function value `function_value`.
    ///
    /// When the value is a `MakeClosure`, the call is typed from the
    /// closure's declared results.
    pub fn add_closure_call(
        &mut self,
        owner: ProcId,
        function_value: NodeId,
        args: &[NodeId],
    ) -> Result<NodeId, CoreError> {
        let target = match &self.require_node(function_value)?.op {
            ValueOp::MakeClosure { function } => Some(*function),
            _ => None,
        };
        let ty = match target {
            Some(function) => {
                let results = self.require_proc(function)?.results.clone();
                self.result_type(&results)
            }
            None => None,
        };
        let call = self.add_with_operands(ValueOp::Call { callee: None }, owner, ty, args)?;
        self.set_callee(function_value, call)?;
        Ok(call)
    }

    /// Adds a deferred static call.
    pub fn add_defer(&mut self, owner: ProcId, callee: ProcId, args: &[NodeId]) -> Result<NodeId, CoreError> {
        self.require_proc(callee)?;
        self.add_with_operands(ValueOp::Defer { callee: Some(callee) }, owner, None, args)
    }

    /// Adds a phi over `edges`. More edges can be added later with
    /// [`add_phi_edge`](Self::add_phi_edge) to close loops.
    pub fn add_phi(&mut self, owner: ProcId, edges: &[NodeId], ty: Option<TypeId>) -> Result<NodeId, CoreError> {
        self.add_with_operands(ValueOp::Phi, owner, ty, edges)
    }

    /// Appends an incoming edge to an existing phi.
    pub fn add_phi_edge(&mut self, phi: NodeId, value: NodeId) -> Result<EdgeId, CoreError> {
        if !matches!(self.require_node(phi)?.op, ValueOp::Phi) {
            return Err(CoreError::InvalidOperand {
                reason: format!("node {} is not a phi", phi),
            });
        }
        let next = self.operands(phi).len() as u16;
        self.add_operand(value, phi, next)
    }

    /// Adds a local allocation of a `ty` slot; the node's type is `*ty`.
    pub fn add_alloc(&mut self, owner: ProcId, ty: TypeId) -> Result<NodeId, CoreError> {
        let ptr = self.types.pointer_to(ty)?;
        self.add_node(ValueOp::Alloc, owner, Some(ptr))
    }

    /// Adds a load through `addr`.
    pub fn add_load(&mut self, owner: ProcId, addr: NodeId, ty: Option<TypeId>) -> Result<NodeId, CoreError> {
        self.add_with_operands(ValueOp::Load, owner, ty, &[addr])
    }

    /// Adds a store of `value` to `addr`.
    pub fn add_store(&mut self, owner: ProcId, addr: NodeId, value: NodeId) -> Result<NodeId, CoreError> {
        self.add_with_operands(ValueOp::Store, owner, None, &[addr, value])
    }

    /// Adds a wrapper around `inner`. Index-like kinds take `index` as their
    /// second operand.
    pub fn add_wrap(
        &mut self,
        owner: ProcId,
        kind: WrapKind,
        inner: NodeId,
        index: Option<NodeId>,
        ty: Option<TypeId>,
    ) -> Result<NodeId, CoreError> {
        match index {
            Some(index) => self.add_with_operands(ValueOp::Wrap { kind }, owner, ty, &[inner, index]),
            None => self.add_with_operands(ValueOp::Wrap { kind }, owner, ty, &[inner]),
        }
    }

    /// Instantiates closure `function` with `bindings`.
    pub fn add_make_closure(
        &mut self,
        owner: ProcId,
        function: ProcId,
        bindings: &[NodeId],
    ) -> Result<NodeId, CoreError> {
        self.require_proc(function)?;
        self.add_with_operands(ValueOp::MakeClosure { function }, owner, Some(TypeId::FUNC), bindings)
    }

    /// Reads captured variable `index` inside closure `owner`.
    pub fn add_capture_access(&mut self, owner: ProcId, index: u32) -> Result<NodeId, CoreError> {
        let ty = self
            .require_proc(owner)?
            .captures
            .get(index as usize)
            .map(|c| c.captured_type);
        self.add_node(ValueOp::CaptureAccess { index }, owner, ty)
    }

    /// Adds a return point.
    pub fn add_return(&mut self, owner: ProcId, results: &[NodeId]) -> Result<NodeId, CoreError> {
        self.add_with_operands(ValueOp::Return, owner, None, results)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Returns all nodes owned by a procedure, in creation (instruction) order.
    pub fn proc_nodes(&self, id: ProcId) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .values
            .node_indices()
            .filter(|&idx| self.values.node_weight(idx).is_some_and(|n| n.owner == id))
            .map(NodeId::from)
            .collect();
        nodes.sort();
        nodes
    }

    /// Positional operands of a node, ordered by operand index.
    pub fn operands(&self, id: NodeId) -> Operands {
        let idx: NodeIndex<u32> = id.into();
        let mut indexed: SmallVec<[(u16, NodeId); 4]> = self
            .values
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|edge_ref| {
                edge_ref
                    .weight()
                    .operand_index()
                    .map(|i| (i, NodeId::from(edge_ref.source())))
            })
            .collect();
        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, node)| node).collect()
    }

    /// Operand `index` of a node.
    pub fn operand(&self, id: NodeId, index: u16) -> Option<NodeId> {
        let idx: NodeIndex<u32> = id.into();
        self.values
            .edges_directed(idx, Direction::Incoming)
            .find_map(|edge_ref| match edge_ref.weight() {
                ValueEdge::Operand { index: i } if *i == index => Some(NodeId::from(edge_ref.source())),
                _ => None,
            })
    }

    /// The function value a call invokes, if it has a callee edge.
    pub fn callee_operand(&self, id: NodeId) -> Option<NodeId> {
        let idx: NodeIndex<u32> = id.into();
        self.values
            .edges_directed(idx, Direction::Incoming)
            .find(|edge_ref| edge_ref.weight().is_callee())
            .map(|edge_ref| NodeId::from(edge_ref.source()))
    }

    /// Resolves a `Call` or `Defer` node into a [`CallSite`].
    pub fn call_site(&self, id: NodeId) -> Option<CallSite> {
        let (declared, deferred) = match self.op(id)? {
            ValueOp::Call { callee } => (*callee, false),
            ValueOp::Defer { callee } => (*callee, true),
            _ => return None,
        };

        let closure = self
            .callee_operand(id)
            .filter(|&fv| matches!(self.op(fv), Some(ValueOp::MakeClosure { .. })));
        let closure_target = closure.and_then(|fv| match self.op(fv) {
            Some(ValueOp::MakeClosure { function }) => Some(*function),
            _ => None,
        });

        Some(CallSite {
            node: id,
            callee: declared.or(closure_target),
            closure,
            args: self.operands(id),
            deferred,
        })
    }

    /// The store side table of a procedure, in instruction order.
    pub fn stores(&self, id: ProcId) -> Vec<StoreRecord> {
        self.proc_nodes(id)
            .into_iter()
            .filter(|&n| matches!(self.op(n), Some(ValueOp::Store)))
            .filter_map(|n| {
                Some(StoreRecord {
                    node: n,
                    addr: self.operand(n, 0)?,
                    value: self.operand(n, 1)?,
                })
            })
            .collect()
    }

    /// All `Return` nodes of a procedure.
    pub fn returns(&self, id: ProcId) -> Vec<NodeId> {
        self.proc_nodes(id)
            .into_iter()
            .filter(|&n| matches!(self.op(n), Some(ValueOp::Return)))
            .collect()
    }

    /// All `MakeClosure` nodes in `parent` that instantiate `function`.
    pub fn closure_sites(&self, parent: ProcId, function: ProcId) -> Vec<NodeId> {
        self.proc_nodes(parent)
            .into_iter()
            .filter(|&n| matches!(self.op(n), Some(ValueOp::MakeClosure { function: f }) if *f == function))
            .collect()
    }
}

impl Default for ValueGraph {
    fn default() -> Self {
        Self::new()
    }
}
