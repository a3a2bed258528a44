//! Edge types for the value graph.
//!
//! Edges run from the producer of a value to the node consuming it. Because
//! every value is produced exactly once, walking incoming edges of a node
//! yields its operands, which is the only direction the tracer ever walks.

use serde::{Deserialize, Serialize};

/// An operand relationship between two value nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueEdge {
    /// Positional operand `index` of the consuming node. See the operand
    /// layout table in [`ops`](crate::ops).
    Operand { index: u16 },

    /// The function value a call invokes. Only present on calls that go
    /// through a closure (immediately-invoked closures, bound methods) or an
    /// opaque function value.
    Callee,
}

impl ValueEdge {
    /// Returns the operand index, or `None` for the callee edge.
    pub fn operand_index(&self) -> Option<u16> {
        match self {
            ValueEdge::Operand { index } => Some(*index),
            ValueEdge::Callee => None,
        }
    }

    /// Returns `true` if this is the callee edge of a call.
    pub fn is_callee(&self) -> bool {
        matches!(self, ValueEdge::Callee)
    }
}
