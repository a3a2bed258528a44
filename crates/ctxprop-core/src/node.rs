//! Value nodes and source positions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::ProcId;
use crate::ops::ValueOp;
use crate::type_id::TypeId;

/// A source location: file path plus 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Position {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A node in the value graph, wrapping an operation with ownership metadata.
///
/// All nodes live in a single flat `StableGraph`. Procedure boundaries are
/// represented via the `owner` field -- a procedure's instructions are the
/// nodes with `owner == proc_id`, in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueNode {
    /// The operation that produced this node.
    pub op: ValueOp,
    /// Which procedure owns this node.
    pub owner: ProcId,
    /// Static type of the produced value. `None` for instructions that
    /// produce no value and for calls returning nothing.
    pub ty: Option<TypeId>,
    /// Source position, when the supplier knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Position>,
}

impl ValueNode {
    /// Creates a node with no source position.
    pub fn new(op: ValueOp, owner: ProcId, ty: Option<TypeId>) -> Self {
        ValueNode {
            op,
            owner,
            ty,
            pos: None,
        }
    }
}
