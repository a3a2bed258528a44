//! Core error types for ctxprop-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of building and querying a value graph.

use crate::id::{NodeId, ProcId};
use crate::type_id::TypeId;
use thiserror::Error;

/// Errors produced while constructing a [`ValueGraph`](crate::graph::ValueGraph).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A TypeId was not found in the type registry.
    #[error("type not found: TypeId({id})", id = id.0)]
    TypeNotFound { id: TypeId },

    /// A node index was not found in the graph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// A procedure ID was not found.
    #[error("procedure not found: ProcId({id})", id = id.0)]
    ProcNotFound { id: ProcId },

    /// An operand edge failed validation.
    #[error("invalid operand: {reason}")]
    InvalidOperand { reason: String },
}
