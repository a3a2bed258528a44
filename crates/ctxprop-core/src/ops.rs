//! Op enums for the value graph.
//!
//! Each [`ValueOp`] describes the operation that produced a value node (or,
//! for `Store`, `Defer` and `Return`, an instruction that produces none).
//! Operands are not stored on the op; they are the node's incoming
//! [`ValueEdge`](crate::edge::ValueEdge)s, ordered by operand index.
//!
//! # Operand layout
//!
//! | op             | operands                                        |
//! |----------------|-------------------------------------------------|
//! | `Call`/`Defer` | args (receiver first for methods), optional callee edge |
//! | `Phi`          | one per incoming control-flow edge              |
//! | `Load`         | 0 = address                                     |
//! | `Store`        | 0 = address, 1 = stored value                   |
//! | `Wrap`         | 0 = inner value, 1 = index for index-like kinds |
//! | `MakeClosure`  | captured bindings, by capture index             |
//! | `Return`       | results                                         |

use serde::{Deserialize, Serialize};

use crate::id::ProcId;

/// A literal value. The tracer only distinguishes nil from everything else,
/// but index-address comparison needs the concrete value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Semantically transparent value wrappers.
///
/// Tracing passes straight through all of them to operand 0. The address
/// kinds also take part in store matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapKind {
    /// Struct field read: `x.f`.
    Field { field: u32 },
    /// Struct field address: `&x.f`.
    FieldAddr { field: u32 },
    /// Array/slice element read: `x[i]`.
    Index,
    /// Array/slice element address: `&x[i]`.
    IndexAddr,
    /// Map lookup: `m[k]`.
    Lookup,
    /// Type narrowing: `x.(T)`.
    TypeAssert,
    /// Component of a multi-result value.
    Extract { index: u32 },
    /// Boxing a concrete value into an interface.
    MakeInterface,
}

impl WrapKind {
    /// Returns `true` for the kinds that compute an address.
    pub fn is_address(&self) -> bool {
        matches!(self, WrapKind::FieldAddr { .. } | WrapKind::IndexAddr)
    }
}

/// Operations in the value graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValueOp {
    /// Procedure parameter at the given position of `ProcDef::params`.
    Parameter { index: u32 },

    /// A literal.
    Const { value: ConstValue },

    /// A call. `callee` is the statically known target, `None` for dynamic
    /// dispatch. Calls through a closure value carry the closure as a
    /// [`ValueEdge::Callee`](crate::edge::ValueEdge::Callee) operand; a
    /// closure created by `MakeClosure` resolves the static target.
    Call { callee: Option<ProcId> },

    /// A call deferred until procedure exit. Same layout as `Call`; produces
    /// no value.
    Defer { callee: Option<ProcId> },

    /// Merge of values flowing in from different control-flow predecessors.
    Phi,

    /// Read through an address.
    Load,

    /// Addressable local allocation.
    Alloc,

    /// Write of operand 1 to the address in operand 0.
    Store,

    /// Transparent wrapper; see [`WrapKind`].
    Wrap { kind: WrapKind },

    /// Instantiate the nested procedure `function` with captured bindings.
    MakeClosure { function: ProcId },

    /// Read captured variable `index` of the owning closure.
    CaptureAccess { index: u32 },

    /// Return from the owning procedure.
    Return,
}

impl ValueOp {
    /// Returns `true` if this op produces a value other nodes can consume.
    pub fn is_value(&self) -> bool {
        !matches!(self, ValueOp::Store | ValueOp::Defer { .. } | ValueOp::Return)
    }

    /// Returns `true` for the nil literal.
    pub fn is_nil(&self) -> bool {
        matches!(
            self,
            ValueOp::Const {
                value: ConstValue::Nil
            }
        )
    }

    /// Returns `true` for `Call` and `Defer`.
    pub fn is_call(&self) -> bool {
        matches!(self, ValueOp::Call { .. } | ValueOp::Defer { .. })
    }

    /// Short lowercase name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ValueOp::Parameter { .. } => "parameter",
            ValueOp::Const { .. } => "const",
            ValueOp::Call { .. } => "call",
            ValueOp::Defer { .. } => "defer",
            ValueOp::Phi => "phi",
            ValueOp::Load => "load",
            ValueOp::Alloc => "alloc",
            ValueOp::Store => "store",
            ValueOp::Wrap { .. } => "wrap",
            ValueOp::MakeClosure { .. } => "make_closure",
            ValueOp::CaptureAccess { .. } => "capture_access",
            ValueOp::Return => "return",
        }
    }
}
