//! Procedure declarations with closure and nesting support.
//!
//! [`ProcDef`] is the declaration metadata -- the procedure body lives as value
//! nodes owned by this procedure's ID in the flat value graph. Library
//! procedures the analyzed code calls into are declared the same way but own
//! no nodes.
//!
//! Closures are procedures with [`is_closure`](ProcDef::is_closure) set.
//! Nested procedures reference their lexically enclosing procedure via
//! [`parent`](ProcDef::parent).

use serde::{Deserialize, Serialize};

use crate::id::ProcId;
use crate::node::Position;
use crate::type_id::TypeId;

/// Method receiver declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receiver {
    pub name: String,
    pub ty: TypeId,
}

/// A single captured variable in a closure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    /// Original variable name in the enclosing scope.
    pub name: String,
    /// Type of the captured value as seen inside the closure.
    pub captured_type: TypeId,
}

/// Full procedure declaration: identity, signature, captures and nesting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcDef {
    /// Unique identity for this procedure.
    pub id: ProcId,
    /// Procedure name (method name for methods).
    pub name: String,
    /// Import path of the declaring package, `None` for synthetic procedures.
    pub package: Option<String>,
    /// Receiver, for methods.
    pub receiver: Option<Receiver>,
    /// Named, typed parameters in declaration order (receiver excluded).
    pub params: Vec<(String, TypeId)>,
    /// Declared result types. Empty for procedures returning nothing.
    pub results: Vec<TypeId>,
    /// Captured variables for closures (empty for non-closures).
    ///
    /// Inside the body, `CaptureAccess { index }` nodes reference this list
    /// by position. At the creation site, `MakeClosure { function }` takes the
    /// captured values as operands in the same order.
    pub captures: Vec<Capture>,
    /// `true` if this is a closure.
    pub is_closure: bool,
    /// For nested procedures, the lexically enclosing procedure.
    pub parent: Option<ProcId>,
    /// Declaration position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Position>,
}

impl ProcDef {
    /// Creates a top-level free function.
    pub fn function(
        id: ProcId,
        name: String,
        package: Option<String>,
        params: Vec<(String, TypeId)>,
        results: Vec<TypeId>,
    ) -> Self {
        ProcDef {
            id,
            name,
            package,
            receiver: None,
            params,
            results,
            captures: Vec::new(),
            is_closure: false,
            parent: None,
            pos: None,
        }
    }

    /// Creates a method with the given receiver.
    pub fn method(
        id: ProcId,
        name: String,
        package: Option<String>,
        receiver: Receiver,
        params: Vec<(String, TypeId)>,
        results: Vec<TypeId>,
    ) -> Self {
        ProcDef {
            receiver: Some(receiver),
            ..ProcDef::function(id, name, package, params, results)
        }
    }

    /// Creates a closure nested in `parent`.
    pub fn closure(
        id: ProcId,
        name: String,
        parent: ProcId,
        params: Vec<(String, TypeId)>,
        results: Vec<TypeId>,
        captures: Vec<Capture>,
    ) -> Self {
        ProcDef {
            id,
            name,
            package: None,
            receiver: None,
            params,
            results,
            captures,
            is_closure: true,
            parent: Some(parent),
            pos: None,
        }
    }

    /// Returns `true` if this procedure is a method.
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// Returns `true` if this procedure is nested inside another one.
    pub fn is_nested(&self) -> bool {
        self.parent.is_some()
    }

    /// Returns `true` if the procedure declares no results.
    pub fn returns_nothing(&self) -> bool {
        self.results.is_empty()
    }

    /// Receiver type, for methods.
    pub fn receiver_type(&self) -> Option<TypeId> {
        self.receiver.as_ref().map(|r| r.ty)
    }

    /// The single declared result, if there is exactly one.
    pub fn single_result(&self) -> Option<TypeId> {
        match self.results.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}
