//! TypeId and TypeRegistry for host-program types.
//!
//! Every type in the analyzed program has a unique [`TypeId`] providing O(1)
//! identity comparison. The [`TypeRegistry`] interns [`HostType`]s so that
//! structurally equal types share an id, and pre-registers the handful of
//! basic types the value graph needs for literals and function values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::HostType;

/// Unique identifier for a type in the type registry.
///
/// The inner value is an index into the [`TypeRegistry`]'s type vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Pre-registered TypeId constants for built-in types.
impl TypeId {
    pub const BOOL: TypeId = TypeId(0);
    pub const INT: TypeId = TypeId(1);
    pub const STRING: TypeId = TypeId(2);
    pub const FUNC: TypeId = TypeId(3);
}

/// Registry of all types referenced by a value graph.
///
/// On construction, the registry pre-registers 4 built-in types:
/// - `TypeId(0)` = bool
/// - `TypeId(1)` = int
/// - `TypeId(2)` = string
/// - `TypeId(3)` = function signature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRegistry {
    /// Types indexed by TypeId.0
    types: Vec<HostType>,
}

impl TypeRegistry {
    /// Creates a new type registry with the built-in types pre-registered.
    pub fn new() -> Self {
        let types = vec![
            HostType::Basic {
                name: "bool".into(),
            },
            HostType::Basic { name: "int".into() },
            HostType::Basic {
                name: "string".into(),
            },
            HostType::Signature,
        ];

        TypeRegistry { types }
    }

    /// Interns a type, returning the existing [`TypeId`] when an equal type
    /// is already registered.
    pub fn intern(&mut self, ty: HostType) -> TypeId {
        if let Some(pos) = self.types.iter().position(|t| *t == ty) {
            return TypeId(pos as u32);
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Interns the named type `package.name`.
    pub fn named(&mut self, package: &str, name: &str) -> TypeId {
        self.intern(HostType::named(package, name))
    }

    /// Interns a pointer to `pointee`.
    ///
    /// Returns [`CoreError::TypeNotFound`] if `pointee` is not registered.
    pub fn pointer_to(&mut self, pointee: TypeId) -> Result<TypeId, CoreError> {
        if self.get(pointee).is_none() {
            return Err(CoreError::TypeNotFound { id: pointee });
        }
        Ok(self.intern(HostType::Pointer { pointee }))
    }

    /// Looks up a type by its [`TypeId`].
    pub fn get(&self, id: TypeId) -> Option<&HostType> {
        self.types.get(id.0 as usize)
    }

    /// Follows pointer types down to the first non-pointer type.
    ///
    /// Stops at the first unknown id and returns it unchanged.
    pub fn deref(&self, id: TypeId) -> TypeId {
        let mut current = id;
        // A registry can only hold as many pointer layers as it has types.
        for _ in 0..self.types.len() {
            match self.get(current) {
                Some(HostType::Pointer { pointee }) => current = *pointee,
                _ => break,
            }
        }
        current
    }

    /// Returns `(package, name)` of the named type behind any pointers.
    pub fn named_parts(&self, id: TypeId) -> Option<(&str, &str)> {
        self.get(self.deref(id)).and_then(HostType::as_named)
    }

    /// Number of registered types (including built-ins).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always `false`: built-ins are registered on construction.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
