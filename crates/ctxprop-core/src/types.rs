//! Static types of the host program, as seen by the tracer.
//!
//! The tracer never reasons about type structure beyond three questions:
//! "which named type is this (looking through pointers)?", "is this the
//! marker type?" and "what does this procedure return?". [`HostType`] keeps
//! exactly the shape needed to answer them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::type_id::TypeId;

/// A static type in the analyzed program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostType {
    /// A predeclared type (`bool`, `int`, `string`, ...).
    Basic { name: String },

    /// A named type declared in a package, e.g. `github.com/rs/zerolog.Event`.
    Named { package: String, name: String },

    /// Pointer to another type.
    Pointer { pointee: TypeId },

    /// A function signature. Parameter and result lists live on the
    /// procedure declaration, so the type only records the kind.
    Signature,

    /// Multiple results of a call, consumed through `Extract` wrappers.
    Tuple { elements: Vec<TypeId> },
}

impl HostType {
    /// Convenience constructor for a named type.
    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        HostType::Named {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Returns `(package, name)` if this is a named type.
    pub fn as_named(&self) -> Option<(&str, &str)> {
        match self {
            HostType::Named { package, name } => Some((package, name)),
            _ => None,
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Basic { name } => write!(f, "{}", name),
            HostType::Named { package, name } => write!(f, "{}.{}", package, name),
            HostType::Pointer { pointee } => write!(f, "*{}", pointee),
            HostType::Signature => write!(f, "func"),
            HostType::Tuple { elements } => write!(f, "tuple/{}", elements.len()),
        }
    }
}
