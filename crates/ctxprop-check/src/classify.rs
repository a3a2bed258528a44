//! Role classification of types and callees.
//!
//! [`RoleClassifier`] is the seam between the tracer and whatever logging
//! library is being checked. The tracer only ever asks these questions; it
//! never looks at type names itself. [`RoleTable`] answers them from a
//! [`ClassifierConfig`], which defaults to zerolog.

use serde::{Deserialize, Serialize};

use ctxprop_core::procedure::ProcDef;
use ctxprop_core::type_id::{TypeId, TypeRegistry};

use crate::role::Role;

/// Pure predicates over value types and callee declarations.
pub trait RoleClassifier {
    /// The role of a value of type `ty`. Pointer types classify as their
    /// element type.
    fn role_of(&self, types: &TypeRegistry, ty: TypeId) -> Option<Role>;

    /// The role of the single value `proc` returns. `None` unless the result
    /// list has exactly one entry and that entry has a role.
    fn returns_role(&self, types: &TypeRegistry, proc: &ProcDef) -> Option<Role> {
        proc.single_result().and_then(|ty| self.role_of(types, ty))
    }

    /// `true` if `proc` declares no results.
    fn returns_nothing(&self, proc: &ProcDef) -> bool {
        proc.returns_nothing()
    }

    /// `true` if `name` is the method that attaches the marker.
    fn is_marker_setter(&self, name: &str) -> bool;

    /// `true` if calling `proc` yields a value that already carries the
    /// marker, e.g. `zerolog.Ctx(ctx)`.
    fn is_ambient_marker_source(&self, proc: &ProcDef) -> bool;

    /// `true` if `proc` logs directly without going through a builder chain.
    fn is_bypass_call(&self, types: &TypeRegistry, proc: &ProcDef, receiver_role: Option<Role>) -> bool;

    /// `true` if `ty` is the marker type (`context.Context`), possibly behind
    /// pointers.
    fn is_marker_type(&self, types: &TypeRegistry, ty: TypeId) -> bool;

    /// Name of the setter, used in messages.
    fn setter_name(&self) -> &str;
}

/// Names the classifier matches against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Package declaring the three role types.
    pub types_package: String,
    pub builder_type: String,
    pub carrier_type: String,
    pub field_set_type: String,
    /// Method attaching the marker to a builder or field set.
    pub marker_setter: String,
    /// Free function returning a carrier that already holds the marker.
    pub ambient_source: String,
    pub ambient_packages: Vec<String>,
    /// Name prefix of direct-logging calls.
    pub bypass_prefix: String,
    /// Packages whose free functions with the bypass prefix log directly.
    pub bypass_packages: Vec<String>,
    pub marker_package: String,
    pub marker_type: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            types_package: "github.com/rs/zerolog".into(),
            builder_type: "Event".into(),
            carrier_type: "Logger".into(),
            field_set_type: "Context".into(),
            marker_setter: "Ctx".into(),
            ambient_source: "Ctx".into(),
            ambient_packages: vec![
                "github.com/rs/zerolog".into(),
                "github.com/rs/zerolog/log".into(),
            ],
            bypass_prefix: "Print".into(),
            bypass_packages: vec!["github.com/rs/zerolog/log".into()],
            marker_package: "context".into(),
            marker_type: "Context".into(),
        }
    }
}

/// Table-driven [`RoleClassifier`].
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    config: ClassifierConfig,
}

impl RoleTable {
    pub fn new(config: ClassifierConfig) -> Self {
        RoleTable { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn is_free_function_in(proc: &ProcDef, packages: &[String]) -> bool {
        !proc.is_method()
            && proc
                .package
                .as_deref()
                .is_some_and(|pkg| packages.iter().any(|p| p == pkg))
    }
}

impl RoleClassifier for RoleTable {
    fn role_of(&self, types: &TypeRegistry, ty: TypeId) -> Option<Role> {
        let (package, name) = types.named_parts(ty)?;
        if package != self.config.types_package {
            return None;
        }
        if name == self.config.builder_type {
            Some(Role::Builder)
        } else if name == self.config.carrier_type {
            Some(Role::Carrier)
        } else if name == self.config.field_set_type {
            Some(Role::FieldSet)
        } else {
            None
        }
    }

    fn is_marker_setter(&self, name: &str) -> bool {
        name == self.config.marker_setter
    }

    fn is_ambient_marker_source(&self, proc: &ProcDef) -> bool {
        proc.name == self.config.ambient_source
            && Self::is_free_function_in(proc, &self.config.ambient_packages)
    }

    fn is_bypass_call(&self, _types: &TypeRegistry, proc: &ProcDef, receiver_role: Option<Role>) -> bool {
        if !self.returns_nothing(proc) || !proc.name.starts_with(&self.config.bypass_prefix) {
            return false;
        }
        receiver_role == Some(Role::Carrier) || Self::is_free_function_in(proc, &self.config.bypass_packages)
    }

    fn is_marker_type(&self, types: &TypeRegistry, ty: TypeId) -> bool {
        matches!(
            types.named_parts(ty),
            Some((package, name)) if package == self.config.marker_package && name == self.config.marker_type
        )
    }

    fn setter_name(&self) -> &str {
        &self.config.marker_setter
    }
}
