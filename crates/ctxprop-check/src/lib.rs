//! Marker-propagation checking over a value graph.
//!
//! Given a [`ValueGraph`](ctxprop_core::ValueGraph) and a [`RoleClassifier`],
//! [`analyze`] finds every logging chain that terminates without the ambient
//! request context having been attached, and every direct logging call that
//! bypasses the chain altogether.

pub mod ambient;
pub mod analysis;
pub mod classify;
pub mod config;
pub mod directive;
pub mod driver;
pub mod report;
pub mod resolve;
pub mod role;
pub mod tracer;

pub use ambient::{discover, AmbientBinding, Bindings};
pub use analysis::{analyze, analyze_with, AnalysisOptions, TEST_FILE_SUFFIX};
pub use classify::{ClassifierConfig, RoleClassifier, RoleTable};
pub use config::{CheckerConfig, ConfigError};
pub use directive::{DirectiveIndex, IgnoreMap, NoSuppression, Suppress, DEFAULT_DIRECTIVE};
pub use driver::Checker;
pub use report::{Finding, FindingKind, Report, Reporter};
pub use resolve::{Resolver, Visited};
pub use role::Role;
pub use tracer::{Outcome, RoleTracer, TraceContext, TracerRegistry};
