pub mod edge;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod ops;
pub mod procedure;
pub mod type_id;
pub mod types;

// Re-export commonly used types
pub use edge::ValueEdge;
pub use error::CoreError;
pub use graph::{CallSite, StoreRecord, ValueGraph};
pub use id::{EdgeId, NodeId, ProcId};
pub use node::{Position, ValueNode};
pub use ops::{ConstValue, ValueOp, WrapKind};
pub use procedure::{Capture, ProcDef, Receiver};
pub use type_id::{TypeId, TypeRegistry};
pub use types::HostType;
