pub mod kind;
pub mod node;
pub mod options;
pub mod value;

pub use kind::{ControlSpec, NodeKind};
pub use node::{Cascade, Node, NodeId};
pub use options::{Align, FileType, NodeOption};
pub use value::{describe, Validator, Value, ValueClass};
