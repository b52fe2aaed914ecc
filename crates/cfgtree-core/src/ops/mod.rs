pub mod tree;

pub use tree::{Change, Tree, UpdateOrigin};
