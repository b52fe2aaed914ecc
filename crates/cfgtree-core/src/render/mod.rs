pub mod outline;

pub use outline::{outline, OutlineOptions};
