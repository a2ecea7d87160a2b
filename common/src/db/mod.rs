pub mod core;
pub mod indices;
pub mod parser;
pub mod writer;

pub use core::{Design, Net};
pub use indices::NetId;
