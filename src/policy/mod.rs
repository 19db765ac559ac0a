//! Access policy and traversal budget definitions.

pub mod access;
pub mod budget;

pub use access::{resolve_access_mode, PolicyError};
pub use budget::TraversalPolicy;
