//! Graph search: rate gate, find registry, traversal engine, profile resolver.

pub mod gate;
pub mod registry;
pub mod resolver;
pub mod traversal;
