//! Configuration: schema, layered loading, and target alias expansion.

pub mod loader;
pub mod schema;
pub mod targets;
