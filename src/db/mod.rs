//! Persistence layer: SQLite schema and the response cache.

pub mod cache;
pub mod schema;
