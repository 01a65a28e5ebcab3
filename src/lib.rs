//! steamchain: find how few friend hops separate a Steam account from a set
//! of target accounts.
//!
//! A depth-bounded concurrent search over Steam friend lists, rate limited
//! and backed by a SQLite response cache so repeated runs stay cheap.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod observability;
pub mod provider;
pub mod report;
pub mod search;
pub mod types;
