//! SQLite schema initialization for the steamchain response cache.
//!
//! Two independent relations are kept, one per request kind. Both store the
//! raw provider response as JSON so a later run can replay it without
//! touching the network.

use rusqlite::Connection;

// ---------------------------------------------------------------------------
// DDL constants
// ---------------------------------------------------------------------------

/// `response` is NULL when the request was made but returned no friend list
/// (private profile). A missing row means the request was never made.
const CREATE_FRIEND_LISTS: &str = "\
CREATE TABLE IF NOT EXISTS friend_lists (
  steam_id TEXT PRIMARY KEY,
  response TEXT,
  fetched_at INTEGER DEFAULT (strftime('%s','now'))
)";

const CREATE_PROFILES: &str = "\
CREATE TABLE IF NOT EXISTS profiles (
  steam_id TEXT PRIMARY KEY,
  response TEXT NOT NULL,
  fetched_at INTEGER DEFAULT (strftime('%s','now'))
)";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Open (or create) the SQLite database at `db_path` and apply the schema.
///
/// The returned connection has WAL mode and synchronous NORMAL configured.
/// Pass `":memory:"` for a throwaway cache.
///
/// # Errors
///
/// Returns a `rusqlite::Error` if the database cannot be opened or any DDL
/// statement fails.
pub fn initialize_database(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(CREATE_FRIEND_LISTS)?;
    conn.execute_batch(CREATE_PROFILES)?;

    Ok(conn)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
