//! Read-through response cache backed by SQLite.
//!
//! Every lookup returns `Option<CacheEntry<T>>`: `None` for a key that was
//! never requested, `Some(CacheEntry::NoData)` for one that was requested and
//! came back empty. Both short-circuit the network.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::schema::initialize_database;
use crate::error::Result;
use crate::types::{CacheEntry, Friend, Profile};

// ---------------------------------------------------------------------------
// CacheStats
// ---------------------------------------------------------------------------

/// Row counts of the two cached relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub friend_lists: usize,
    /// Friend lists stored as "no data" (private profiles).
    pub private_friend_lists: usize,
    pub profiles: usize,
}

// ---------------------------------------------------------------------------
// SQL constants
// ---------------------------------------------------------------------------

const SELECT_FRIEND_LIST_SQL: &str = "SELECT response FROM friend_lists WHERE steam_id = ?1";

const INSERT_FRIEND_LIST_SQL: &str = "\
INSERT OR REPLACE INTO friend_lists (steam_id, response) VALUES (?1, ?2)";

const SELECT_PROFILE_SQL: &str = "SELECT response FROM profiles WHERE steam_id = ?1";

const INSERT_PROFILE_SQL: &str = "\
INSERT OR REPLACE INTO profiles (steam_id, response) VALUES (?1, ?2)";

/// Decode a stored friend-list row. A JSON `null` is also "no data".
pub fn decode_friend_list(raw: Option<String>) -> Result<CacheEntry<Vec<Friend>>> {
    match raw {
        None => Ok(CacheEntry::NoData),
        Some(raw) => {
            let friends: Option<Vec<Friend>> = serde_json::from_str(&raw)?;
            Ok(CacheEntry::from_option(friends))
        }
    }
}

// ---------------------------------------------------------------------------
// CacheStore
// ---------------------------------------------------------------------------

/// Persistent cache of friend-list and profile responses.
///
/// The connection sits behind a mutex so the store can be shared between
/// concurrently polled traversal branches. The lock is only held for the
/// duration of a single statement.
pub struct CacheStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Open (or create) the cache database at `db_path`.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = initialize_database(db_path)?;
        Ok(Self::from_connection(conn))
    }

    /// In-memory cache, discarded on drop.
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Wrap an already-initialized connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -------------------------------------------------------------------
    // Friend lists
    // -------------------------------------------------------------------

    pub fn get_friend_list(&self, steam_id: &str) -> Result<Option<CacheEntry<Vec<Friend>>>> {
        self.friend_list_row(steam_id)?
            .map(decode_friend_list)
            .transpose()
    }

    /// The stored row without decoding it: `None` for a miss, `Some(None)`
    /// for a row stored as "no data".
    pub fn friend_list_row(&self, steam_id: &str) -> Result<Option<Option<String>>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(SELECT_FRIEND_LIST_SQL)?;
        let row: Option<Option<String>> = stmt
            .query_row(params![steam_id], |row| row.get(0))
            .optional()?;
        Ok(row)
    }

    pub fn put_friend_list(&self, steam_id: &str, entry: CacheEntry<&[Friend]>) -> Result<()> {
        let raw = match entry {
            CacheEntry::Data(friends) => Some(serde_json::to_string(friends)?),
            CacheEntry::NoData => None,
        };
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(INSERT_FRIEND_LIST_SQL)?;
        stmt.execute(params![steam_id, raw])?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Profiles
    // -------------------------------------------------------------------

    pub fn get_profile(&self, steam_id: &str) -> Result<Option<Profile>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(SELECT_PROFILE_SQL)?;
        let raw: Option<String> = stmt
            .query_row(params![steam_id], |row| row.get(0))
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put_profile(&self, profile: &Profile) -> Result<()> {
        let raw = serde_json::to_string(profile)?;
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(INSERT_PROFILE_SQL)?;
        stmt.execute(params![profile.id, raw])?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Stats
    // -------------------------------------------------------------------

    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.lock();
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok(CacheStats {
            friend_lists: count("SELECT COUNT(*) FROM friend_lists")?,
            private_friend_lists: count(
                "SELECT COUNT(*) FROM friend_lists WHERE response IS NULL OR response = 'null'",
            )?,
            profiles: count("SELECT COUNT(*) FROM profiles")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> CacheStore {
        CacheStore::in_memory().unwrap()
    }

    #[test]
    fn unknown_friend_list_is_a_miss() {
        assert_eq!(store().get_friend_list("1").unwrap(), None);
    }

    #[test]
    fn no_data_is_distinct_from_miss() {
        let cache = store();
        cache.put_friend_list("1", CacheEntry::NoData).unwrap();
        assert_eq!(cache.get_friend_list("1").unwrap(), Some(CacheEntry::NoData));
        assert_eq!(cache.get_friend_list("2").unwrap(), None);
    }

    #[test]
    fn friend_list_round_trips() {
        let cache = store();
        let friends = vec![Friend::new("2"), Friend::with_relationship("3", "blocked")];
        cache
            .put_friend_list("1", CacheEntry::Data(friends.as_slice()))
            .unwrap();
        assert_eq!(
            cache.get_friend_list("1").unwrap(),
            Some(CacheEntry::Data(friends))
        );
    }

    #[test]
    fn json_null_reads_as_no_data() {
        let cache = store();
        cache
            .lock()
            .execute(
                "INSERT INTO friend_lists (steam_id, response) VALUES ('9', 'null')",
                [],
            )
            .unwrap();
        assert_eq!(cache.get_friend_list("9").unwrap(), Some(CacheEntry::NoData));
    }

    #[test]
    fn undecodable_row_is_found_but_fails_to_decode() {
        let cache = store();
        cache
            .lock()
            .execute(
                "INSERT INTO friend_lists (steam_id, response) VALUES ('9', 'not json')",
                [],
            )
            .unwrap();
        assert_eq!(
            cache.friend_list_row("9").unwrap(),
            Some(Some("not json".to_string()))
        );
        assert!(matches!(
            cache.get_friend_list("9"),
            Err(crate::error::SteamChainError::Json(_))
        ));
    }

    #[test]
    fn profile_round_trips() {
        let cache = store();
        let profile = Profile {
            id: "1".into(),
            name: "someone".into(),
            url: "https://steamcommunity.com/id/someone/".into(),
        };
        cache.put_profile(&profile).unwrap();
        assert_eq!(cache.get_profile("1").unwrap(), Some(profile));
        assert_eq!(cache.get_profile("2").unwrap(), None);
    }

    #[test]
    fn stats_count_rows() {
        let cache = store();
        cache.put_friend_list("1", CacheEntry::NoData).unwrap();
        cache
            .put_friend_list("2", CacheEntry::Data(&[Friend::new("1")][..]))
            .unwrap();
        cache
            .put_profile(&Profile {
                id: "1".into(),
                name: "a".into(),
                url: "u".into(),
            })
            .unwrap();

        assert_eq!(
            cache.stats().unwrap(),
            CacheStats {
                friend_lists: 2,
                private_friend_lists: 1,
                profiles: 1,
            }
        );
    }

    #[test]
    fn cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let path = path.to_str().unwrap();
        {
            let cache = CacheStore::open(path).unwrap();
            cache
                .put_friend_list("1", CacheEntry::Data(&[Friend::new("2")][..]))
                .unwrap();
        }
        let cache = CacheStore::open(path).unwrap();
        assert_eq!(
            cache.get_friend_list("1").unwrap(),
            Some(CacheEntry::Data(vec![Friend::new("2")]))
        );
    }
}
