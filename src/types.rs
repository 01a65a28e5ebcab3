//! Core domain types for steamchain.
//!
//! Field names on the wire types mirror the Steam Web API so that cached
//! responses round-trip through the database unchanged.

use serde::{Deserialize, Serialize};

/// Opaque Steam account identifier (64-bit id kept as its decimal string).
pub type NodeId = String;

/// Path of node ids from the initial node up to, but excluding, a target.
pub type Chain = Vec<NodeId>;

/// The only relationship kind that is followed during traversal.
pub const ACCEPTED_RELATIONSHIP: &str = "friend";

// ---------------------------------------------------------------------------
// Friend
// ---------------------------------------------------------------------------

/// One entry of a `GetFriendList` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub steamid: NodeId,
    pub relationship: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend_since: Option<i64>,
}

impl Friend {
    /// A confirmed friend edge pointing at `steamid`.
    pub fn new(steamid: impl Into<NodeId>) -> Self {
        Self {
            steamid: steamid.into(),
            relationship: ACCEPTED_RELATIONSHIP.to_string(),
            friend_since: None,
        }
    }

    /// Same as [`Friend::new`] but with an arbitrary relationship kind.
    pub fn with_relationship(steamid: impl Into<NodeId>, relationship: impl Into<String>) -> Self {
        Self {
            steamid: steamid.into(),
            relationship: relationship.into(),
            friend_since: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.relationship == ACCEPTED_RELATIONSHIP
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Display data for a node, as returned by `GetPlayerSummaries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "steamid")]
    pub id: NodeId,
    #[serde(rename = "personaname")]
    pub name: String,
    #[serde(rename = "profileurl")]
    pub url: String,
}

// ---------------------------------------------------------------------------
// Cache entries
// ---------------------------------------------------------------------------

/// A stored response. `NoData` means the request was made and returned
/// nothing (e.g. a private friend list); it is distinct from a cache miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry<T> {
    Data(T),
    NoData,
}

impl<T> CacheEntry<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Data(v),
            None => Self::NoData,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Data(v) => Some(v),
            Self::NoData => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
