//! Graph data providers.
//!
//! The traversal engine only depends on [`GraphProvider`]; [`steam`] talks to
//! the Steam Web API, tests plug in scripted in-memory providers.

pub mod steam;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{Friend, NodeId, Profile};

/// Most ids `GetPlayerSummaries` accepts in one request.
pub const MAX_PROFILE_BATCH: usize = 100;

/// A fetched friend list together with the raw payload it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendListResponse {
    /// `None` when the provider returned no list (private profile).
    pub friends: Option<Vec<Friend>>,
    pub body: String,
}

/// Source of friend lists and profile metadata.
#[async_trait]
pub trait GraphProvider: Send + Sync {
    /// Fetch the friend list of `steam_id`.
    async fn friend_list(&self, steam_id: &str) -> Result<FriendListResponse, ProviderError>;

    /// Fetch profiles for up to [`MAX_PROFILE_BATCH`] ids. Ids without a
    /// public profile are simply absent from the result.
    async fn player_summaries(&self, steam_ids: &[NodeId]) -> Result<Vec<Profile>, ProviderError>;
}
