//! Steam Web API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{FriendListResponse, GraphProvider, MAX_PROFILE_BATCH};
use crate::error::ProviderError;
use crate::types::{Friend, NodeId, Profile};

pub const DEFAULT_BASE_URL: &str = "https://api.steampowered.com";

const FRIEND_LIST_PATH: &str = "/ISteamUser/GetFriendList/v1";
const PLAYER_SUMMARIES_PATH: &str = "/ISteamUser/GetPlayerSummaries/v2";

const USER_AGENT: &str = concat!(
    "steamchain/",
    env!("CARGO_PKG_VERSION"),
    " (degrees-of-separation research tool)"
);

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FriendListEnvelope {
    friendslist: Option<FriendListBody>,
}

#[derive(Deserialize)]
struct FriendListBody {
    #[serde(default)]
    friends: Vec<Friend>,
}

#[derive(Deserialize)]
struct PlayerSummariesEnvelope {
    response: PlayerSummariesBody,
}

#[derive(Deserialize)]
struct PlayerSummariesBody {
    #[serde(default)]
    players: Vec<Profile>,
}

/// Parse a `GetFriendList` body. A body without `friendslist` is a private
/// profile and yields `None`.
pub fn parse_friend_list(body: &str) -> Result<Option<Vec<Friend>>, ProviderError> {
    let envelope: FriendListEnvelope =
        serde_json::from_str(body).map_err(|source| ProviderError::Malformed {
            body: body.to_string(),
            source,
        })?;
    Ok(envelope.friendslist.map(|list| list.friends))
}

/// Parse a `GetPlayerSummaries` body.
pub fn parse_player_summaries(body: &str) -> Result<Vec<Profile>, ProviderError> {
    let envelope: PlayerSummariesEnvelope =
        serde_json::from_str(body).map_err(|source| ProviderError::Malformed {
            body: body.to_string(),
            source,
        })?;
    Ok(envelope.response.players)
}

// ---------------------------------------------------------------------------
// SteamApi
// ---------------------------------------------------------------------------

/// Connection settings for [`SteamApi`].
#[derive(Debug, Clone)]
pub struct SteamApiConfig {
    pub base_url: String,
    pub api_key: String,
    /// Idle connections kept per host; match the concurrency degree.
    pub max_connections: usize,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct SteamApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for SteamApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteamApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SteamApi {
    pub fn new(config: &SteamApiConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_connections)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get_text(&self, path: &str, params: &[(&str, &str)]) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl GraphProvider for SteamApi {
    async fn friend_list(&self, steam_id: &str) -> Result<FriendListResponse, ProviderError> {
        let body = self
            .get_text(FRIEND_LIST_PATH, &[("steamid", steam_id), ("relationship", "friend")])
            .await?;
        let friends = parse_friend_list(&body)?;
        Ok(FriendListResponse { friends, body })
    }

    async fn player_summaries(&self, steam_ids: &[NodeId]) -> Result<Vec<Profile>, ProviderError> {
        if steam_ids.len() > MAX_PROFILE_BATCH {
            return Err(ProviderError::Other(format!(
                "GetPlayerSummaries accepts at most {MAX_PROFILE_BATCH} ids, got {}",
                steam_ids.len()
            )));
        }
        let joined = steam_ids.join(",");
        let body = self
            .get_text(PLAYER_SUMMARIES_PATH, &[("steamids", joined.as_str())])
            .await?;
        parse_player_summaries(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
