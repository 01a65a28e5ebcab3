//! Configuration data structures for steamchain.
//!
//! Defines the YAML config format. Every field has a default so a partial
//! file (or no file at all) is valid; the CLI and environment layer on top.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SteamChainError};
use crate::graph::traversal::{TraversalOptions, DEFAULT_CYCLE_GUARD_MIN_CHAIN};
use crate::provider::steam::DEFAULT_BASE_URL;
use crate::types::NodeId;

/// Gabe Newell's public Steam id.
pub const GABE_NEWELL_STEAM_ID: &str = "76561197960287930";

// ---------------------------------------------------------------------------
// CacheOnly
// ---------------------------------------------------------------------------

/// Which request kinds may only be served from the cache.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum CacheOnly {
    All,
    #[default]
    None,
    #[value(name = "friends_only")]
    FriendsOnly,
    #[value(name = "profiles_only")]
    ProfilesOnly,
}

impl CacheOnly {
    pub fn friends(&self) -> bool {
        matches!(self, Self::All | Self::FriendsOnly)
    }

    pub fn profiles(&self) -> bool {
        matches!(self, Self::All | Self::ProfilesOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::None => "none",
            Self::FriendsOnly => "friends_only",
            Self::ProfilesOnly => "profiles_only",
        }
    }
}

impl std::fmt::Display for CacheOnly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Verbosity
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Critical,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
}

impl Verbosity {
    /// `tracing` has no level above `error`, so `critical` shares it.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Self::Critical | Self::Error => "error",
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

// ---------------------------------------------------------------------------
// CrawlConfig
// ---------------------------------------------------------------------------

/// Root configuration for a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Where the search starts. Required by the time a run begins.
    pub initial_steam_id: Option<NodeId>,

    /// SQLite response cache.
    pub db_file: PathBuf,

    pub max_depth: u32,

    /// Concurrency degree: batch width and in-flight request cap.
    pub simultaneous_requests: usize,

    /// Target ids or alias names; entries may be comma-separated lists.
    pub targets: Vec<String>,

    /// Seconds to wait before each batch of requests.
    pub request_delay: f64,

    pub shuffle_friends: bool,

    pub cached_only: CacheOnly,

    pub verbosity: Verbosity,

    /// Chain length from which a friend already on the chain is skipped.
    pub cycle_guard_min_chain: usize,

    /// Target that is called out separately in logs and the summary.
    pub primary_target: Option<NodeId>,

    /// Extra alias names for `targets`, merged over the built-in ones.
    pub aliases: BTreeMap<String, Vec<NodeId>>,

    pub api_base_url: String,

    pub request_timeout_secs: u64,

    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            initial_steam_id: None,
            db_file: PathBuf::from("steamchain.db"),
            max_depth: 6,
            simultaneous_requests: 2,
            targets: vec!["GabeNewell".to_string(), "OtherValveEmployees".to_string()],
            // Steam's recommendation: 200 requests per 5 minutes.
            request_delay: 200.0 / 5.0 / 60.0,
            shuffle_friends: false,
            cached_only: CacheOnly::None,
            verbosity: Verbosity::Info,
            cycle_guard_min_chain: DEFAULT_CYCLE_GUARD_MIN_CHAIN,
            primary_target: Some(GABE_NEWELL_STEAM_ID.to_string()),
            aliases: BTreeMap::new(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            api_key: None,
        }
    }
}

impl CrawlConfig {
    /// Reject settings the traversal cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.simultaneous_requests == 0 {
            return Err(SteamChainError::Config(
                "simultaneous_requests must be at least 1".into(),
            ));
        }
        if !self.request_delay.is_finite() || self.request_delay < 0.0 {
            return Err(SteamChainError::Config(format!(
                "request_delay must be a non-negative number of seconds, got {}",
                self.request_delay
            )));
        }
        if self.initial_steam_id.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err(SteamChainError::Config(
                "no initial steam id (pass --initial-steam-id or set DEFAULT_INITIAL_STEAM_ID)"
                    .into(),
            ));
        }
        Ok(())
    }

    pub fn request_delay_duration(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay.max(0.0))
    }

    pub fn traversal_options(&self) -> TraversalOptions {
        TraversalOptions {
            max_depth: self.max_depth,
            cycle_guard_min_chain: self.cycle_guard_min_chain,
            shuffle_friends: self.shuffle_friends,
            friends_cached_only: self.cached_only.friends(),
            primary_target: self.primary_target.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn defaults_match_documented_values() {
        let config = CrawlConfig::default();
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.simultaneous_requests, 2);
        assert_eq!(config.cached_only, CacheOnly::None);
        assert_eq!(config.cycle_guard_min_chain, 3);
        assert!((config.request_delay - 0.6667).abs() < 0.001);
        assert_eq!(config.targets, vec!["GabeNewell", "OtherValveEmployees"]);
    }

    #[test_case(CacheOnly::All, true, true)]
    #[test_case(CacheOnly::None, false, false)]
    #[test_case(CacheOnly::FriendsOnly, true, false)]
    #[test_case(CacheOnly::ProfilesOnly, false, true)]
    fn cache_only_modes(mode: CacheOnly, friends: bool, profiles: bool) {
        assert_eq!(mode.friends(), friends);
        assert_eq!(mode.profiles(), profiles);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "max_depth: 3\ncached_only: friends_only\naliases:\n  Devs: ['1', '2']\n";
        let config: CrawlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.cached_only, CacheOnly::FriendsOnly);
        assert_eq!(config.aliases["Devs"], vec!["1", "2"]);
        assert_eq!(config.simultaneous_requests, 2);
    }

    #[test]
    fn api_key_is_never_serialized() {
        let config = CrawlConfig {
            api_key: Some("secret".into()),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }

    #[test]
    fn validate_rejects_zero_width() {
        let config = CrawlConfig {
            initial_steam_id: Some("1".into()),
            simultaneous_requests: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SteamChainError::Config(_))));
    }

    #[test]
    fn validate_rejects_negative_delay() {
        let config = CrawlConfig {
            initial_steam_id: Some("1".into()),
            request_delay: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_initial_id() {
        assert!(CrawlConfig::default().validate().is_err());
        let config = CrawlConfig {
            initial_steam_id: Some("1".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn verbosity_directives() {
        assert_eq!(Verbosity::Critical.filter_directive(), "error");
        assert_eq!(Verbosity::Warning.filter_directive(), "warn");
        assert_eq!(Verbosity::Debug.filter_directive(), "debug");
    }

    #[test]
    fn traversal_options_follow_config() {
        let config = CrawlConfig {
            max_depth: 2,
            cached_only: CacheOnly::All,
            ..Default::default()
        };
        let opts = config.traversal_options();
        assert_eq!(opts.max_depth, 2);
        assert!(opts.friends_cached_only);
        assert_eq!(opts.primary_target.as_deref(), Some(GABE_NEWELL_STEAM_ID));
    }
}
