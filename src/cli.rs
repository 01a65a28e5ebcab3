//! Command-line interface.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::config::loader::{apply_process_env, load_config};
use crate::config::schema::{CacheOnly, CrawlConfig, Verbosity};
use crate::db::cache::CacheStore;
use crate::error::{Result, SteamChainError};
use crate::observability::init_logging;
use crate::provider::steam::{SteamApi, SteamApiConfig};
use crate::search::{SearchOutcome, SearchPipeline};

/// How many friends separate you from a set of Steam accounts.
///
/// Flags override `steamchain.yaml` and the environment (`STEAM_API_KEY`,
/// `DEFAULT_INITIAL_STEAM_ID`, also read from `.env`).
#[derive(Debug, Parser)]
#[command(name = "steamchain", version, about)]
pub struct Cli {
    /// Config file (default: ./steamchain.yaml if present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Steam id to start from.
    #[arg(long)]
    pub initial_steam_id: Option<String>,

    /// SQLite response cache.
    #[arg(long)]
    pub db_file: Option<PathBuf>,

    /// Maximum number of connections to check. Default: 6
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Number of requests per batch. Default: 2
    #[arg(long)]
    pub simultaneous_requests: Option<usize>,

    /// Who to look for (Steam ids or aliases, comma-separated).
    /// Default: GabeNewell,OtherValveEmployees
    #[arg(long, num_args = 1..)]
    pub targets: Option<Vec<String>>,

    /// Seconds between request batches. Default: 200 requests / 5 minutes
    #[arg(long)]
    pub request_delay: Option<f64>,

    /// Shuffle each friend list before visiting it.
    #[arg(long)]
    pub shuffle_friends: bool,

    /// Only use cached responses for the given request kinds.
    #[arg(long, value_enum)]
    pub cached_only: Option<CacheOnly>,

    #[arg(long, value_enum)]
    pub verbosity: Option<Verbosity>,

    /// Chain length from which friends already on the chain are skipped.
    #[arg(long)]
    pub cycle_guard_min_chain: Option<usize>,
}

impl Cli {
    /// Apply the CLI layer over `config`.
    pub fn apply(&self, config: &mut CrawlConfig) {
        if let Some(id) = &self.initial_steam_id {
            config.initial_steam_id = Some(id.clone());
        }
        if let Some(path) = &self.db_file {
            config.db_file = path.clone();
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(n) = self.simultaneous_requests {
            config.simultaneous_requests = n;
        }
        if let Some(targets) = &self.targets {
            config.targets = targets.clone();
        }
        if let Some(delay) = self.request_delay {
            config.request_delay = delay;
        }
        if self.shuffle_friends {
            config.shuffle_friends = true;
        }
        if let Some(mode) = self.cached_only {
            config.cached_only = mode;
        }
        if let Some(v) = self.verbosity {
            config.verbosity = v;
        }
        if let Some(n) = self.cycle_guard_min_chain {
            config.cycle_guard_min_chain = n;
        }
    }
}

/// Merge file, environment, and CLI layers, then validate.
pub fn build_config(cli: &Cli) -> Result<CrawlConfig> {
    let cwd = std::env::current_dir()?;
    let mut config = load_config(cli.config.as_deref(), Some(&cwd))?;
    apply_process_env(&mut config);
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Entry point used by `main`.
pub async fn run(cli: Cli) -> Result<SearchOutcome> {
    let config = build_config(&cli)?;
    init_logging(config.verbosity);

    let api_key = match (&config.api_key, config.cached_only) {
        (Some(key), _) => key.clone(),
        (None, CacheOnly::All) => String::new(),
        (None, _) => {
            return Err(SteamChainError::Config(
                "STEAM_API_KEY is not set (use --cached-only all to run from the cache alone)"
                    .into(),
            ))
        }
    };

    let db_path = config.db_file.to_string_lossy().into_owned();
    let cache = Arc::new(CacheStore::open(&db_path)?);
    let stats = cache.stats()?;
    tracing::debug!(
        "Cache {db_path}: {} friend lists ({} private), {} profiles",
        stats.friend_lists,
        stats.private_friend_lists,
        stats.profiles
    );

    let provider = SteamApi::new(&SteamApiConfig {
        base_url: config.api_base_url.clone(),
        api_key,
        max_connections: config.simultaneous_requests,
        timeout: Duration::from_secs(config.request_timeout_secs),
    })?;

    SearchPipeline::new(config, Arc::new(provider), cache)
        .run()
        .await
}
