//! End-to-end search pipeline: traversal, summary, profile resolution, report.

use std::sync::Arc;

use crate::config::schema::CrawlConfig;
use crate::config::targets::resolve_targets;
use crate::db::cache::CacheStore;
use crate::error::{Result, SteamChainError};
use crate::graph::gate::RateGate;
use crate::graph::registry::{Find, FindRegistry};
use crate::graph::resolver::{ProfileResolver, ResolvedProfiles};
use crate::graph::traversal::Traversal;
use crate::observability::MetricsSnapshot;
use crate::provider::GraphProvider;
use crate::report::{render_find, render_summary};

/// Everything a finished search produced.
#[derive(Debug)]
pub struct SearchOutcome {
    /// Ordered by depth, then target id.
    pub finds: Vec<Find>,
    pub profiles: ResolvedProfiles,
    pub metrics: MetricsSnapshot,
}

impl SearchOutcome {
    pub fn find(&self, target: &str) -> Option<&Find> {
        self.finds.iter().find(|f| f.target == target)
    }
}

pub struct SearchPipeline {
    config: CrawlConfig,
    provider: Arc<dyn GraphProvider>,
    cache: Arc<CacheStore>,
}

impl SearchPipeline {
    pub fn new(config: CrawlConfig, provider: Arc<dyn GraphProvider>, cache: Arc<CacheStore>) -> Self {
        Self {
            config,
            provider,
            cache,
        }
    }

    /// Run the search from the configured initial node.
    ///
    /// Returns the first fatal traversal error; whatever was cached before it
    /// stays cached.
    pub async fn run(&self) -> Result<SearchOutcome> {
        let config = &self.config;
        let initial = config
            .initial_steam_id
            .clone()
            .ok_or_else(|| SteamChainError::Config("no initial steam id".into()))?;

        let targets = resolve_targets(&config.targets, &config.aliases);
        if targets.is_empty() {
            return Err(SteamChainError::Config(
                "target list resolved to no ids".into(),
            ));
        }

        let gate = RateGate::new(config.request_delay_duration(), config.simultaneous_requests);
        let registry = Arc::new(FindRegistry::new());
        let traversal = Traversal::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.cache),
            Arc::clone(&registry),
            gate.clone(),
            targets,
            config.traversal_options(),
        );

        traversal.run(&initial).await?;
        let metrics = traversal.metrics().snapshot();
        tracing::debug!("Traversal metrics: {}", metrics.to_json());

        let Some(summary) = render_summary(&registry, config.primary_target.as_deref()) else {
            tracing::info!(
                "No connections to any target at depth {} :(",
                config.max_depth
            );
            return Ok(SearchOutcome {
                finds: Vec::new(),
                profiles: ResolvedProfiles::default(),
                metrics,
            });
        };
        tracing::info!("{summary}");

        let resolver = ProfileResolver::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.cache),
            gate,
            config.cached_only.profiles(),
        );
        let profiles = resolver.resolve(&registry.related_ids(true)).await?;

        tracing::info!("Finally...");
        let finds = registry.snapshot();
        for find in &finds {
            tracing::info!("{}", render_find(find, &profiles));
            if find.history_len() > 0 {
                tracing::debug!(
                    "{} was first found deeper; improved {} time(s)",
                    find.target,
                    find.history_len()
                );
            }
        }

        Ok(SearchOutcome {
            finds,
            profiles,
            metrics,
        })
    }
}
