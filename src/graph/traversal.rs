//! Depth-bounded, rate-limited, cache-aware friend-graph search.
//!
//! Each visited node is checked against the target set, then (depth
//! permitting) its friend list is read from the cache or fetched through the
//! [`RateGate`], filtered, and its children are visited in fixed-width
//! batches. A batch is always driven to completion before the next starts;
//! the first failure in a batch aborts the whole run once the batch settles.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use futures::future::{join_all, BoxFuture, FutureExt};
use rand::seq::SliceRandom;

use crate::db::cache::{decode_friend_list, CacheStore};
use crate::error::{ResponseContext, Result};
use crate::graph::gate::RateGate;
use crate::graph::registry::{FindRegistry, FindUpdate};
use crate::observability::{redact_secrets, CrawlMetrics};
use crate::provider::GraphProvider;
use crate::report::format_chain;
use crate::types::{CacheEntry, Chain, Friend, NodeId};

/// Chains shorter than this may revisit one of their own nodes.
pub const DEFAULT_CYCLE_GUARD_MIN_CHAIN: usize = 3;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TraversalOptions {
    pub max_depth: u32,
    /// Chain length from which the cycle guard applies.
    pub cycle_guard_min_chain: usize,
    pub shuffle_friends: bool,
    /// Never fetch friend lists; cache misses end the branch.
    pub friends_cached_only: bool,
    /// Target that gets its own log line when reached.
    pub primary_target: Option<NodeId>,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: 6,
            cycle_guard_min_chain: DEFAULT_CYCLE_GUARD_MIN_CHAIN,
            shuffle_friends: false,
            friends_cached_only: false,
            primary_target: None,
        }
    }
}

// ---------------------------------------------------------------------------
// FrontierMeta
// ---------------------------------------------------------------------------

/// Position of a visit among its siblings, linked up to the root. Only used
/// for progress output.
#[derive(Debug, Clone, Default)]
pub struct FrontierMeta {
    pub index: usize,
    pub siblings: usize,
    pub parent_from_cache: bool,
    pub parent: Option<Arc<FrontierMeta>>,
}

impl FrontierMeta {
    pub fn root() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn child(parent: &Arc<Self>, index: usize, siblings: usize, parent_from_cache: bool) -> Arc<Self> {
        Arc::new(Self {
            index,
            siblings,
            parent_from_cache,
            parent: Some(Arc::clone(parent)),
        })
    }

    /// `"2/5, 1/3"`: this visit's position first, then each ancestor's.
    pub fn progress(&self) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(self);
        while let Some(meta) = cur {
            let Some(parent) = meta.parent.as_deref() else {
                break;
            };
            parts.push(format!("{}/{}", meta.index + 1, meta.siblings));
            cur = Some(parent);
        }
        parts.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Neighbor filtering
// ---------------------------------------------------------------------------

/// Friends of `node` worth visiting, in their original order.
///
/// A friend is kept when its relationship is accepted, it is not `node`
/// itself, and, once `chain` has at least `cycle_guard_min_chain` entries,
/// it does not already appear in `chain`.
pub fn eligible_neighbors(
    node: &str,
    chain: &[NodeId],
    friends: &[Friend],
    cycle_guard_min_chain: usize,
) -> Vec<NodeId> {
    let guard = chain.len() >= cycle_guard_min_chain;
    friends
        .iter()
        .filter(|f| f.is_accepted())
        .filter(|f| f.steamid != node)
        .filter(|f| !guard || !chain.contains(&f.steamid))
        .map(|f| f.steamid.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// The search engine. Cheap to share behind an `Arc`; all mutable state
/// lives in the cache and the registry.
pub struct Traversal {
    provider: Arc<dyn GraphProvider>,
    cache: Arc<CacheStore>,
    registry: Arc<FindRegistry>,
    gate: RateGate,
    targets: HashSet<NodeId>,
    options: TraversalOptions,
    metrics: CrawlMetrics,
    fetch_locks: Mutex<HashMap<NodeId, Arc<tokio::sync::Mutex<()>>>>,
}

impl std::fmt::Debug for Traversal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traversal")
            .field("targets", &self.targets.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Traversal {
    pub fn new(
        provider: Arc<dyn GraphProvider>,
        cache: Arc<CacheStore>,
        registry: Arc<FindRegistry>,
        gate: RateGate,
        targets: impl IntoIterator<Item = NodeId>,
        options: TraversalOptions,
    ) -> Self {
        Self {
            provider,
            cache,
            registry,
            gate,
            targets: targets.into_iter().collect(),
            options,
            metrics: CrawlMetrics::new(),
            fetch_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<FindRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &CrawlMetrics {
        &self.metrics
    }

    /// Search outward from `initial` until every branch hits the depth limit
    /// or runs out of friends.
    pub async fn run(&self, initial: &str) -> Result<()> {
        tracing::info!(
            "Searching from {initial} for {} target(s), max depth {}",
            self.targets.len(),
            self.options.max_depth
        );
        self.visit(initial.to_string(), Vec::new(), 0, FrontierMeta::root())
            .await
    }

    fn visit(
        &self,
        node: NodeId,
        chain: Chain,
        depth: u32,
        meta: Arc<FrontierMeta>,
    ) -> BoxFuture<'_, Result<()>> {
        async move {
            let mut context = ResponseContext::None;
            let result = self.expand(&node, &chain, depth, &meta, &mut context).await;
            result.map_err(|e| e.at_node(&node, context))
        }
        .boxed()
    }

    async fn expand(
        &self,
        node: &str,
        chain: &[NodeId],
        depth: u32,
        meta: &Arc<FrontierMeta>,
        context: &mut ResponseContext,
    ) -> Result<()> {
        self.metrics.visited();
        if self.targets.contains(node) {
            self.record_find(node, chain, depth, meta);
        }

        if depth >= self.options.max_depth {
            return Ok(());
        }

        let progress = meta.progress();
        let Some((friends, from_cache)) = self.friends_of(node, depth, &progress, context).await?
        else {
            return Ok(());
        };

        // Private profiles have no friend list to expand.
        let Some(friends) = friends else {
            return Ok(());
        };

        let mut neighbors =
            eligible_neighbors(node, chain, &friends, self.options.cycle_guard_min_chain);
        if self.options.shuffle_friends {
            neighbors.shuffle(&mut rand::thread_rng());
        }
        if neighbors.is_empty() {
            return Ok(());
        }

        let mut child_chain = chain.to_vec();
        child_chain.push(node.to_string());

        let total = neighbors.len();
        let width = self.gate.width();
        for (batch_idx, batch) in neighbors.chunks(width).enumerate() {
            let visits = batch.iter().enumerate().map(|(i, friend)| {
                let child_meta = FrontierMeta::child(meta, batch_idx * width + i, total, from_cache);
                self.visit(friend.clone(), child_chain.clone(), depth + 1, child_meta)
            });

            let mut failures = join_all(visits)
                .await
                .into_iter()
                .filter_map(|r| r.err());
            if let Some(first) = failures.next() {
                for other in failures {
                    tracing::error!(
                        "Additional failure in aborted batch under {node}: {}",
                        redact_secrets(&other.to_string())
                    );
                }
                return Err(first);
            }
        }

        Ok(())
    }

    /// Friend list of `node` and whether it came from the cache. `None` when
    /// the node is skipped in cache-only mode.
    async fn friends_of(
        &self,
        node: &str,
        depth: u32,
        progress: &str,
        context: &mut ResponseContext,
    ) -> Result<Option<(Option<Vec<Friend>>, bool)>> {
        if let Some(raw) = self.cache.friend_list_row(node)? {
            return self.read_cached(node, depth, progress, raw, context).map(Some);
        }
        if self.options.friends_cached_only {
            tracing::debug!(
                "Getting friends of {node} ({progress}) (depth={depth}) (skipped, cache only)"
            );
            self.metrics.skipped();
            return Ok(None);
        }

        // Branches reaching the same node concurrently share one request.
        let lock = self.fetch_lock(node);
        let _guard = lock.lock().await;
        if let Some(raw) = self.cache.friend_list_row(node)? {
            return self.read_cached(node, depth, progress, raw, context).map(Some);
        }

        let response = {
            let _permit = self.gate.acquire().await?;
            self.metrics.request();
            tracing::debug!(
                "Getting friends of {node} ({progress}) (depth={depth}) (in flight: {})",
                self.gate.in_flight()
            );
            self.provider.friend_list(node).await?
        };
        *context = ResponseContext::Network {
            body: response.body.clone(),
        };
        let entry = match &response.friends {
            Some(friends) => CacheEntry::Data(friends.as_slice()),
            None => CacheEntry::NoData,
        };
        self.cache.put_friend_list(node, entry)?;
        self.release_fetch_lock(node);
        Ok(Some((response.friends, false)))
    }

    fn read_cached(
        &self,
        node: &str,
        depth: u32,
        progress: &str,
        raw: Option<String>,
        context: &mut ResponseContext,
    ) -> Result<(Option<Vec<Friend>>, bool)> {
        tracing::debug!("Getting friends of {node} ({progress}) (depth={depth}) (cache hit)");
        *context = ResponseContext::FromCache;
        self.metrics.cache_hit();
        let entry = decode_friend_list(raw)?;
        Ok((entry.into_option(), true))
    }

    fn fetch_lock(&self, node: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.fetch_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(node.to_string()).or_default())
    }

    // Waiters still holding the old lock re-check the cache and find the row.
    fn release_fetch_lock(&self, node: &str) {
        let mut locks = self.fetch_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(node);
    }

    fn record_find(&self, node: &str, chain: &[NodeId], depth: u32, meta: &FrontierMeta) {
        let pretty = format_chain(chain);
        if self.options.primary_target.as_deref() == Some(node) {
            let source = if meta.parent_from_cache { "cached" } else { "live" };
            tracing::info!("Found the primary target (!) at depth={depth} ({source})\n\tChain: {pretty}");
        }

        match self.registry.record(node, chain, depth) {
            FindUpdate::New => {
                tracing::info!("Found (NEW!) target {node} at depth={depth}\n\tChain: {pretty}");
            }
            FindUpdate::Improved { previous_depth } => {
                tracing::info!(
                    "Found target {node} at (NEW!) depth={depth} (prev. depth: {previous_depth})\n\tChain: {pretty}"
                );
            }
            FindUpdate::Appended { chains } => {
                tracing::info!(
                    "Found (yet another instance of) target {node} at depth={depth} (found so far: {chains})\n\tChain: {pretty}"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
