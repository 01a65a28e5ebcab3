//! Post-traversal profile resolution: cache first, then bulk requests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::db::cache::CacheStore;
use crate::error::Result;
use crate::graph::gate::RateGate;
use crate::provider::{GraphProvider, MAX_PROFILE_BATCH};
use crate::types::{NodeId, Profile};

// ---------------------------------------------------------------------------
// ResolvedProfiles
// ---------------------------------------------------------------------------

/// Profiles found for a set of ids. Ids without a profile are private or
/// unknown and render as their raw id.
#[derive(Debug, Clone, Default)]
pub struct ResolvedProfiles {
    profiles: HashMap<NodeId, Profile>,
}

impl ResolvedProfiles {
    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.get(id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Display name, falling back to the raw id.
    pub fn name<'a>(&'a self, id: &'a str) -> &'a str {
        self.profiles.get(id).map(|p| p.name.as_str()).unwrap_or(id)
    }

    /// `name (<url>)`, or `id (private profile)` when unresolved.
    pub fn identifier(&self, id: &str) -> String {
        match self.profiles.get(id) {
            Some(p) => format!("{} (<{}>)", p.name, p.url),
            None => format!("{id} (private profile)"),
        }
    }

    fn insert(&mut self, profile: Profile) {
        self.profiles.insert(profile.id.clone(), profile);
    }
}

impl FromIterator<Profile> for ResolvedProfiles {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        let mut out = Self::default();
        for p in iter {
            out.insert(p);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// ProfileResolver
// ---------------------------------------------------------------------------

pub struct ProfileResolver {
    provider: Arc<dyn GraphProvider>,
    cache: Arc<CacheStore>,
    gate: RateGate,
    cached_only: bool,
    batch_size: usize,
}

impl ProfileResolver {
    pub fn new(
        provider: Arc<dyn GraphProvider>,
        cache: Arc<CacheStore>,
        gate: RateGate,
        cached_only: bool,
    ) -> Self {
        Self {
            provider,
            cache,
            gate,
            cached_only,
            batch_size: MAX_PROFILE_BATCH,
        }
    }

    /// Override the request width (clamped to `1..=MAX_PROFILE_BATCH`).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_PROFILE_BATCH);
        self
    }

    pub async fn resolve(&self, ids: &BTreeSet<NodeId>) -> Result<ResolvedProfiles> {
        tracing::info!("Retrieving {} profiles...", ids.len());

        let mut resolved = ResolvedProfiles::default();
        let mut unresolved: Vec<NodeId> = Vec::new();
        for id in ids {
            match self.cache.get_profile(id)? {
                Some(profile) => {
                    tracing::debug!("Mapping {id}: {} (cache hit)", profile.name);
                    resolved.insert(profile);
                }
                None => unresolved.push(id.clone()),
            }
        }

        if unresolved.is_empty() {
            return Ok(resolved);
        }
        if self.cached_only {
            tracing::debug!(
                "Getting remaining profile data ({} entries) skipped, cache only",
                unresolved.len()
            );
            return Ok(resolved);
        }

        let total = unresolved.len();
        for (idx, chunk) in unresolved.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                "Getting profile data ({}/{total})\n\t{}",
                idx * self.batch_size,
                chunk.join(", ")
            );
            let profiles = {
                let _permit = self.gate.acquire().await?;
                self.provider.player_summaries(chunk).await?
            };
            for profile in profiles {
                self.cache.put_profile(&profile)?;
                tracing::debug!("Mapping {}: {}", profile.id, profile.name);
                resolved.insert(profile);
            }
        }

        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
