//! Find bookkeeping: best depth per target and every chain that reached it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::types::{Chain, NodeId};

// ---------------------------------------------------------------------------
// Find
// ---------------------------------------------------------------------------

/// A discovered target.
///
/// `depth` is the best depth seen so far. `chains` holds every chain recorded
/// since that depth became the best one, including chains found later at
/// greater depths. When a shallower discovery replaces the record, the old
/// record is kept in `previous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Find {
    pub target: NodeId,
    pub depth: u32,
    pub chains: Vec<Chain>,
    pub previous: Option<Box<Find>>,
}

impl Find {
    fn new(target: &str, chain: Chain, depth: u32) -> Self {
        Self {
            target: target.to_string(),
            depth,
            chains: vec![chain],
            previous: None,
        }
    }

    /// The target id followed by every id in every chain, optionally
    /// continuing through superseded records. May contain duplicates.
    pub fn related_ids(&self, include_previous: bool) -> Vec<NodeId> {
        let mut ids = vec![self.target.clone()];
        ids.extend(self.chains.iter().flatten().cloned());
        if include_previous {
            if let Some(prev) = &self.previous {
                ids.extend(prev.related_ids(true));
            }
        }
        ids
    }

    /// Number of superseded records behind this one.
    pub fn history_len(&self) -> usize {
        let mut n = 0;
        let mut cur = self.previous.as_deref();
        while let Some(f) = cur {
            n += 1;
            cur = f.previous.as_deref();
        }
        n
    }
}

// ---------------------------------------------------------------------------
// FindUpdate
// ---------------------------------------------------------------------------

/// What [`FindRegistry::record`] did with a discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindUpdate {
    /// First time this target was reached.
    New,
    /// Shallower than the previous best; the record was replaced.
    Improved { previous_depth: u32 },
    /// Same or deeper; the chain was appended. `chains` is the new total.
    Appended { chains: usize },
}

// ---------------------------------------------------------------------------
// FindRegistry
// ---------------------------------------------------------------------------

/// Shared accumulator of finds, keyed by target id.
#[derive(Debug, Default)]
pub struct FindRegistry {
    finds: Mutex<BTreeMap<NodeId, Find>>,
}

impl FindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<NodeId, Find>> {
        self.finds.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record that `target` was reached at `depth` via `chain`.
    pub fn record(&self, target: &str, chain: &[NodeId], depth: u32) -> FindUpdate {
        let mut finds = self.lock();
        match finds.get_mut(target) {
            None => {
                finds.insert(target.to_string(), Find::new(target, chain.to_vec(), depth));
                FindUpdate::New
            }
            Some(prior) if depth < prior.depth => {
                let previous_depth = prior.depth;
                let old = std::mem::replace(prior, Find::new(target, chain.to_vec(), depth));
                prior.previous = Some(Box::new(old));
                FindUpdate::Improved { previous_depth }
            }
            Some(prior) => {
                prior.chains.push(chain.to_vec());
                FindUpdate::Appended {
                    chains: prior.chains.len(),
                }
            }
        }
    }

    pub fn get(&self, target: &str) -> Option<Find> {
        self.lock().get(target).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All finds, ordered by depth then target id.
    pub fn snapshot(&self) -> Vec<Find> {
        let mut finds: Vec<Find> = self.lock().values().cloned().collect();
        finds.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.target.cmp(&b.target)));
        finds
    }

    /// Smallest and largest best depth over all finds.
    pub fn depth_range(&self) -> Option<(u32, u32)> {
        let finds = self.lock();
        let min = finds.values().map(|f| f.depth).min()?;
        let max = finds.values().map(|f| f.depth).max()?;
        Some((min, max))
    }

    /// Every id that needs a display profile: targets and chain members.
    pub fn related_ids(&self, include_previous: bool) -> BTreeSet<NodeId> {
        self.lock()
            .values()
            .flat_map(|f| f.related_ids(include_previous))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
