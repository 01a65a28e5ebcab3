//! Scripted in-memory provider shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use steamchain::db::cache::CacheStore;
use steamchain::error::ProviderError;
use steamchain::graph::gate::RateGate;
use steamchain::graph::registry::FindRegistry;
use steamchain::graph::traversal::{Traversal, TraversalOptions};
use steamchain::provider::{FriendListResponse, GraphProvider};
use steamchain::types::{Friend, NodeId, Profile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(NodeId),
    End(NodeId),
}

/// Friend graph backed by a map. Unknown nodes behave like private profiles.
#[derive(Default)]
pub struct MapProvider {
    graph: HashMap<NodeId, Vec<Friend>>,
    failing: HashSet<NodeId>,
    latency: Duration,
    calls: Mutex<Vec<NodeId>>,
    profile_calls: Mutex<Vec<Vec<NodeId>>>,
    events: Mutex<Vec<Event>>,
    starts: Mutex<Vec<(NodeId, Instant)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MapProvider {
    pub fn new(edges: &[(&str, &[&str])]) -> Self {
        let graph = edges
            .iter()
            .map(|(node, friends)| {
                (
                    node.to_string(),
                    friends.iter().map(|f| Friend::new(*f)).collect(),
                )
            })
            .collect();
        Self {
            graph,
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, node: &str) -> Self {
        self.failing.insert(node.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<NodeId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn profile_calls(&self) -> Vec<Vec<NodeId>> {
        self.profile_calls.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Friend-list requests with the time each one started.
    pub fn starts(&self) -> Vec<(NodeId, Instant)> {
        self.starts.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphProvider for MapProvider {
    async fn friend_list(&self, steam_id: &str) -> Result<FriendListResponse, ProviderError> {
        self.calls.lock().unwrap().push(steam_id.to_string());
        self.starts
            .lock()
            .unwrap()
            .push((steam_id.to_string(), Instant::now()));
        self.events
            .lock()
            .unwrap()
            .push(Event::Start(steam_id.to_string()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events
            .lock()
            .unwrap()
            .push(Event::End(steam_id.to_string()));

        if self.failing.contains(steam_id) {
            return Err(ProviderError::Status {
                status: 500,
                body: "Internal Server Error".into(),
            });
        }
        let friends = self.graph.get(steam_id).cloned();
        let body = match &friends {
            Some(list) => serde_json::json!({ "friendslist": { "friends": list } }).to_string(),
            None => "{}".to_string(),
        };
        Ok(FriendListResponse { friends, body })
    }

    async fn player_summaries(&self, steam_ids: &[NodeId]) -> Result<Vec<Profile>, ProviderError> {
        self.profile_calls.lock().unwrap().push(steam_ids.to_vec());
        Ok(steam_ids
            .iter()
            .filter(|id| self.graph.contains_key(*id))
            .map(|id| Profile {
                id: id.clone(),
                name: format!("name-{id}"),
                url: format!("https://steamcommunity.com/profiles/{id}"),
            })
            .collect())
    }
}

pub fn ids(v: &[&str]) -> Vec<NodeId> {
    v.iter().map(|s| s.to_string()).collect()
}

pub fn options(max_depth: u32) -> TraversalOptions {
    TraversalOptions {
        max_depth,
        ..Default::default()
    }
}

/// Build a traversal over `provider` with a zero-delay gate of `width`.
pub fn traversal(
    provider: Arc<MapProvider>,
    cache: Arc<CacheStore>,
    width: usize,
    targets: &[&str],
    options: TraversalOptions,
) -> Traversal {
    Traversal::new(
        provider,
        cache,
        Arc::new(FindRegistry::new()),
        RateGate::new(Duration::ZERO, width),
        ids(targets),
        options,
    )
}
