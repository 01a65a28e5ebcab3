//! Structured logging, crawl metrics, and secret redaction.
//!
//! This module provides:
//! - [`init_logging`]: one-time structured logging setup with `RUST_LOG` support
//! - [`redact_secrets`]: strips API keys from text before it is logged
//! - [`CrawlMetrics`]: lock-free counters updated during traversal

use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use tracing_subscriber::EnvFilter;

use crate::config::schema::Verbosity;

/// Initialize structured logging.
///
/// `RUST_LOG` wins when set; otherwise only this crate logs, at `verbosity`.
/// Subsequent calls are silently ignored by `tracing_subscriber`.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("steamchain={}", verbosity.filter_directive())));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Redact potential secrets from text.
///
/// Steam Web API keys travel as a `key=` query parameter, so any request URL
/// embedded in an HTTP error would otherwise leak it.
pub fn redact_secrets(text: &str) -> String {
    let patterns: &[(&str, &str)] = &[
        (r"([?&]key=)[^&\s)]+", "${1}***REDACTED***"),
        (
            r#"(?i)(api[_-]?key|apikey|steam_api_key)\s*[:=]\s*['"]?([a-zA-Z0-9_\-]{16,})['"]?"#,
            "$1=***REDACTED***",
        ),
        (r"\b[0-9A-F]{32}\b", "***REDACTED***"),
    ];

    let mut result = text.to_string();
    for (pattern, replacement) in patterns {
        if let Ok(re) = Regex::new(pattern) {
            result = re.replace_all(&result, *replacement).to_string();
        }
    }
    result
}

// ---------------------------------------------------------------------------
// CrawlMetrics
// ---------------------------------------------------------------------------

/// Counters shared by every traversal branch.
#[derive(Debug, Default)]
pub struct CrawlMetrics {
    nodes_visited: AtomicU64,
    friend_cache_hits: AtomicU64,
    friend_requests: AtomicU64,
    skipped_uncached: AtomicU64,
}

impl CrawlMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) {
        self.nodes_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hit(&self) {
        self.friend_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request(&self) {
        self.friend_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn skipped(&self) {
        self.skipped_uncached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            nodes_visited: self.nodes_visited.load(Ordering::Relaxed),
            friend_cache_hits: self.friend_cache_hits.load(Ordering::Relaxed),
            friend_requests: self.friend_requests.load(Ordering::Relaxed),
            skipped_uncached: self.skipped_uncached.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CrawlMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub nodes_visited: u64,
    pub friend_cache_hits: u64,
    pub friend_requests: u64,
    /// Cache misses not fetched because of cache-only mode.
    pub skipped_uncached: u64,
}

impl MetricsSnapshot {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "nodes_visited": self.nodes_visited,
            "friend_cache_hits": self.friend_cache_hits,
            "friend_requests": self.friend_requests,
            "skipped_uncached": self.skipped_uncached,
            "cache_hit_rate": self.cache_hit_rate(),
        })
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.friend_cache_hits + self.friend_requests + self.skipped_uncached;
        if total == 0 {
            return 0.0;
        }
        self.friend_cache_hits as f64 / total as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
