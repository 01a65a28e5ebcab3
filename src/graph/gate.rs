//! Cooperative request gate: a fixed delay before each batch of requests and
//! a hard cap on requests in flight.
//!
//! The delay is paid while holding a slot. Requests of one batch start at
//! roughly the same time, so the delay is paid once per batch. This is not a token bucket; slow responses extend a
//! batch past the nominal interval and nothing compensates for that.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Result, SteamChainError};

#[derive(Debug, Clone)]
pub struct RateGate {
    delay: Duration,
    width: usize,
    permits: Arc<Semaphore>,
}

/// Held for the duration of one outbound request.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl RateGate {
    /// `width` is clamped to at least one.
    pub fn new(delay: Duration, width: usize) -> Self {
        let width = width.max(1);
        Self {
            delay,
            width,
            permits: Arc::new(Semaphore::new(width)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Maximum number of requests in flight, which is also the batch width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Take an in-flight slot, then wait out the delay while holding it.
    ///
    /// Every request therefore starts at least `delay` after the slot it
    /// occupies was freed, including requests that queued behind a full gate.
    pub async fn acquire(&self) -> Result<GatePermit> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SteamChainError::Other("request gate closed".into()))?;
        self.pause().await;
        Ok(GatePermit { _permit: permit })
    }

    /// Wait out the delay.
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    pub fn in_flight(&self) -> usize {
        self.width - self.permits.available_permits()
    }
}
