//! Sliding-window rate limiting for reset requests.
//!
//! Flow Overview:
//! 1) Encode the throttle key for storage.
//! 2) Inside one backend transaction: load the key's attempt timestamps, drop those
//!    outside the window, deny when `max_count` are left, otherwise append `now`.
//! 3) Persist only on allow, so a denied attempt never extends the lockout.
//!
//! The read-filter-append-write step is the one strict mutual-exclusion boundary of
//! the service: two concurrent callers on the same key must never both observe a
//! stale count. Each [`ThrottleStore`] guarantees that for its backend.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use super::{error::RecoveryError, utils::storage_key};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

/// Validated window parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleWindow {
    window: Duration,
    max_count: usize,
}

impl ThrottleWindow {
    /// # Errors
    /// Returns `InvalidArgument` when the window is zero seconds or `max_count` is zero.
    pub fn new(window_seconds: u64, max_count: usize) -> Result<Self, RecoveryError> {
        if window_seconds == 0 {
            return Err(RecoveryError::invalid("rate limit window must be positive"));
        }
        if max_count == 0 {
            return Err(RecoveryError::invalid("rate limit max count must be at least 1"));
        }
        Ok(Self {
            window: Duration::from_secs(window_seconds),
            max_count,
        })
    }

    #[must_use]
    pub fn window_millis(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Apply the window to `hits` at `now_ms`.
    ///
    /// Returns the sequence to persist on allow, or `None` on deny.
    #[must_use]
    pub fn admit(&self, hits: &[i64], now_ms: i64) -> Option<Vec<i64>> {
        let window_ms = self.window_millis();
        let mut fresh: Vec<i64> = hits
            .iter()
            .copied()
            .filter(|&hit| now_ms.saturating_sub(hit) < window_ms)
            .collect();
        if fresh.len() >= self.max_count {
            return None;
        }
        fresh.push(now_ms);
        Some(fresh)
    }
}

/// Time source in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
            })
    }
}

/// Transactional backend for throttle records.
#[async_trait]
pub trait ThrottleStore: Send + Sync {
    /// Atomically apply `window` to the record under `key` at `now_ms`.
    ///
    /// # Errors
    /// Returns an error if the backend is unavailable; no decision is made then.
    async fn record_attempt(
        &self,
        key: &str,
        now_ms: i64,
        window: ThrottleWindow,
    ) -> anyhow::Result<RateLimitDecision>;
}

#[derive(Debug, Default)]
struct MemoryThrottleState {
    records: HashMap<String, Vec<i64>>,
    last_sweep_ms: i64,
}

impl MemoryThrottleState {
    /// Drop keys whose newest hit left the window, at most once per window.
    fn sweep(&mut self, now_ms: i64, window: ThrottleWindow) {
        let window_ms = window.window_millis();
        if now_ms.saturating_sub(self.last_sweep_ms) < window_ms {
            return;
        }
        let before = self.records.len();
        self.records.retain(|_, hits| {
            hits.last()
                .is_some_and(|&newest| now_ms.saturating_sub(newest) < window_ms)
        });
        self.last_sweep_ms = now_ms;
        debug!(
            removed = before - self.records.len(),
            "swept expired throttle records"
        );
    }
}

/// In-process throttle records for single-instance and test deployments.
///
/// One lock guards the whole map, which serializes every decision. Expired keys are
/// swept on access.
#[derive(Debug, Default)]
pub struct MemoryThrottleStore {
    state: Mutex<MemoryThrottleState>,
}

impl MemoryThrottleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored timestamps for an encoded key (test and diagnostics helper).
    pub async fn hits(&self, key: &str) -> Vec<i64> {
        self.state
            .lock()
            .await
            .records
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of keys currently held.
    pub async fn tracked_keys(&self) -> usize {
        self.state.lock().await.records.len()
    }
}

#[async_trait]
impl ThrottleStore for MemoryThrottleStore {
    async fn record_attempt(
        &self,
        key: &str,
        now_ms: i64,
        window: ThrottleWindow,
    ) -> anyhow::Result<RateLimitDecision> {
        let mut state = self.state.lock().await;
        state.sweep(now_ms, window);
        let hits = state.records.get(key).map(Vec::as_slice).unwrap_or_default();
        match window.admit(hits, now_ms) {
            Some(fresh) => {
                state.records.insert(key.to_string(), fresh);
                Ok(RateLimitDecision::Allowed)
            }
            None => Ok(RateLimitDecision::Limited),
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn ThrottleStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn ThrottleStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(store: Arc<dyn ThrottleStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register an attempt for `key`.
    ///
    /// # Errors
    /// - `RateLimitExceeded` when `max_count` attempts already happened inside the window.
    /// - `InvalidArgument` for a zero window or zero `max_count`.
    /// - `Unavailable` when the backend fails.
    pub async fn check(
        &self,
        key: &str,
        window_seconds: u64,
        max_count: usize,
    ) -> Result<(), RecoveryError> {
        let window = ThrottleWindow::new(window_seconds, max_count)?;
        let now_ms = self.clock.now_millis();
        let decision = self
            .store
            .record_attempt(&storage_key(key), now_ms, window)
            .await
            .map_err(|err| {
                error!("Failed to record reset attempt: {err:#}");
                RecoveryError::Unavailable(format!("throttle store: {err:#}"))
            })?;

        match decision {
            RateLimitDecision::Allowed => {
                debug!("reset attempt allowed");
                Ok(())
            }
            RateLimitDecision::Limited => {
                warn!("reset attempt rate limited");
                Err(RecoveryError::RateLimitExceeded)
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
