//! Fixed-window request quotas keyed by client identity.
//!
//! Counters live behind [`CounterStore`]; the in-process map is only correct
//! for a single instance. Time comes from an injected [`Clock`] so windows
//! can be driven deterministically.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::AppError;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Counter state of one key's current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Records one hit for `key`, opening a new window when the previous one
    /// has ended, and returns the updated counter
    async fn hit(&self, key: &str, now: DateTime<Utc>, window: Duration) -> WindowCount;
}

#[derive(Default)]
pub struct MemoryCounterStore {
    windows: RwLock<HashMap<String, WindowCount>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(&self, key: &str, now: DateTime<Utc>, window: Duration) -> WindowCount {
        let mut windows = self.windows.write().await;

        // Evict expired windows so memory tracks active clients only.
        windows.retain(|_, w| now < w.window_start + window);

        let entry = windows.entry(key.to_string()).or_insert(WindowCount {
            count: 0,
            window_start: now,
        });
        entry.count = entry.count.saturating_add(1);
        *entry
    }
}

/// Outcome of one quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateDecision {
    /// Converts a rejected decision into the 429 error
    pub fn into_result(self) -> Result<Self, AppError> {
        if self.allowed {
            Ok(self)
        } else {
            Err(AppError::TooManyRequests {
                remaining: self.remaining,
                reset_at: self.reset_at,
            })
        }
    }
}

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
        limit: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            limit,
            window,
        }
    }

    /// In-process limiter on the wall clock
    pub fn in_memory(limit: u32, window_secs: i64) -> Self {
        Self::new(
            Arc::new(MemoryCounterStore::new()),
            Arc::new(SystemClock),
            limit,
            Duration::seconds(window_secs),
        )
    }

    pub async fn check(&self, key: &str) -> RateDecision {
        let now = self.clock.now();
        let state = self.store.hit(key, now, self.window).await;
        let allowed = state.count <= self.limit;
        let remaining = self.limit.saturating_sub(state.count);
        let decision = RateDecision {
            allowed,
            remaining,
            reset_at: state.window_start + self.window,
        };

        if !allowed {
            tracing::warn!(key = %key, count = state.count, limit = self.limit, "rate limit exceeded");
        }

        decision
    }
}
