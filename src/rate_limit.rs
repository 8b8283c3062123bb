//! Throttle for the suggestion endpoint, the only route that spends money.
//!
//! DESIGN
//! ======
//! Each scope keeps the instants of its admitted requests in a sliding
//! window. A request is admitted only if both the global window and the
//! list's own window have room, and only admitted requests are recorded.
//! Lists whose window empties are dropped from the map.
//!
//! State is process-local; a restart forgets history.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use uuid::Uuid;

pub const DEFAULT_PER_LIST_LIMIT: usize = 5;
pub const DEFAULT_PER_LIST_WINDOW_SECS: u64 = 60;
pub const DEFAULT_GLOBAL_LIMIT: usize = 30;
pub const DEFAULT_GLOBAL_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_list_limit: usize,
    pub per_list_window: Duration,
    pub global_limit: usize,
    pub global_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_list_limit: DEFAULT_PER_LIST_LIMIT,
            per_list_window: Duration::from_secs(DEFAULT_PER_LIST_WINDOW_SECS),
            global_limit: DEFAULT_GLOBAL_LIMIT,
            global_window: Duration::from_secs(DEFAULT_GLOBAL_WINDOW_SECS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("list {list_id} is over {limit} suggestion requests per {window:?}; retry in {retry_after:?}")]
    ListThrottled { list_id: Uuid, limit: usize, window: Duration, retry_after: Duration },
    #[error("service is over {limit} suggestion requests per {window:?}; retry in {retry_after:?}")]
    GlobalThrottled { limit: usize, window: Duration, retry_after: Duration },
}

impl RateLimitError {
    #[must_use]
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::ListThrottled { retry_after, .. } | Self::GlobalThrottled { retry_after, .. } => *retry_after,
        }
    }
}

/// Admitted request times for one scope, oldest first.
#[derive(Default)]
struct Window {
    hits: VecDeque<Instant>,
}

impl Window {
    fn expire(&mut self, now: Instant, span: Duration) {
        while self.hits.front().is_some_and(|&t| now.duration_since(t) > span) {
            self.hits.pop_front();
        }
    }

    /// `None` if there is room, otherwise how long until the oldest hit
    /// leaves the window.
    fn wait(&mut self, now: Instant, span: Duration, limit: usize) -> Option<Duration> {
        self.expire(now, span);
        if self.hits.len() < limit {
            return None;
        }
        let oldest = self.hits.front().copied().unwrap_or(now);
        Some(span.saturating_sub(now.duration_since(oldest)))
    }
}

#[derive(Default)]
struct Windows {
    global: Window,
    lists: HashMap<Uuid, Window>,
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<Windows>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self { windows: Arc::new(Mutex::new(Windows::default())), config }
    }

    /// Admit and record one suggestion request for `list_id`.
    ///
    /// # Errors
    ///
    /// Returns the first exhausted scope, global before per-list.
    pub fn check_and_record(&self, list_id: Uuid) -> Result<(), RateLimitError> {
        self.check_and_record_at(list_id, Instant::now())
    }

    fn check_and_record_at(&self, list_id: Uuid, now: Instant) -> Result<(), RateLimitError> {
        let cfg = self.config;
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(retry_after) = windows.global.wait(now, cfg.global_window, cfg.global_limit) {
            return Err(RateLimitError::GlobalThrottled { limit: cfg.global_limit, window: cfg.global_window, retry_after });
        }

        let list = windows.lists.entry(list_id).or_default();
        if let Some(retry_after) = list.wait(now, cfg.per_list_window, cfg.per_list_limit) {
            return Err(RateLimitError::ListThrottled {
                list_id,
                limit: cfg.per_list_limit,
                window: cfg.per_list_window,
                retry_after,
            });
        }
        list.hits.push_back(now);
        windows.global.hits.push_back(now);

        windows.lists.retain(|_, w| {
            w.expire(now, cfg.per_list_window);
            !w.hits.is_empty()
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
