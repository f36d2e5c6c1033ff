use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

const MIN_PURGE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(15 * 60),
            max_requests: 100,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// Outcome of counting one request against a client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the client's current window ends.
    pub reset_after: Duration,
}

/// Fixed-window request counter keyed by client IP.
///
/// Cloning is cheap; clones share the same counters.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<DashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Counts a request from `client` and reports whether it is within the limit.
    pub fn check(&self, client: IpAddr) -> RateLimitDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> RateLimitDecision {
        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut window = self.windows.entry(client).or_insert(Window {
            count: 0,
            started_at: now,
        });

        if now.duration_since(window.started_at) >= self.config.window {
            window.count = 0;
            window.started_at = now;
        }
        window.count = window.count.saturating_add(1);

        let elapsed = now.duration_since(window.started_at);
        RateLimitDecision {
            allowed: window.count <= self.config.max_requests,
            limit: self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(window.count),
            reset_after: self.config.window.saturating_sub(elapsed),
        }
    }

    /// Drops windows that have already ended.
    pub fn purge_expired(&self) {
        self.purge_expired_at(Instant::now());
    }

    fn purge_expired_at(&self, now: Instant) {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.duration_since(window.started_at) < self.config.window);
        let purged = before.saturating_sub(self.windows.len());
        if purged > 0 {
            debug!("Purged {} expired rate limit windows", purged);
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Runs [`RateLimiter::purge_expired`] once per window length until aborted.
    pub fn spawn_purge_task(&self) -> JoinHandle<()> {
        let limiter = self.clone();
        let period = limiter.config.window.max(MIN_PURGE_INTERVAL);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                limiter.purge_expired();
            }
        })
    }
}
