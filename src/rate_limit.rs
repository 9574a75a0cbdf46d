//! Per-key sliding-window rate limiting.
//!
//! Each API key keeps the timestamps of its accepted requests inside the
//! current window. A request is accepted while fewer than `max_requests`
//! timestamps remain after expired ones are pruned. State is process-local.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    pub cleanup_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60,
            cleanup_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the oldest request in the window expires. Zero when allowed.
    pub retry_after: Duration,
}

pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_secs)
    }

    pub async fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now()).await
    }

    pub async fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let window = self.window();
        let limit = self.config.max_requests;
        let mut guard = self.windows.lock().await;
        let timestamps = guard.entry(key.to_string()).or_default();
        prune(timestamps, now, window);

        if (timestamps.len() as u32) < limit {
            timestamps.push_back(now);
            return RateLimitDecision {
                allowed: true,
                limit,
                remaining: limit - timestamps.len() as u32,
                retry_after: Duration::ZERO,
            };
        }

        let retry_after = timestamps
            .front()
            .map(|oldest| (*oldest + window).saturating_duration_since(now))
            .unwrap_or(window);
        RateLimitDecision {
            allowed: false,
            limit,
            remaining: 0,
            retry_after,
        }
    }

    pub async fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now()).await
    }

    /// Drops keys with no request left inside the window and returns how many
    /// were removed.
    pub async fn cleanup_at(&self, now: Instant) -> usize {
        let window = self.window();
        let mut guard = self.windows.lock().await;
        let before = guard.len();
        guard.retain(|_, timestamps| {
            prune(timestamps, now, window);
            !timestamps.is_empty()
        });
        before - guard.len()
    }

    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub fn spawn_cleanup(self: Arc<Self>) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.cleanup_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = self.cleanup().await;
                if removed > 0 {
                    tracing::debug!(removed, "rate limiter dropped idle keys");
                }
            }
        })
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = timestamps.front() {
        if now.saturating_duration_since(*oldest) >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}
