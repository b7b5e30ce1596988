//! Token bucket throttling for provider endpoints.
//!
//! Each endpoint ("instruments", "prices", "candles") draws from its own
//! bucket so that a long backward candle search cannot starve the price
//! snapshot.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

/// Default sustained rate.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 120;

/// Default burst capacity.
const DEFAULT_BURST: f64 = 10.0;

/// Throttling configuration shared by all endpoints of one client.
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    /// Sustained requests per minute per endpoint.
    pub requests_per_minute: u32,
    /// Requests allowed back to back before throttling starts.
    pub burst: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst: DEFAULT_BURST,
        }
    }
}

impl RateLimitConfig {
    fn tokens_per_second(&self) -> f64 {
        self.requests_per_minute.max(1) as f64 / 60.0
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refreshed_at: Instant,
}

impl Bucket {
    fn full(config: &RateLimitConfig) -> Self {
        Self {
            tokens: config.burst,
            refreshed_at: Instant::now(),
        }
    }

    fn refill(&mut self, config: &RateLimitConfig) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.refreshed_at).as_secs_f64();
        self.tokens = (self.tokens + elapsed * config.tokens_per_second()).min(config.burst);
        self.refreshed_at = now;
    }

    /// Take one token, or report how long until one is available.
    fn take(&mut self, config: &RateLimitConfig) -> Result<(), Duration> {
        self.refill(config);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(missing / config.tokens_per_second()))
        }
    }
}

/// Per-endpoint token bucket rate limiter.
///
/// Thread-safe; buckets are created on first use, starting full.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<&'static str, Bucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the buckets, recovering from poison. A poisoned lock only risks
    /// slightly inaccurate throttling.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<&'static str, Bucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Wait until a request to `endpoint` is allowed.
    pub async fn acquire(&self, endpoint: &'static str) {
        loop {
            let wait = {
                let mut buckets = self.lock_buckets();
                let bucket = buckets
                    .entry(endpoint)
                    .or_insert_with(|| Bucket::full(&self.config));
                match bucket.take(&self.config) {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };

            debug!("Rate limiter: waiting {:?} for endpoint '{}'", wait, endpoint);
            tokio::time::sleep(wait).await;
        }
    }

    /// Take a token without waiting. Returns false when throttled.
    pub fn try_acquire(&self, endpoint: &'static str) -> bool {
        let mut buckets = self.lock_buckets();
        buckets
            .entry(endpoint)
            .or_insert_with(|| Bucket::full(&self.config))
            .take(&self.config)
            .is_ok()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
