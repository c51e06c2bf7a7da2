//! Per-client token-bucket rate limiting.
//!
//! Every client key gets a [`TokenBucket`] holding up to one minute's worth
//! of requests, refilled continuously at `requests_per_minute / 60` tokens
//! per second. Buckets live in a bounded LRU table so churning session IDs
//! cannot grow memory without limit; the table lock also makes
//! get-or-create atomic.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lru::LruCache;

use super::{is_exempt, Denial, RequestMeta};

/// Maximum number of client buckets tracked at once.
pub const MAX_BUCKETS: usize = 10_000;

/// Suggested wait when a bucket can never refill.
const ZERO_RATE_RETRY_SECS: f64 = 60.0;

/// Token bucket for a single client.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket.
    ///
    /// `rate` is tokens per second; `capacity` is the burst size.
    #[must_use]
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self::new_at(rate, capacity, Instant::now())
    }

    /// Creates a full bucket whose refill clock starts at `now`.
    #[must_use]
    pub fn new_at(rate: f64, capacity: f64, now: Instant) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            rate: rate.max(0.0),
            capacity,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Tokens per second.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Maximum fill.
    #[must_use]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Current fill as of the last refill.
    #[must_use]
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    fn refill(&mut self, now: Instant) {
        // saturating: an instant earlier than last_refill adds nothing
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }

    /// Takes one token if available. Returns false when rate limited.
    pub fn consume(&mut self) -> bool {
        self.consume_at(Instant::now())
    }

    /// [`consume`](Self::consume) against an explicit clock reading.
    pub fn consume_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Seconds until one token is available; 0 if one is available now.
    #[must_use]
    pub fn retry_after(&self) -> f64 {
        self.retry_after_at(Instant::now())
    }

    /// [`retry_after`](Self::retry_after) against an explicit clock reading.
    ///
    /// Does not mutate the bucket.
    #[must_use]
    pub fn retry_after_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        let tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        if tokens >= 1.0 {
            return 0.0;
        }
        if self.rate <= 0.0 {
            return ZERO_RATE_RETRY_SECS;
        }
        (1.0 - tokens) / self.rate
    }
}

/// Converts a fractional wait into the whole seconds sent to clients.
///
/// One second is added after truncation so a client that waits exactly the
/// advertised time never lands on a still-empty bucket.
#[must_use]
pub fn retry_after_header_secs(seconds: f64) -> u64 {
    seconds.max(0.0).floor() as u64 + 1
}

/// Per-client rate limiter with a bounded bucket table.
pub struct RateLimiter {
    requests_per_minute: u32,
    rate: f64,
    capacity: f64,
    bypass_paths: Vec<String>,
    buckets: Mutex<LruCache<String, TokenBucket>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_minute` per client key.
    ///
    /// A value of 0 disables limiting.
    #[must_use]
    pub fn new(requests_per_minute: u32, bypass_paths: Vec<String>) -> Self {
        Self::with_max_buckets(requests_per_minute, bypass_paths, MAX_BUCKETS)
    }

    /// Like [`new`](Self::new) with an explicit bucket-table bound.
    #[must_use]
    pub fn with_max_buckets(
        requests_per_minute: u32,
        bypass_paths: Vec<String>,
        max_buckets: usize,
    ) -> Self {
        let bound = NonZeroUsize::new(max_buckets).unwrap_or(NonZeroUsize::MIN);
        Self {
            requests_per_minute,
            rate: f64::from(requests_per_minute) / 60.0,
            capacity: f64::from(requests_per_minute.max(1)),
            bypass_paths,
            buckets: Mutex::new(LruCache::new(bound)),
        }
    }

    /// True when limiting is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.requests_per_minute > 0
    }

    /// Number of client buckets currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Charges one request to `client_key`.
    ///
    /// Returns the wait in seconds (fractional) when the client is over its limit.
    pub fn consume_at(&self, client_key: &str, now: Instant) -> Result<(), f64> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.get_or_insert_mut(client_key.to_string(), || {
            TokenBucket::new_at(self.rate, self.capacity, now)
        });
        if bucket.consume_at(now) {
            Ok(())
        } else {
            Err(bucket.retry_after_at(now))
        }
    }

    /// Applies the limit to a request.
    pub fn check(&self, meta: &RequestMeta) -> Result<(), Denial> {
        self.check_at(meta, Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock reading.
    pub fn check_at(&self, meta: &RequestMeta, now: Instant) -> Result<(), Denial> {
        if !self.is_enabled() || is_exempt(meta, &self.bypass_paths) {
            return Ok(());
        }

        let client_key = meta.client_key();
        self.consume_at(&client_key, now).map_err(|wait| {
            let retry_after = retry_after_header_secs(wait);
            tracing::warn!(
                client = %client_key,
                retry_after,
                "Rate limit exceeded"
            );
            Denial::rate_limited(retry_after)
        })
    }
}

/// Axum middleware enforcing a [`RateLimiter`].
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let meta = RequestMeta::from_request(&request);
    match limiter.check(&meta) {
        Ok(()) => next.run(request).await,
        Err(denial) => denial.into_response(),
    }
}
