//! Rate/abuse guard: per-client-IP counters with fixed windows.
//!
//! The guard is injected as a trait object rather than living in module-level
//! statics, so the in-memory implementation can be swapped for a shared
//! counter store under a multi-instance deployment. The in-memory
//! implementation is only correct for a single-process deployment.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::RateLimitConfig;

/// Which counter an operation charges against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// Failed login attempts (capacity 5 per window).
    LoginFailure,
    /// CAPTCHA escalations (capacity 3 per window). Once exhausted, logins
    /// from the IP require a CAPTCHA solution.
    CaptchaEscalation,
    /// Verification / reset email requests (capacity 5 per window).
    EmailRequest,
}

const KINDS: [CounterKind; 3] = [
    CounterKind::LoginFailure,
    CounterKind::CaptchaEscalation,
    CounterKind::EmailRequest,
];

/// Raised when a consume is attempted on an exhausted counter.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rate limit exceeded")]
pub struct LimitExceeded;

/// Abuse guard contract.
///
/// `peek` and `consume` report the remaining capacity; `reset` clears every
/// counter for the IP and is called after any successful login.
pub trait RateLimiter: Send + Sync {
    /// Remaining capacity without charging the counter.
    fn peek(&self, kind: CounterKind, ip: &str) -> u32;

    /// Charge one point. Fails when the counter is already exhausted,
    /// otherwise returns the capacity remaining after this charge.
    fn consume(&self, kind: CounterKind, ip: &str) -> Result<u32, LimitExceeded>;

    /// Clear all counters for an IP.
    fn reset(&self, ip: &str);
}

#[derive(Debug, Clone, Copy)]
struct Counter {
    points: u32,
    window_start: Instant,
}

/// In-memory rate limiter keyed by client IP.
pub struct MemoryRateLimiter {
    window: Duration,
    capacities: HashMap<CounterKind, u32>,
    buckets: Mutex<HashMap<String, HashMap<CounterKind, Counter>>>,
}

impl MemoryRateLimiter {
    /// Create a limiter from configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        let mut capacities = HashMap::new();
        capacities.insert(CounterKind::LoginFailure, config.login_failures);
        capacities.insert(CounterKind::CaptchaEscalation, config.captcha_failures);
        capacities.insert(CounterKind::EmailRequest, config.email_requests);

        Self {
            window: Duration::from_secs(config.window_secs),
            capacities,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn capacity(&self, kind: CounterKind) -> u32 {
        self.capacities.get(&kind).copied().unwrap_or(0)
    }

    fn live_points(&self, counter: Option<&Counter>, now: Instant) -> u32 {
        match counter {
            Some(c) if now.duration_since(c.window_start) < self.window => c.points,
            _ => 0,
        }
    }
}

impl RateLimiter for MemoryRateLimiter {
    fn peek(&self, kind: CounterKind, ip: &str) -> u32 {
        let now = Instant::now();
        let buckets = self.buckets.lock().unwrap();
        let points = self.live_points(buckets.get(ip).and_then(|c| c.get(&kind)), now);
        self.capacity(kind).saturating_sub(points)
    }

    fn consume(&self, kind: CounterKind, ip: &str) -> Result<u32, LimitExceeded> {
        let capacity = self.capacity(kind);
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap();
        let counters = buckets.entry(ip.to_string()).or_default();

        let points = self.live_points(counters.get(&kind), now);
        if points >= capacity {
            return Err(LimitExceeded);
        }

        let window_start = match counters.get(&kind) {
            // Keep the running window while it is still live
            Some(c) if points > 0 => c.window_start,
            _ => now,
        };
        counters.insert(
            kind,
            Counter {
                points: points + 1,
                window_start,
            },
        );

        Ok(capacity - points - 1)
    }

    fn reset(&self, ip: &str) {
        let mut buckets = self.buckets.lock().unwrap();
        if let Some(counters) = buckets.get_mut(ip) {
            for kind in KINDS {
                counters.remove(&kind);
            }
        }
        buckets.retain(|_, counters| !counters.is_empty());
    }
}
