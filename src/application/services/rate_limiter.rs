//! Per-client sliding-window rate limiting with temporary blocking.
//!
//! # Algorithm
//!
//! On every [`RateLimiter::admit`] call for a client:
//!
//! 1. Lift every expired block and forget the released clients' old events
//! 2. If the client is still blocked, deny
//! 3. Record the current request as an event
//! 4. Drop all events (of every client) older than the window
//! 5. If the client now has more than `max_requests` events in the window,
//!    block it for `block_duration` and deny; otherwise allow
//!
//! Expiry is evaluated lazily on each call; there is no background timer.
//! A block whose end is not representable as an [`Instant`] never expires.
//!
//! # Thread Safety
//!
//! All state sits behind one `tokio::sync::Mutex`, so concurrent connections
//! observe a single serialized history.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Thresholds for [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Requests allowed per client inside one window.
    pub max_requests: usize,
    /// Length of the trailing window events are counted in.
    pub window: Duration,
    /// How long a client stays blocked after exceeding the limit.
    pub block_duration: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(10),
            block_duration: Duration::from_secs(10),
        }
    }
}

/// Shared limiter state.
///
/// `events` holds every recorded request in arrival order, so pruning pops
/// from the front. `counts` mirrors it per client.
#[derive(Debug, Default)]
struct LimiterState {
    events: VecDeque<(String, Instant)>,
    counts: HashMap<String, usize>,
    blocked_until: HashMap<String, Instant>,
}

impl LimiterState {
    fn record(&mut self, client_id: &str, now: Instant) -> usize {
        self.events.push_back((client_id.to_string(), now));
        let count = self.counts.entry(client_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn prune(&mut self, cutoff: Instant) {
        while let Some((_, at)) = self.events.front() {
            if *at > cutoff {
                break;
            }
            if let Some((client, _)) = self.events.pop_front() {
                self.decrement(&client);
            }
        }
    }

    /// Lifts blocks that ended at or before `now`.
    fn release_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .blocked_until
            .iter()
            .filter(|(_, until)| now >= **until)
            .map(|(client, _)| client.clone())
            .collect();

        for client in expired {
            self.blocked_until.remove(&client);
            self.forget(&client);
            debug!("Block for client {} expired", client);
        }
    }

    fn forget(&mut self, client_id: &str) {
        if self.counts.remove(client_id).is_some() {
            self.events.retain(|(client, _)| client != client_id);
        }
    }

    fn decrement(&mut self, client_id: &str) {
        if let Some(count) = self.counts.get_mut(client_id) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(client_id);
            }
        }
    }

    fn count(&self, client_id: &str) -> usize {
        self.counts.get(client_id).copied().unwrap_or(0)
    }
}

/// In-memory per-client rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Records a request from `client_id` and returns whether it is allowed.
    ///
    /// Returns `false` if the client is currently blocked, or if this request
    /// pushes it over the limit (which starts a new block).
    pub async fn admit(&self, client_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        self.admit_locked(&mut state, client_id, now)
    }

    /// Same as [`RateLimiter::admit`] with an explicit clock reading.
    ///
    /// Calls are expected to pass non-decreasing instants.
    pub async fn admit_at(&self, client_id: &str, now: Instant) -> bool {
        let mut state = self.state.lock().await;
        self.admit_locked(&mut state, client_id, now)
    }

    fn admit_locked(&self, state: &mut LimiterState, client_id: &str, now: Instant) -> bool {
        state.release_expired(now);

        if state.blocked_until.contains_key(client_id) {
            debug!("Client {} is blocked, rejecting request", client_id);
            return false;
        }

        state.record(client_id, now);

        if let Some(cutoff) = now.checked_sub(self.policy.window) {
            state.prune(cutoff);
        }

        let count = state.count(client_id);
        if count > self.policy.max_requests {
            let until = now
                .checked_add(self.policy.block_duration)
                .unwrap_or_else(|| far_future(now));
            state.blocked_until.insert(client_id.to_string(), until);
            debug!(
                "Client {} exceeded {} requests per {:?}, blocked for {:?}",
                client_id, self.policy.max_requests, self.policy.window, self.policy.block_duration
            );
            return false;
        }

        true
    }
}

/// Latest representable instant after `now`, found by halving the step.
fn far_future(now: Instant) -> Instant {
    let mut step = Duration::from_secs(u64::MAX);
    let mut until = now;
    while !step.is_zero() {
        if let Some(next) = until.checked_add(step) {
            until = next;
        } else {
            step /= 2;
        }
    }
    until
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}
