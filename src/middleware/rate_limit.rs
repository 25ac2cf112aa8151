//! Sliding-window rate limiting keyed by client identity.
//!
//! # Algorithm
//!
//! Exact-count sliding window: every admitted request leaves a monotonic
//! timestamp in a per-client queue. On each check the queue is pruned of
//! timestamps older than the window (a prefix drop, since insertion order is
//! chronological), then compared against the ceiling. A saturated window
//! rejects the request *without* recording it, so rejected attempts never
//! extend a client's lockout.
//!
//! This trades memory (one `Instant` per admitted request in the trailing
//! window) for exactness; there are no bucket-boundary bursts as with fixed
//! windows.
//!
//! # Concurrency
//!
//! The prune + check + append sequence is a read-modify-write on shared
//! state. It runs under a single `parking_lot::Mutex`, making the whole
//! sequence atomic per call: the "at most N per window" ceiling holds even
//! when the host dispatches concurrent requests from the same client. The
//! critical section is a few queue operations, so one global lock is
//! sufficient at this scale.
//!
//! # Memory
//!
//! One map entry per distinct client identity. Entries whose every timestamp
//! has expired are dropped opportunistically during checks and wholesale by
//! [`SlidingWindowLimiter::evict_idle`], which the application runs on a
//! periodic background task.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use axum::http::Method;
use parking_lot::Mutex;
use tracing::debug;

use super::context::RequestContext;
use super::gate::{Gate, GateDecision, Rejection};

/// Result of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateCheck {
    /// Request admitted and recorded.
    Admitted {
        /// Requests left in the window after recording this one.
        remaining: u32,
    },
    /// Window saturated; request NOT recorded.
    Blocked {
        /// Time until the oldest in-window timestamp expires.
        retry_after: Duration,
    },
}

/// Process-wide sliding-window state, one timestamp queue per client.
///
/// The map is private: callers get `check_and_record` and nothing else, so
/// no code path can observe or mutate a queue outside the lock.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    max_requests: u32,
    window: Duration,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting at most `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Configured ceiling.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Configured window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Atomically prune, check, and (if admitted) record one attempt.
    ///
    /// `now` is passed in rather than read here so the decision is a pure
    /// function of its inputs; tests drive it with constructed instants.
    pub fn check_and_record(&self, identity: &str, now: Instant) -> RateCheck {
        let mut windows = self.windows.lock();
        let timestamps = windows.entry(identity.to_string()).or_default();

        // Prefix drop: timestamps are chronological, so stale entries are
        // exactly the leading ones.
        while let Some(front) = timestamps.front() {
            if now.duration_since(*front) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests as usize {
            let retry_after = timestamps
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return RateCheck::Blocked { retry_after };
        }

        timestamps.push_back(now);
        let remaining = self.max_requests - timestamps.len() as u32;
        RateCheck::Admitted { remaining }
    }

    /// Drop identities whose entire timestamp queue has expired.
    ///
    /// Bounds long-run memory to clients active within the trailing window;
    /// without this the map grows by one entry per distinct identity forever.
    pub fn evict_idle(&self, now: Instant) {
        let mut windows = self.windows.lock();
        windows.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|latest| now.duration_since(*latest) <= self.window)
        });
    }

    /// Number of identities currently tracked. Exposed for the metrics gauge.
    pub fn tracked_identities(&self) -> usize {
        self.windows.lock().len()
    }
}

/// Which requests are subject to rate limiting.
///
/// The limiter is applied selectively: only methods in `methods` hitting
/// paths under `path_prefix` consume or check the budget. Everything else
/// passes through untouched, regardless of volume.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Path prefix of protected resources, e.g. "/chats/".
    pub path_prefix: String,
    /// Methods that count against the budget, e.g. {POST}.
    pub methods: Vec<Method>,
}

impl RateLimitPolicy {
    /// Whether a request qualifies for rate limiting.
    pub fn applies_to(&self, method: &Method, path: &str) -> bool {
        path.starts_with(&self.path_prefix) && self.methods.contains(method)
    }
}

/// Gate wiring the limiter and its selection policy into the chain.
pub struct RateLimitGate {
    limiter: std::sync::Arc<SlidingWindowLimiter>,
    policy: RateLimitPolicy,
    message: String,
}

impl RateLimitGate {
    /// Build the gate; the rejection message is rendered once here.
    pub fn new(limiter: std::sync::Arc<SlidingWindowLimiter>, policy: RateLimitPolicy) -> Self {
        let message = rejection_message(limiter.max_requests(), limiter.window());
        Self {
            limiter,
            policy,
            message,
        }
    }
}

impl Gate for RateLimitGate {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn decide(&self, ctx: &RequestContext) -> GateDecision {
        if !self.policy.applies_to(&ctx.method, &ctx.path) {
            return GateDecision::Allow;
        }

        match self.limiter.check_and_record(&ctx.identity, ctx.arrived_at) {
            RateCheck::Admitted { remaining } => {
                debug!(client = %ctx.identity, remaining, "Request admitted by rate limiter");
                GateDecision::Allow
            }
            RateCheck::Blocked { retry_after } => GateDecision::Reject(Rejection::RateExceeded {
                message: self.message.clone(),
                retry_after_secs: retry_after.as_secs(),
            }),
        }
    }
}

/// Client-facing message for a saturated window, e.g.
/// "Rate limit exceeded. Maximum 5 messages per minute."
fn rejection_message(max_requests: u32, window: Duration) -> String {
    if window == Duration::from_secs(60) {
        format!("Rate limit exceeded. Maximum {max_requests} messages per minute.")
    } else {
        format!(
            "Rate limit exceeded. Maximum {max_requests} messages per {} seconds.",
            window.as_secs()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn limiter() -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(5, WINDOW)
    }

    fn admitted(check: RateCheck) -> bool {
        matches!(check, RateCheck::Admitted { .. })
    }

    #[test]
    fn test_burst_up_to_ceiling_then_blocked() {
        let limiter = limiter();
        let base = Instant::now();

        // 5 POSTs at t=0..4 all admitted
        for i in 0..5 {
            let check = limiter.check_and_record("A", base + Duration::from_secs(i));
            assert!(admitted(check), "request {i} should be admitted");
        }

        // 6th at t=5 blocked
        let check = limiter.check_and_record("A", base + Duration::from_secs(5));
        assert!(matches!(check, RateCheck::Blocked { .. }));
    }

    #[test]
    fn test_blocked_attempt_is_not_recorded() {
        let limiter = SlidingWindowLimiter::new(1, WINDOW);
        let base = Instant::now();

        assert!(admitted(limiter.check_and_record("A", base)));
        // Hammer the saturated window; none of these may extend the lockout.
        for i in 1..10 {
            let check = limiter.check_and_record("A", base + Duration::from_secs(i));
            assert!(matches!(check, RateCheck::Blocked { .. }));
        }

        // Once the single recorded timestamp expires, one slot frees up.
        assert!(admitted(
            limiter.check_and_record("A", base + Duration::from_secs(61))
        ));
    }

    #[test]
    fn test_pruning_frees_exactly_one_slot() {
        let limiter = limiter();
        let base = Instant::now();

        for i in 0..5 {
            assert!(admitted(
                limiter.check_and_record("A", base + Duration::from_secs(i))
            ));
        }

        // At t=61 the t=0 timestamp (age 61 > 60) is expired; t=1..4 are not.
        assert!(admitted(
            limiter.check_and_record("A", base + Duration::from_secs(61))
        ));
        // The freed slot is consumed; the next request is still over ceiling.
        assert!(matches!(
            limiter.check_and_record("A", base + Duration::from_secs(61)),
            RateCheck::Blocked { .. }
        ));
    }

    #[test]
    fn test_timestamp_at_exact_window_age_still_counts() {
        let limiter = SlidingWindowLimiter::new(1, WINDOW);
        let base = Instant::now();

        assert!(admitted(limiter.check_and_record("A", base)));
        // Age exactly 60s: not strictly older than the window, still counted.
        assert!(matches!(
            limiter.check_and_record("A", base + Duration::from_secs(60)),
            RateCheck::Blocked { .. }
        ));
    }

    #[test]
    fn test_steady_trickle_never_blocked() {
        let limiter = limiter();
        let base = Instant::now();

        // One request every 61 seconds never accumulates in a window.
        for i in 0..20u64 {
            let check = limiter.check_and_record("A", base + Duration::from_secs(i * 61));
            assert!(admitted(check), "trickle request {i} should be admitted");
        }
    }

    #[test]
    fn test_identities_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, WINDOW);
        let base = Instant::now();

        assert!(admitted(limiter.check_and_record("A", base)));
        assert!(admitted(limiter.check_and_record("B", base)));
        assert!(matches!(
            limiter.check_and_record("A", base),
            RateCheck::Blocked { .. }
        ));
        assert!(matches!(
            limiter.check_and_record("B", base),
            RateCheck::Blocked { .. }
        ));
    }

    #[test]
    fn test_retry_after_tracks_oldest_timestamp() {
        let limiter = SlidingWindowLimiter::new(1, WINDOW);
        let base = Instant::now();

        assert!(admitted(limiter.check_and_record("A", base)));
        let check = limiter.check_and_record("A", base + Duration::from_secs(20));
        match check {
            RateCheck::Blocked { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(40));
            }
            RateCheck::Admitted { .. } => panic!("expected Blocked"),
        }
    }

    #[test]
    fn test_evict_idle_drops_expired_identities() {
        let limiter = limiter();
        let base = Instant::now();

        limiter.check_and_record("A", base);
        limiter.check_and_record("B", base + Duration::from_secs(50));
        assert_eq!(limiter.tracked_identities(), 2);

        // At t=105, A's latest (t=0) is long expired; B's (t=50) is not.
        limiter.evict_idle(base + Duration::from_secs(105));
        assert_eq!(limiter.tracked_identities(), 1);
    }

    #[test]
    fn test_policy_selects_prefix_and_method() {
        let policy = RateLimitPolicy {
            path_prefix: "/chats/".to_string(),
            methods: vec![Method::POST],
        };

        assert!(policy.applies_to(&Method::POST, "/chats/abc/messages"));
        assert!(!policy.applies_to(&Method::GET, "/chats/abc/messages"));
        assert!(!policy.applies_to(&Method::POST, "/health"));
        assert!(!policy.applies_to(&Method::POST, "/chat"));
    }

    #[test]
    fn test_gate_skips_non_qualifying_requests_without_recording() {
        use axum::body::Body;
        use axum::http::Request;

        let limiter = std::sync::Arc::new(SlidingWindowLimiter::new(1, WINDOW));
        let gate = RateLimitGate::new(
            limiter.clone(),
            RateLimitPolicy {
                path_prefix: "/chats/".to_string(),
                methods: vec![Method::POST],
            },
        );

        let req = Request::builder()
            .method(Method::GET)
            .uri("/chats/abc/messages")
            .header("x-forwarded-for", "1.2.3.4")
            .body(Body::empty())
            .unwrap();
        let ctx = RequestContext::from_request(&req);

        // GETs pass freely and consume no budget.
        for _ in 0..10 {
            assert_eq!(gate.decide(&ctx), GateDecision::Allow);
        }
        assert_eq!(limiter.tracked_identities(), 0);
    }

    #[test]
    fn test_default_rejection_message_literal() {
        assert_eq!(
            rejection_message(5, Duration::from_secs(60)),
            "Rate limit exceeded. Maximum 5 messages per minute."
        );
        assert_eq!(
            rejection_message(10, Duration::from_secs(30)),
            "Rate limit exceeded. Maximum 10 messages per 30 seconds."
        );
    }
}
