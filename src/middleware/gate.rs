//! Gate decision types shared by all policy gates.
//!
//! A gate inspects the [`RequestContext`](super::context::RequestContext)
//! derived from an inbound request and returns a [`GateDecision`]: either the
//! request may proceed to the next stage, or it is rejected with a status code
//! and a client-facing message. Gates are synchronous, CPU-only decision
//! logic; they never perform I/O and never retry internally.

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;

use super::context::RequestContext;

/// Outcome of running a single gate against a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The request may proceed to the next gate (or the handler).
    Allow,
    /// The request is rejected; no further gates or the handler run.
    Reject(Rejection),
}

/// A gate rejection with everything needed to synthesize the response.
///
/// Both variants are recoverable only by the caller: retry inside the allowed
/// window, or retry after the rate window slides. Nothing here is retried
/// internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Time-of-day is outside the configured access window (403, plain text).
    OutsideAccessWindow {
        /// Client-facing message, e.g.
        /// "Access to messaging is only allowed between 6PM and 9PM."
        message: String,
    },
    /// The client's sliding rate window is saturated (429, JSON body).
    RateExceeded {
        /// Client-facing message, e.g.
        /// "Rate limit exceeded. Maximum 5 messages per minute."
        message: String,
        /// Seconds until the oldest in-window timestamp expires.
        retry_after_secs: u64,
    },
}

impl Rejection {
    /// HTTP status carried by this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::OutsideAccessWindow { .. } => StatusCode::FORBIDDEN,
            Rejection::RateExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Short machine-readable reason, used for logs and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::OutsideAccessWindow { .. } => "outside_access_window",
            Rejection::RateExceeded { .. } => "rate_limit_exceeded",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response<Body> {
        match self {
            Rejection::OutsideAccessWindow { message } => {
                (StatusCode::FORBIDDEN, message).into_response()
            }
            Rejection::RateExceeded {
                message,
                retry_after_secs,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_after_secs.max(1).to_string())],
                axum::Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}

/// A decision stage run ahead of the handler.
///
/// Implementations must be cheap and synchronous: the chain runner calls
/// `decide` inline for every request. Shared mutable state (the rate
/// limiter's window map) is the implementation's responsibility to
/// synchronize; see [`SlidingWindowLimiter`](super::rate_limit::SlidingWindowLimiter).
pub trait Gate: Send + Sync {
    /// Name used in logs when this gate rejects a request.
    fn name(&self) -> &'static str;

    /// Decide whether the request described by `ctx` may proceed.
    fn decide(&self, ctx: &RequestContext) -> GateDecision;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_status_codes() {
        let forbidden = Rejection::OutsideAccessWindow {
            message: "closed".to_string(),
        };
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let limited = Rejection::RateExceeded {
            message: "slow down".to_string(),
            retry_after_secs: 10,
        };
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_rejection_reasons() {
        let forbidden = Rejection::OutsideAccessWindow {
            message: String::new(),
        };
        assert_eq!(forbidden.reason(), "outside_access_window");

        let limited = Rejection::RateExceeded {
            message: String::new(),
            retry_after_secs: 0,
        };
        assert_eq!(limited.reason(), "rate_limit_exceeded");
    }

    #[test]
    fn test_rate_exceeded_response_has_retry_after() {
        let limited = Rejection::RateExceeded {
            message: "Rate limit exceeded.".to_string(),
            retry_after_secs: 42,
        };
        let response = limited.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get("Retry-After").unwrap().to_str().unwrap(),
            "42"
        );
    }

    #[test]
    fn test_rate_exceeded_retry_after_is_at_least_one() {
        // A zero Retry-After would invite an immediate retry into the same window.
        let limited = Rejection::RateExceeded {
            message: String::new(),
            retry_after_secs: 0,
        };
        let response = limited.into_response();
        assert_eq!(
            response.headers().get("Retry-After").unwrap().to_str().unwrap(),
            "1"
        );
    }
}
