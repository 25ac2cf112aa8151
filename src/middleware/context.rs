//! Request context extraction: client identity, user marker, and clocks.
//!
//! The chain runner builds one [`RequestContext`] per inbound request before
//! any gate runs, so every gate sees the same identity and the same instant.
//!
//! # Security Warning: IP Spoofing Risk
//!
//! Client identity trusts the `X-Forwarded-For` header when present. A client
//! talking to this service directly can spoof its identity (and thereby
//! rotate rate-limit keys) by setting the header itself. No proxy-trust
//! validation is performed here; deploy behind a reverse proxy that
//! overwrites the header, or accept the limitation.

use std::borrow::Cow;
use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::connect_info::ConnectInfo;
use axum::http::{Method, Request};
use chrono::{DateTime, Local, NaiveTime};

/// Fallback identity when no client address can be resolved.
///
/// All such requests share one rate-limit key, which collectively throttles
/// header-less traffic rather than letting it bypass the limiter.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Header carrying the authenticated-user marker set by an upstream
/// authenticator. Absent means anonymous; the value is never verified here.
pub const USER_HEADER: &str = "x-authenticated-user";

/// Everything the policy gates need to know about one request.
///
/// Built exactly once per request; gates only borrow it. Wall-clock time
/// (`received_at`) drives the time-of-day check and log lines, while the
/// monotonic `arrived_at` drives rate-limit arithmetic so a clock step
/// cannot corrupt the sliding window.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Rate-limit partition key derived from the network origin.
    pub identity: String,
    /// Authenticated-user marker, if the upstream set one.
    pub user: Option<String>,
    /// HTTP method of the request.
    pub method: Method,
    /// Request path (no query string).
    pub path: String,
    /// Wall-clock time the request was seen.
    pub received_at: DateTime<Local>,
    /// Monotonic time the request was seen.
    pub arrived_at: Instant,
}

impl RequestContext {
    /// Derive a context from an inbound request. Infallible: identity falls
    /// back to [`UNKNOWN_CLIENT`] and the user marker to anonymous.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            identity: extract_client_identity(req).into_owned(),
            user: extract_user(req),
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            received_at: Local::now(),
            arrived_at: Instant::now(),
        }
    }

    /// Time of day for the access-window check.
    pub fn time_of_day(&self) -> NaiveTime {
        self.received_at.time()
    }

    /// User marker for log lines, `"Anonymous"` when unauthenticated.
    pub fn user_label(&self) -> &str {
        self.user.as_deref().unwrap_or("Anonymous")
    }
}

/// Resolve the client identity from the request.
///
/// Fallback chain, first match wins:
/// 1. `X-Forwarded-For`: first comma-separated token (leftmost = original
///    client in a proxy chain); empty tokens are skipped.
/// 2. The direct connection's remote address (axum `ConnectInfo`).
/// 3. [`UNKNOWN_CLIENT`].
///
/// Returns `Cow<'static, str>` so the fallback marker costs no allocation.
pub fn extract_client_identity<B>(req: &Request<B>) -> Cow<'static, str> {
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next().map(str::trim).filter(|s| !s.is_empty())
    {
        return Cow::Owned(first.to_string());
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Cow::Owned(addr.ip().to_string());
    }

    Cow::Borrowed(UNKNOWN_CLIENT)
}

/// Read the authenticated-user marker, if any.
fn extract_user<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
