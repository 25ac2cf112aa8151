//! Request-level policy enforcement ahead of business logic.
//!
//! This module implements the gate chain that every request passes through
//! before reaching a handler:
//!
//! ```text
//! Request → Context Extractor → Time-Window Gate → Rate Limiter → Handler
//!                                    ↓ 403              ↓ 429
//! ```
//!
//! - **Context extraction**: client identity (forwarded-for header, then the
//!   direct connection address) plus wall-clock and monotonic timestamps
//! - **Time-window gate**: access allowed only inside a configured
//!   time-of-day interval
//! - **Rate limiter**: exact-count sliding window per client identity,
//!   applied selectively by path prefix and method
//! - **Chain runner**: short-circuits on the first rejection and feeds the
//!   append-only request log
//!
//! Gates are pure decision logic; all I/O (the log sink) sits behind the
//! [`request_log::LogSink`] trait.

pub mod access_window;
pub mod chain;
pub mod context;
pub mod gate;
pub mod rate_limit;
pub mod request_log;

pub use access_window::{AccessWindow, TimeWindowGate};
pub use chain::GateChainLayer;
pub use context::{RequestContext, UNKNOWN_CLIENT, extract_client_identity};
pub use gate::{Gate, GateDecision, Rejection};
pub use rate_limit::{RateCheck, RateLimitGate, RateLimitPolicy, SlidingWindowLimiter};
pub use request_log::{FileSink, LogSink, TracingSink};
