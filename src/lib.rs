//! # chatgate
//!
//! A policy-gated messaging API: request-level policy enforcement ahead of
//! business logic, featuring:
//!
//! - **Time-windowed access control**: requests allowed only inside a
//!   configured time-of-day interval (403 otherwise)
//! - **Sliding-window rate limiting**: exact-count per-client ceilings over
//!   a trailing window (429 when saturated), applied selectively by path
//!   prefix and method
//! - **Gate chain**: ordered composition that short-circuits on the first
//!   rejection, with an append-only request log side channel
//! - **Observability**: structured logging, Prometheus counters for gate
//!   decisions
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Gate Chain (Context → Time Window → Rate Limiter)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, conversation messages)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  In-memory conversation store                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatgate::{AppState, Config, build_router};
//!
//! # fn main() -> Result<(), chatgate::AppError> {
//! let config = Config::from_env()?;
//! let state = AppState::new(config);
//! let app = build_router(state)?;
//! // Serve `app`...
//! # Ok(())
//! # }
//! ```
//!
//! ## Policy Configuration
//!
//! ```bash
//! ACCESS_WINDOW_START=18:00 ACCESS_WINDOW_END=21:00 \
//! RATE_LIMIT_MAX_REQUESTS=5 RATE_LIMIT_WINDOW_SECS=60 cargo run
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
