//! Application routing configuration with the policy gate chain.
//!
//! # Middleware Stack (applied in order)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌────────────────────┐
//! │  Gate Chain        │ ← context extraction, request log,
//! │  (time window,     │   403 outside the access window,
//! │   rate limiter)    │   429 over the rate ceiling
//! └────────┬───────────┘
//!          │
//!          ▼
//! ┌────────────────────┐
//! │     Tracing        │ ← HTTP request/response logging
//! └────────┬───────────┘
//!          │
//!          ▼
//!      Handler
//! ```
//!
//! # Route Groups
//!
//! - `/health` - liveness probe (outside the rate-limited prefix)
//! - `/chats/{conversation_id}/messages` - the protected messaging resource

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::handlers;
use crate::middleware::{
    FileSink, Gate, GateChainLayer, LogSink, RateLimitGate, TimeWindowGate, TracingSink,
};
use crate::state::AppState;

/// Build the application router with routes and the gate chain configured.
///
/// Gate order is fixed: the time-window gate runs before the rate limiter,
/// so a request rejected for time of day never consumes rate budget.
///
/// # Errors
///
/// Returns `AppError::ConfigError` if the request log file cannot be opened.
pub fn build_router(state: AppState) -> AppResult<Router> {
    let config = &state.config;

    let window = config.access_window();
    info!(
        start = %window.start,
        end = %window.end,
        "Time-window gate enabled"
    );

    info!(
        max_requests = config.rate_limit_max_requests,
        window_secs = config.rate_limit_window.as_secs(),
        prefix = %config.rate_limited_path_prefix,
        "Rate limiter enabled"
    );

    let gates: Vec<Arc<dyn Gate>> = vec![
        Arc::new(TimeWindowGate::new(window)),
        Arc::new(RateLimitGate::new(
            state.limiter.clone(),
            config.rate_limit_policy(),
        )),
    ];

    let sink = build_log_sink(config.request_log_path.as_deref())?;
    let chain = GateChainLayer::new(gates, sink);

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/chats/{conversation_id}/messages",
            post(handlers::send_message),
        )
        .route(
            "/chats/{conversation_id}/messages",
            get(handlers::list_messages),
        )
        // Applied bottom to top: tracing innermost, gate chain outermost so
        // rejected requests are still logged but never reach a handler.
        .layer(TraceLayer::new_for_http())
        .layer(chain);

    Ok(router.with_state(state))
}

/// Open the request log sink: a file when configured, else the tracing
/// pipeline.
fn build_log_sink(path: Option<&str>) -> AppResult<Arc<dyn LogSink>> {
    match path {
        Some(path) => {
            let sink = FileSink::open(Path::new(path)).map_err(|e| {
                AppError::ConfigError(format!("Cannot open request log {path:?}: {e}"))
            })?;
            info!(path, "Request log sink: file");
            Ok(Arc::new(sink))
        }
        None => {
            info!("Request log sink: tracing pipeline");
            Ok(Arc::new(TracingSink))
        }
    }
}
