//! Shared application state for Axum handlers.
//!
//! All state components are wrapped in `Arc` or use interior mutability
//! patterns that are safe for concurrent access from multiple handlers:
//!
//! - **Store**: in-memory conversation store behind a `tokio::sync::RwLock`
//! - **Limiter**: the sliding-window rate limiter, shared between the gate
//!   chain and the background eviction sweep
//! - **Configuration**: runtime configuration access
//!
//! # Structured Concurrency
//!
//! The background sweep is managed with `tokio_util::task::TaskTracker` and
//! a `CancellationToken`. Call `shutdown()` to stop it before exit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::Config;
use crate::metrics;
use crate::middleware::SlidingWindowLimiter;
use crate::models::MessageResponse;

/// In-memory conversation store.
///
/// Process lifetime only; restarting the service drops all messages.
#[derive(Debug, Clone, Default)]
pub struct ChatStore {
    conversations: Arc<RwLock<HashMap<Uuid, Vec<MessageResponse>>>>,
}

impl ChatStore {
    /// Append a message to a conversation, creating it if absent.
    pub async fn append(&self, conversation_id: Uuid, sender: String, body: String) -> MessageResponse {
        let message = MessageResponse {
            id: Uuid::new_v4(),
            conversation_id,
            sender,
            body,
            sent_at: Utc::now(),
        };

        let mut conversations = self.conversations.write().await;
        conversations
            .entry(conversation_id)
            .or_default()
            .push(message.clone());

        metrics::record_message_stored();
        message
    }

    /// List a conversation's messages in send order, or `None` if the
    /// conversation has never been written to.
    pub async fn list(&self, conversation_id: Uuid) -> Option<Vec<MessageResponse>> {
        self.conversations
            .read()
            .await
            .get(&conversation_id)
            .cloned()
    }
}

/// Shared application state for Axum handlers.
///
/// Cloned for each request handler; all internal data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// In-memory conversation store
    pub store: ChatStore,
    /// Sliding-window rate limiter, shared with the gate chain
    pub limiter: Arc<SlidingWindowLimiter>,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Tracks spawned background tasks for graceful shutdown
    task_tracker: TaskTracker,
    /// Cancellation token for signaling background tasks to stop
    cancellation_token: CancellationToken,
}

impl AppState {
    /// Create new application state from configuration.
    ///
    /// Spawns the background sweep that evicts idle client identities from
    /// the limiter at `config.limiter_sweep_interval`. Call `shutdown()` to
    /// terminate it gracefully.
    pub fn new(config: Config) -> Self {
        let limiter = Arc::new(SlidingWindowLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window,
        ));

        let state = Self {
            config: Arc::new(config),
            store: ChatStore::default(),
            limiter,
            started_at: Instant::now(),
            task_tracker: TaskTracker::new(),
            cancellation_token: CancellationToken::new(),
        };

        state.spawn_limiter_sweep_task();
        state
    }

    /// Spawn the background task evicting idle identities from the limiter.
    ///
    /// Without this the limiter map gains one entry per distinct client
    /// identity for the life of the process.
    fn spawn_limiter_sweep_task(&self) {
        let limiter = self.limiter.clone();
        let sweep_interval = self.config.limiter_sweep_interval;
        let cancel = self.cancellation_token.clone();

        self.task_tracker.spawn(async move {
            let mut ticker = interval(sweep_interval);
            ticker.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    biased; // Check cancellation first

                    _ = cancel.cancelled() => {
                        debug!("Limiter sweep task received cancellation signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        limiter.evict_idle(Instant::now());
                        let tracked = limiter.tracked_identities();
                        metrics::set_tracked_clients(tracked);
                        trace!(tracked, "Evicted idle identities from rate limiter");
                    }
                }
            }

            debug!("Limiter sweep task shutting down");
        });
    }

    /// Gracefully shutdown all background tasks.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown of background tasks");

        self.cancellation_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("All background tasks have completed");
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
