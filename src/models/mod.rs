//! Domain and API models.

pub mod api;

pub use api::{HealthResponse, MessageListResponse, MessageResponse, SendMessageRequest};
