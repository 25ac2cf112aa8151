//! Request/response types for the messaging API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum message body length in bytes.
pub const MAX_MESSAGE_BODY_BYTES: usize = 4096;

/// Request body for sending a message to a conversation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SendMessageRequest {
    /// Display name of the sender; defaults to the authenticated-user marker
    /// or "Anonymous" when absent.
    #[serde(default)]
    pub sender: Option<String>,
    /// Message text. Must be non-empty and at most
    /// [`MAX_MESSAGE_BODY_BYTES`] bytes.
    pub body: String,
}

/// A stored message as returned by the API.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MessageResponse {
    /// Server-assigned message id.
    pub id: Uuid,
    /// Conversation the message belongs to.
    pub conversation_id: Uuid,
    /// Sender display name.
    pub sender: String,
    /// Message text.
    pub body: String,
    /// Server-side receive time.
    pub sent_at: DateTime<Utc>,
}

/// Response for listing a conversation's messages.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageListResponse {
    pub conversation_id: Uuid,
    pub messages: Vec<MessageResponse>,
    pub count: usize,
}

/// Response for the health endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
