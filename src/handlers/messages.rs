//! Conversation message handlers: the downstream business logic the policy
//! gates protect. By the time a request lands here it has already passed the
//! time-window gate and (for POSTs under the chats prefix) the rate limiter.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::api::MAX_MESSAGE_BODY_BYTES;
use crate::models::{MessageListResponse, MessageResponse, SendMessageRequest};
use crate::state::AppState;

/// `POST /chats/{conversation_id}/messages` - append a message.
pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    validate_body(&request.body)?;

    let sender = request
        .sender
        .filter(|s| !s.trim().is_empty())
        .or_else(|| authenticated_user(&headers))
        .unwrap_or_else(|| "Anonymous".to_string());

    let message = state
        .store
        .append(conversation_id, sender, request.body)
        .await;

    debug!(
        conversation = %conversation_id,
        message = %message.id,
        "Message stored"
    );

    Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /chats/{conversation_id}/messages` - list a conversation.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<MessageListResponse>> {
    let messages = state
        .store
        .list(conversation_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("conversation {conversation_id}")))?;

    let count = messages.len();
    Ok(Json(MessageListResponse {
        conversation_id,
        messages,
        count,
    }))
}

/// Reject empty or oversized message bodies.
fn validate_body(body: &str) -> AppResult<()> {
    if body.trim().is_empty() {
        return Err(AppError::BadRequest("Message body must not be empty".to_string()));
    }
    if body.len() > MAX_MESSAGE_BODY_BYTES {
        return Err(AppError::BadRequest(format!(
            "Message body exceeds {MAX_MESSAGE_BODY_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Sender fallback: the upstream authenticated-user marker, if present.
fn authenticated_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(crate::middleware::context::USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_body_rejects_empty() {
        assert!(validate_body("").is_err());
        assert!(validate_body("   ").is_err());
        assert!(validate_body("hello").is_ok());
    }

    #[test]
    fn test_validate_body_rejects_oversized() {
        let oversized = "x".repeat(MAX_MESSAGE_BODY_BYTES + 1);
        assert!(validate_body(&oversized).is_err());

        let max = "x".repeat(MAX_MESSAGE_BODY_BYTES);
        assert!(validate_body(&max).is_ok());
    }

    #[test]
    fn test_authenticated_user_header() {
        let mut headers = HeaderMap::new();
        assert!(authenticated_user(&headers).is_none());

        headers.insert(
            crate::middleware::context::USER_HEADER,
            "alice".parse().unwrap(),
        );
        assert_eq!(authenticated_user(&headers), Some("alice".to_string()));
    }
}
