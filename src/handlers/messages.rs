use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::info;

use crate::models::{ChatMessage, NewMessage, Principal};
use crate::state::AppState;

pub async fn list_messages(State(state): State<Arc<AppState>>) -> Json<Vec<ChatMessage>> {
    let mut messages: Vec<ChatMessage> = state
        .messages
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    messages.sort_by_key(|message| message.id);
    Json(messages)
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<NewMessage>,
) -> Result<(StatusCode, Json<ChatMessage>), (StatusCode, Json<Value>)> {
    let body = payload.body.trim();
    if body.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "message body must not be empty" })),
        ));
    }

    let sender = Principal::from_headers(&headers)
        .map(|principal| principal.username)
        .unwrap_or_else(|| "Anonymous".to_string());
    let message = ChatMessage {
        id: state.next_message_id.fetch_add(1, Ordering::Relaxed),
        sender,
        body: body.to_string(),
        sent_at: state.clock.now(),
    };
    state.messages.insert(message.id, message.clone());

    Ok((StatusCode::CREATED, Json(message)))
}

// admin only: the role stage guards this path
pub async fn clear_messages(State(state): State<Arc<AppState>>) -> StatusCode {
    let removed = state.messages.len();
    state.messages.clear();
    info!(removed, "messages cleared");
    StatusCode::NO_CONTENT
}
