use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;
use platform_clients::ChatMessage;

#[derive(Debug, serde::Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// `POST /v1/chat`. Sits behind the admission layer: every completion
/// costs the configured provider real money, so it shares the plan
/// table with deployment creation.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    let reply = state.chat.complete(&request.messages).await?;
    Ok(Json(reply))
}
