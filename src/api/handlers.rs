//! HTTP request handlers

use crate::api::models::{ChatCompletionResponse, ChatRequest, HealthStatus};
use crate::error::{AppError, ErrorResponse};
use crate::generator::GeneratorGuard;
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::info;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up", body = HealthStatus)
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}

/// Answer the last message of a conversation
#[utoipa::path(
    post,
    path = "/api/chat/completion",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatCompletionResponse),
        (status = 400, description = "Conversation has no messages", body = ErrorResponse),
        (status = 502, description = "Generator failed", body = ErrorResponse),
        (status = 503, description = "No generator endpoint available", body = ErrorResponse)
    ),
    tag = "Chat"
)]
pub async fn chat_completion(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatCompletionResponse>, AppError> {
    info!(
        model = %request.model,
        messages = request.messages.len(),
        "Received chat completion request"
    );

    let prompt = request
        .last_message()
        .ok_or(AppError::EmptyConversation)?
        .content
        .as_str();

    let mut generator = GeneratorGuard::acquire(state.generator.as_ref()).await?;
    let answer = generator.generate_answer(prompt).await?;
    generator.release();

    if answer.as_deref().map_or(true, str::is_empty) {
        info!(generator = %state.generator.name(), "Generator returned no answer, using fallback");
    }

    let response = ChatCompletionResponse::from_answer(answer);

    info!(
        answer_len = response.content.len(),
        "Chat completion completed"
    );

    Ok(Json(response))
}
