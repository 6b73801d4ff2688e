//! HTTP API endpoint handlers.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    domain::ChatMessage,
    infrastructure::dto::{
        http::{ChatRoomDto, ErrorDto, SubmitResponseDto},
        websocket::ChatMessageDto,
    },
    ui::state::AppState,
    usecase::SubmitError,
};

type ErrorResponse = (StatusCode, Json<ErrorDto>);

fn error_response(status: StatusCode, error: impl ToString) -> ErrorResponse {
    (
        status,
        Json(ErrorDto {
            error: error.to_string(),
        }),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Names that currently have a live registration
pub async fn get_names(State(state): State<AppState>) -> Json<ChatRoomDto> {
    let names = state
        .hub
        .current_names()
        .into_iter()
        .map(|name| name.into_string())
        .collect();

    Json(ChatRoomDto { names })
}

/// One-shot send on behalf of a subscribed client
pub async fn post_message(
    State(state): State<AppState>,
    Json(dto): Json<ChatMessageDto>,
) -> Result<(StatusCode, Json<SubmitResponseDto>), ErrorResponse> {
    // Convert DTO -> Domain Model
    let message = ChatMessage::try_from(dto).map_err(|e| {
        tracing::warn!("Rejecting submitted message: {}", e);
        error_response(StatusCode::BAD_REQUEST, e)
    })?;

    match state.hub.submit(message) {
        Ok(report) => Ok((
            StatusCode::ACCEPTED,
            Json(SubmitResponseDto {
                delivered: report.delivered.len(),
            }),
        )),
        Err(e @ SubmitError::NotSubscribed(_)) => {
            tracing::warn!("Rejecting submitted message: {}", e);
            Err(error_response(StatusCode::NOT_FOUND, e))
        }
    }
}
