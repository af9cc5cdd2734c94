//! Chat Handlers
//!
//! Message history over REST. Live messaging goes through the socket.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::request::HistoryQuery;
use crate::application::dto::response::MessageResponse;
use crate::application::services::{ChatService, ChatServiceImpl};
use crate::infrastructure::repositories::{PgConnectionRepository, PgMessageRepository};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Message history for a match, oldest first. Participants only; an empty
/// history is 204 with no body.
pub async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(match_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ChatServiceImpl::new(
        Arc::new(PgMessageRepository::new(state.db.clone())),
        Arc::new(PgConnectionRepository::new(state.db.clone())),
        state.rate_limiter.clone(),
        state.dispatcher.clone(),
    );

    let limit = query.limit.unwrap_or(state.settings.chat.history_limit);
    let messages = service.history(auth.user_id, match_id, limit).await?;

    if messages.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let responses: Vec<MessageResponse> = messages.into_iter().map(MessageResponse::from).collect();

    Ok(Json(responses).into_response())
}
