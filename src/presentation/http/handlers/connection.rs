//! Connection Handlers
//!
//! REST surface for connection requests and matches.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::application::dto::request::SendConnectionRequest;
use crate::application::dto::response::{
    ConnectionOutcomeResponse, MatchResponse, PendingRequestResponse,
};
use crate::application::services::{
    ConnectionError, ConnectionOutcome, ConnectionService, ConnectionServiceImpl,
};
use crate::infrastructure::repositories::{
    PgConnectionRepository, PgEventRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn connection_service(
    state: &AppState,
) -> ConnectionServiceImpl<PgConnectionRepository, PgEventRepository, PgUserRepository> {
    ConnectionServiceImpl::new(
        Arc::new(PgConnectionRepository::new(state.db.clone())),
        Arc::new(PgEventRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.dispatcher.clone(),
    )
}

/// Send a connection request. When the reciprocal request is already
/// pending the two users are matched instead.
pub async fn send_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SendConnectionRequest>,
) -> Result<Json<ConnectionOutcomeResponse>, AppError> {
    let service = connection_service(&state);

    let outcome = service
        .request_connection(auth.user_id, body.receiver_id, body.event_id)
        .await
        .map_err(|e| match e {
            ConnectionError::SelfConnection => AppError::BadRequest(e.to_string()),
            ConnectionError::EventNotFound => AppError::NotFound(e.to_string()),
            ConnectionError::DuplicateRequest | ConnectionError::AlreadyMatched => {
                AppError::Conflict(e.to_string())
            }
            ConnectionError::Internal(msg) => AppError::Internal(msg),
        })?;

    let response = match outcome {
        ConnectionOutcome::Request(request) => ConnectionOutcomeResponse::request(request),
        ConnectionOutcome::Match(m) => ConnectionOutcomeResponse::matched(m),
    };

    Ok(Json(response))
}

/// Pending connection requests addressed to the caller, newest first.
/// Empty result is 204 with no body.
pub async fn pending_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, AppError> {
    let service = connection_service(&state);
    let pending = service.pending_requests(auth.user_id).await?;

    if pending.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let responses: Vec<PendingRequestResponse> = pending
        .into_iter()
        .map(PendingRequestResponse::from)
        .collect();

    Ok(Json(responses).into_response())
}

/// All matches for the caller with counterpart and event context.
/// Empty result is 204 with no body.
pub async fn matches(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, AppError> {
    let service = connection_service(&state);
    let matches = service.matches_for_user(auth.user_id).await?;

    if matches.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let responses: Vec<MatchResponse> = matches.into_iter().map(MatchResponse::from).collect();

    Ok(Json(responses).into_response())
}
