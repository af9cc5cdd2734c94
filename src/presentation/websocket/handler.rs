//! WebSocket Connection Handler
//!
//! Drives a single socket: authenticate, room membership, typing relays,
//! and the message send pipeline. A connection carries no identity until
//! its `authenticate` event verifies a token.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::gateway::ConnectedSession;
use super::messages::{ClientEvent, MessagePayload, SenderPayload, ServerEvent};
use super::session::Session;
use crate::application::services::{ChatService, ChatServiceImpl, SendRejection};
use crate::domain::{UserRepository, UserStatus};
use crate::infrastructure::repositories::{
    PgConnectionRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::middleware::verify_token;
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4().to_string();

    tracing::debug!(session_id = %session_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();

    // Outgoing events funnel through one channel so the gateway can push
    // to this socket without holding the write half.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let chat_service = ChatServiceImpl::new(
        Arc::new(PgMessageRepository::new(state.db.clone())),
        Arc::new(PgConnectionRepository::new(state.db.clone())),
        state.rate_limiter.clone(),
        state.dispatcher.clone(),
    );

    let mut session: Option<Session> = None;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let event = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(session_id = %session_id, error = %e, "Unparseable event");
                        let _ = tx.send(ServerEvent::ack_error("Unknown event"));
                        continue;
                    }
                };

                match event {
                    ClientEvent::Authenticate { token } => {
                        // The session record is immutable for the
                        // connection's lifetime; rebinding is refused.
                        if session.is_some() {
                            let _ = tx.send(ServerEvent::ack_error("Already authenticated"));
                            continue;
                        }
                        match authenticate(&state, &session_id, &token, &tx).await {
                            Ok(authed) => {
                                session = Some(authed);
                                let _ = tx.send(ServerEvent::ack_ok());
                            }
                            Err(reason) => {
                                tracing::debug!(
                                    session_id = %session_id,
                                    reason = %reason,
                                    "Authentication failed"
                                );
                                let _ = tx.send(ServerEvent::ack_error(reason));
                                break;
                            }
                        }
                    }
                    ClientEvent::JoinRoom { match_id } => {
                        let Some(session) = session.as_ref() else {
                            let _ = tx.send(ServerEvent::ack_error("Not authenticated"));
                            continue;
                        };
                        match chat_service.authorize_room(session.user_id(), match_id).await {
                            Ok(_) => {
                                state.gateway.join_room(match_id, &session_id);
                                state.gateway.send_to_room(
                                    match_id,
                                    &ServerEvent::UserJoined {
                                        user_id: session.user_id(),
                                        user_name: session.user.name.clone(),
                                    },
                                    Some(&session_id),
                                );
                                let _ = tx.send(ServerEvent::ack_ok());
                            }
                            Err(_) => {
                                let _ = tx.send(ServerEvent::ack_error("Invalid room"));
                            }
                        }
                    }
                    ClientEvent::Typing { match_id } => {
                        if let Some(session) = session.as_ref() {
                            if state.gateway.is_room_member(match_id, &session_id) {
                                state.gateway.send_to_room(
                                    match_id,
                                    &ServerEvent::UserTyping {
                                        user_id: session.user_id(),
                                        user_name: session.user.name.clone(),
                                    },
                                    Some(&session_id),
                                );
                            }
                        }
                    }
                    ClientEvent::StoppedTyping { match_id } => {
                        if let Some(session) = session.as_ref() {
                            if state.gateway.is_room_member(match_id, &session_id) {
                                state.gateway.send_to_room(
                                    match_id,
                                    &ServerEvent::UserStoppedTyping {
                                        user_id: session.user_id(),
                                    },
                                    Some(&session_id),
                                );
                            }
                        }
                    }
                    ClientEvent::SendMessage { match_id, message } => {
                        let Some(session) = session.as_ref() else {
                            let _ = tx.send(ServerEvent::ack_error(
                                SendRejection::Unauthenticated.to_string(),
                            ));
                            continue;
                        };
                        match chat_service
                            .send_message(
                                session.user_id(),
                                &session.user.name,
                                match_id,
                                &message,
                            )
                            .await
                        {
                            Ok(sent) => {
                                let payload = MessagePayload {
                                    id: sent.message.id,
                                    match_id: sent.message.match_id,
                                    sender: SenderPayload {
                                        id: session.user.id,
                                        name: session.user.name.clone(),
                                        photo_url: session.user.photo_url.clone(),
                                    },
                                    content: sent.message.content.clone(),
                                    timestamp: sent.message.created_at,
                                };
                                // Every room member gets the message, the
                                // sender's own sessions included.
                                state.gateway.send_to_room(
                                    match_id,
                                    &ServerEvent::ReceiveMessage(payload),
                                    None,
                                );
                                let _ = tx.send(ServerEvent::ack_ok());
                            }
                            Err(rejection) => {
                                tracing::debug!(
                                    session_id = %session_id,
                                    match_id = %match_id,
                                    rejection = %rejection,
                                    "Message rejected"
                                );
                                let _ = tx.send(ServerEvent::ack_error(rejection.to_string()));
                            }
                        }
                    }
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            // Ping/pong handled by axum
            _ => continue,
        }
    }

    if let Some(disconnected) = state.gateway.unregister_session(&session_id) {
        if disconnected.went_offline {
            match state
                .dispatcher
                .record_presence(disconnected.user_id, UserStatus::Offline)
                .await
            {
                Ok(last_online) => {
                    state.gateway.broadcast(&ServerEvent::UserStatusUpdate {
                        user_id: disconnected.user_id,
                        status: UserStatus::Offline.as_str().into(),
                        last_online,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %disconnected.user_id,
                        error = %e,
                        "Failed to record offline status"
                    );
                }
            }
        }
    }

    // Dropping the last sender closes the channel; the writer task drains
    // any queued acks (a failed authenticate ack in particular) and exits.
    drop(tx);
    let _ = sender_task.await;
    tracing::debug!(session_id = %session_id, "WebSocket connection closed");
}

/// Verify the token, bind the connection to its user, and announce the
/// online transition when this is the user's first live connection.
async fn authenticate(
    state: &AppState,
    session_id: &str,
    token: &str,
    tx: &mpsc::UnboundedSender<ServerEvent>,
) -> Result<Session, String> {
    let user_id =
        verify_token(token, &state.settings.jwt.secret).map_err(|_| "Invalid token".to_string())?;

    let users = PgUserRepository::new(state.db.clone());
    let user = users
        .find_summary(user_id)
        .await
        .map_err(|_| "Authentication failed".to_string())?
        .ok_or_else(|| "Unknown user".to_string())?;

    let came_online = state.gateway.register_session(ConnectedSession {
        session_id: session_id.to_string(),
        user: user.clone(),
        sender: tx.clone(),
    });

    if came_online {
        match state
            .dispatcher
            .record_presence(user_id, UserStatus::Online)
            .await
        {
            Ok(last_online) => {
                state.gateway.broadcast(&ServerEvent::UserStatusUpdate {
                    user_id,
                    status: UserStatus::Online.as_str().into(),
                    last_online,
                });
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to record online status");
            }
        }
    }

    tracing::info!(user_id = %user_id, session_id = %session_id, "User authenticated");

    Ok(Session::new(session_id.to_string(), user))
}
