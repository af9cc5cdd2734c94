//! WebSocket Message Types
//!
//! The socket protocol is a closed set of tagged variants on both directions;
//! unknown event names fail deserialization instead of falling through an
//! open string dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events sent by clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Bind this connection to a verified user identity.
    Authenticate { token: String },
    /// Subscribe to a match's chat room.
    #[serde(rename_all = "camelCase")]
    JoinRoom { match_id: Uuid },
    /// Typing indicator, broadcast to room peers only.
    #[serde(rename_all = "camelCase")]
    Typing { match_id: Uuid },
    #[serde(rename_all = "camelCase")]
    StoppedTyping { match_id: Uuid },
    /// Send a chat message to a match room.
    #[serde(rename_all = "camelCase")]
    SendMessage { match_id: Uuid, message: String },
}

/// Sender summary embedded in message payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderPayload {
    pub id: Uuid,
    pub name: String,
    pub photo_url: String,
}

/// A delivered chat message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender: SenderPayload,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Events sent by the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Acknowledgement of the client's last request-like event.
    Ack {
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// A chat message delivered to every room member, the sender's own
    /// sessions included.
    ReceiveMessage(MessagePayload),
    /// Global presence broadcast.
    #[serde(rename_all = "camelCase")]
    UserStatusUpdate {
        user_id: Uuid,
        status: String,
        last_online: DateTime<Utc>,
    },
    /// Room-scoped UX events.
    #[serde(rename_all = "camelCase")]
    UserJoined { user_id: Uuid, user_name: String },
    #[serde(rename_all = "camelCase")]
    UserTyping { user_id: Uuid, user_name: String },
    #[serde(rename_all = "camelCase")]
    UserStoppedTyping { user_id: Uuid },
}

impl ServerEvent {
    pub fn ack_ok() -> Self {
        ServerEvent::Ack {
            ok: true,
            message: None,
        }
    }

    pub fn ack_error(message: impl Into<String>) -> Self {
        ServerEvent::Ack {
            ok: false,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn client_events_deserialize_from_tagged_json() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"sendMessage",
                "data":{"matchId":"00000000-0000-0000-0000-00000000003c",
                        "message":"hello"}}"#,
        )
        .unwrap();

        match event {
            ClientEvent::SendMessage { match_id, message } => {
                assert_eq!(match_id, Uuid::from_u128(60));
                assert_eq!(message, "hello");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unknown_event_names_are_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"event":"adminReboot","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn server_events_serialize_with_camel_case_tags() {
        let json = serde_json::to_value(ServerEvent::UserStoppedTyping {
            user_id: Uuid::from_u128(1),
        })
        .unwrap();

        assert_eq!(json["event"], "userStoppedTyping");
        assert_eq!(
            json["data"]["userId"],
            "00000000-0000-0000-0000-000000000001"
        );
    }

    #[test]
    fn failed_ack_carries_its_reason() {
        let json = serde_json::to_value(ServerEvent::ack_error("Invalid room")).unwrap();
        assert_eq!(json["data"]["ok"], false);
        assert_eq!(json["data"]["message"], "Invalid room");
    }
}
