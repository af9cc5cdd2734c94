//! Response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    ChatMessage, ConnectionRequest, Event, Match, MatchWithContext, PendingRequestWithSender,
    UserSummary,
};

/// Embedded user summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub photo_url: String,
}

impl From<UserSummary> for UserSummaryResponse {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            name: user.name,
            photo_url: user.photo_url,
        }
    }
}

/// Embedded event summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummaryResponse {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
}

impl From<Event> for EventSummaryResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            location: event.location,
            starts_at: event.starts_at,
        }
    }
}

/// A freshly created connection request, returned from send-request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCreatedResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub event_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<ConnectionRequest> for RequestCreatedResponse {
    fn from(request: ConnectionRequest) -> Self {
        Self {
            id: request.id,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            event_id: request.event_id,
            status: request.status.as_str().to_string(),
            created_at: request.created_at,
        }
    }
}

/// A freshly created match, returned from send-request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCreatedResponse {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Match> for MatchCreatedResponse {
    fn from(m: Match) -> Self {
        Self {
            id: m.id,
            user_a: m.user_a,
            user_b: m.user_b,
            event_id: m.event_id,
            created_at: m.created_at,
        }
    }
}

/// Envelope of `POST /api/connection/send-request`: exactly one of `request`
/// and `r#match` is present.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOutcomeResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestCreatedResponse>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub r#match: Option<MatchCreatedResponse>,
}

impl ConnectionOutcomeResponse {
    pub fn request(request: ConnectionRequest) -> Self {
        Self {
            message: "Connection request sent successfully",
            request: Some(request.into()),
            r#match: None,
        }
    }

    pub fn matched(m: Match) -> Self {
        Self {
            message: "It's a match! Connection established",
            request: None,
            r#match: Some(m.into()),
        }
    }
}

/// Item of `GET /api/connection/pending-requests`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestResponse {
    pub id: Uuid,
    pub sender: UserSummaryResponse,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<PendingRequestWithSender> for PendingRequestResponse {
    fn from(item: PendingRequestWithSender) -> Self {
        Self {
            id: item.request.id,
            sender: item.sender.into(),
            event_id: item.request.event_id,
            created_at: item.request.created_at,
        }
    }
}

/// Item of `GET /api/connection/matches`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: Uuid,
    pub counterpart: UserSummaryResponse,
    pub event: EventSummaryResponse,
    pub created_at: DateTime<Utc>,
}

impl From<MatchWithContext> for MatchResponse {
    fn from(item: MatchWithContext) -> Self {
        Self {
            id: item.match_record.id,
            counterpart: item.counterpart.into(),
            event: item.event.into(),
            created_at: item.match_record.created_at,
        }
    }
}

/// Item of `GET /api/chat/{matchId}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read_by: Vec<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            match_id: message.match_id,
            sender_id: message.sender_id,
            content: message.content,
            read_by: message.read_by,
            timestamp: message.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_envelope_serializes_exactly_one_branch() {
        let m = Match {
            id: Uuid::from_u128(60),
            user_a: Uuid::from_u128(1),
            user_b: Uuid::from_u128(2),
            event_id: Uuid::from_u128(100),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(ConnectionOutcomeResponse::matched(m)).unwrap();
        assert!(json.get("match").is_some());
        assert!(json.get("request").is_none());
    }
}
