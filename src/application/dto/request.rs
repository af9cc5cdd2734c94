//! Request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /api/connection/send-request`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendConnectionRequest {
    pub receiver_id: Uuid,
    pub event_id: Uuid,
}

/// Query parameters of `GET /api/chat/{matchId}`. When `limit` is absent the
/// configured history page size applies.
#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    /// Maximum number of messages to return
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_body_uses_camel_case() {
        let body: SendConnectionRequest = serde_json::from_str(
            r#"{"receiverId":"00000000-0000-0000-0000-000000000002",
                "eventId":"00000000-0000-0000-0000-000000000064"}"#,
        )
        .unwrap();

        assert_eq!(body.receiver_id, Uuid::from_u128(2));
        assert_eq!(body.event_id, Uuid::from_u128(100));
    }

    #[test]
    fn history_limit_bounds_are_validated() {
        let ok = HistoryQuery { limit: Some(50) };
        assert!(ok.validate().is_ok());

        let too_big = HistoryQuery { limit: Some(500) };
        assert!(too_big.validate().is_err());

        let none = HistoryQuery { limit: None };
        assert!(none.validate().is_ok());
    }
}
