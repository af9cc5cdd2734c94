//! Socket Protocol Contract Tests
//!
//! Pins the wire shapes clients depend on: tagged event envelopes,
//! camelCase field names, and the closed client event set.

use serde_json::json;
use uuid::Uuid;

use match_server::presentation::websocket::messages::{
    ClientEvent, MessagePayload, SenderPayload, ServerEvent,
};

#[test]
fn authenticate_event_carries_a_token() {
    let event: ClientEvent =
        serde_json::from_value(json!({"event": "authenticate", "data": {"token": "abc.def.ghi"}}))
            .unwrap();

    assert!(matches!(event, ClientEvent::Authenticate { token } if token == "abc.def.ghi"));
}

#[test]
fn join_room_uses_camel_case_match_id() {
    let match_id = Uuid::new_v4();
    let event: ClientEvent = serde_json::from_value(json!({
        "event": "joinRoom",
        "data": {"matchId": match_id}
    }))
    .unwrap();

    assert!(matches!(event, ClientEvent::JoinRoom { match_id: m } if m == match_id));
}

#[test]
fn snake_case_field_names_are_rejected() {
    let result: Result<ClientEvent, _> = serde_json::from_value(json!({
        "event": "joinRoom",
        "data": {"match_id": Uuid::new_v4()}
    }));

    assert!(result.is_err());
}

#[test]
fn receive_message_envelope_shape() {
    let sender_id = Uuid::new_v4();
    let event = ServerEvent::ReceiveMessage(MessagePayload {
        id: Uuid::new_v4(),
        match_id: Uuid::new_v4(),
        sender: SenderPayload {
            id: sender_id,
            name: "Ana".into(),
            photo_url: "https://example.com/a.jpg".into(),
        },
        content: "see you there".into(),
        timestamp: chrono::Utc::now(),
    });

    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["event"], "receiveMessage");
    assert_eq!(json["data"]["sender"]["id"], sender_id.to_string());
    assert_eq!(json["data"]["sender"]["photoUrl"], "https://example.com/a.jpg");
    assert_eq!(json["data"]["content"], "see you there");
    assert!(json["data"].get("matchId").is_some());
}

#[test]
fn status_update_is_a_global_envelope() {
    let user_id = Uuid::new_v4();
    let json = serde_json::to_value(ServerEvent::UserStatusUpdate {
        user_id,
        status: "offline".into(),
        last_online: chrono::Utc::now(),
    })
    .unwrap();

    assert_eq!(json["event"], "userStatusUpdate");
    assert_eq!(json["data"]["status"], "offline");
    assert!(json["data"].get("lastOnline").is_some());
}
