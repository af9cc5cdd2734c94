//! WebSocket Gateway
//!
//! Owns the connection registry (presence) and per-match room membership.
//! All maps are keyed per user/session/match so concurrent connects and
//! disconnects from unrelated users never contend on a shared lock.

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use std::sync::Arc;

use super::messages::ServerEvent;
use crate::application::services::PresenceProvider;
use crate::domain::UserSummary;

/// A live connection with its outbound message channel.
pub struct ConnectedSession {
    pub session_id: String,
    pub user: UserSummary,
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Result of removing a session from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected {
    pub user_id: Uuid,
    /// True when this was the user's last live connection.
    pub went_offline: bool,
}

/// WebSocket gateway managing all connections, presence, and rooms.
pub struct Gateway {
    /// Active sessions by session_id
    sessions: DashMap<String, Arc<ConnectedSession>>,
    /// User ID to session IDs mapping (one user can have multiple devices)
    user_sessions: DashMap<Uuid, Vec<String>>,
    /// Match ID to session IDs subscribed to that room
    rooms: DashMap<Uuid, Vec<String>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            user_sessions: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Register an authenticated session. Returns true when this is the
    /// user's first live connection (the user came online).
    pub fn register_session(&self, session: ConnectedSession) -> bool {
        let user_id = session.user.id;
        let session_id = session.session_id.clone();

        // A session id can only ever carry one identity; release any
        // previous binding so the old user's presence does not leak.
        if self.sessions.contains_key(&session_id) {
            self.unregister_session(&session_id);
        }

        self.sessions.insert(session_id.clone(), Arc::new(session));

        let mut entry = self.user_sessions.entry(user_id).or_default();
        let came_online = entry.is_empty();
        entry.push(session_id.clone());
        drop(entry);

        tracing::info!(
            user_id = %user_id,
            session_id = %session_id,
            "Session registered"
        );

        came_online
    }

    /// Unregister a session and remove it from every room. Returns `None`
    /// for sessions that never authenticated.
    pub fn unregister_session(&self, session_id: &str) -> Option<Disconnected> {
        let (_, session) = self.sessions.remove(session_id)?;
        let user_id = session.user.id;

        if let Some(mut remaining) = self.user_sessions.get_mut(&user_id) {
            remaining.retain(|s| s != session_id);
        }
        // The emptiness check and the removal must be one atomic step: a
        // concurrent register for the same user may push a fresh session id
        // between them, and an unconditional remove would wipe it.
        let went_offline = self
            .user_sessions
            .remove_if(&user_id, |_, sessions| sessions.is_empty())
            .is_some();

        self.rooms.retain(|_, members| {
            members.retain(|s| s != session_id);
            !members.is_empty()
        });

        tracing::info!(
            user_id = %user_id,
            session_id = %session_id,
            went_offline = went_offline,
            "Session unregistered"
        );

        Some(Disconnected {
            user_id,
            went_offline,
        })
    }

    /// Subscribe a session to a match room.
    pub fn join_room(&self, match_id: Uuid, session_id: &str) {
        let mut members = self.rooms.entry(match_id).or_default();
        if !members.iter().any(|s| s == session_id) {
            members.push(session_id.to_string());
        }
    }

    /// Whether a session has joined the given room.
    pub fn is_room_member(&self, match_id: Uuid, session_id: &str) -> bool {
        self.rooms
            .get(&match_id)
            .map(|members| members.iter().any(|s| s == session_id))
            .unwrap_or(false)
    }

    /// Send an event to every session in a room, optionally excluding one
    /// (typing indicators are never echoed to their sender).
    pub fn send_to_room(&self, match_id: Uuid, event: &ServerEvent, exclude: Option<&str>) {
        if let Some(members) = self.rooms.get(&match_id) {
            for session_id in members.iter() {
                if exclude == Some(session_id.as_str()) {
                    continue;
                }
                if let Some(session) = self.sessions.get(session_id) {
                    let _ = session.sender.send(event.clone());
                }
            }
        }
    }

    /// Send an event to all sessions of a user.
    pub fn send_to_user(&self, user_id: Uuid, event: &ServerEvent) {
        if let Some(session_ids) = self.user_sessions.get(&user_id) {
            for session_id in session_ids.iter() {
                if let Some(session) = self.sessions.get(session_id) {
                    let _ = session.sender.send(event.clone());
                }
            }
        }
    }

    /// Broadcast an event to every connected session (presence updates are
    /// global: any of the user's matches may care).
    pub fn broadcast(&self, event: &ServerEvent) {
        for session in self.sessions.iter() {
            let _ = session.sender.send(event.clone());
        }
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceProvider for Gateway {
    /// Online means at least one registered handle.
    fn is_user_online(&self, user_id: Uuid) -> bool {
        self.user_sessions
            .get(&user_id)
            .map(|sessions| !sessions.is_empty())
            .unwrap_or(false)
    }
}
