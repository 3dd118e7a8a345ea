//! Live connection tracking and disconnect cleanup.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{ParticipantId, SessionId, SessionStore};

/// Tracks which connections are live.
///
/// Room membership is not stored here: it is derived from the rooms'
/// participant lists, so a disconnect reaches every joined room exactly
/// once. Outbound queues live in the dispatcher.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    live: HashMap<ParticipantId, DateTime<Utc>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly upgraded connection.
    pub fn register(&mut self, id: ParticipantId) {
        tracing::debug!(participant_id = %id, "connection registered");
        self.live.insert(id, Utc::now());
    }

    /// Forgets `id` and removes it from every room it belongs to.
    ///
    /// Returns the affected sessions, sorted. The store is updated before
    /// this returns, so snapshots built afterwards never list `id`.
    pub fn disconnect(&mut self, id: &ParticipantId, store: &mut SessionStore) -> Vec<SessionId> {
        if let Some(connected_at) = self.live.remove(id) {
            let duration_secs = (Utc::now() - connected_at).num_seconds();
            tracing::debug!(participant_id = %id, duration_secs, "connection closed");
        }
        let rooms = store.memberships(id);
        for session_id in &rooms {
            if store.remove_participant(session_id, id) {
                tracing::info!(%session_id, participant_id = %id, "participant left");
            }
        }
        rooms
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if no connection is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    fn sid(s: &str) -> SessionId {
        SessionId::from(s)
    }

    #[test]
    fn register_and_disconnect_track_liveness() {
        let mut registry = ConnectionRegistry::new();
        let mut store = SessionStore::new();
        registry.register(pid("u1"));
        registry.register(pid("u1"));
        assert_eq!(registry.len(), 1);

        let affected = registry.disconnect(&pid("u1"), &mut store);
        assert!(affected.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn disconnect_leaves_every_room_and_drops_votes() {
        let mut registry = ConnectionRegistry::new();
        let mut store = SessionStore::new();
        registry.register(pid("u2"));
        for session in ["a", "b"] {
            let (room, _) = store.get_or_create(&sid(session), &pid("u1"), Vec::new());
            room.add_participant(pid("u1"), "Ann".to_string());
            room.add_participant(pid("u2"), "Bob".to_string());
            room.cast_vote(pid("u2"), "3".to_string());
        }

        let affected = registry.disconnect(&pid("u2"), &mut store);
        assert_eq!(affected, vec![sid("a"), sid("b")]);
        for session in ["a", "b"] {
            let Some(room) = store.get(&sid(session)) else {
                panic!("room {session} missing");
            };
            assert!(!room.has_participant(&pid("u2")));
            assert!(!room.votes().contains_key(&pid("u2")));
            assert!(room.has_participant(&pid("u1")));
        }
    }

    #[test]
    fn host_disconnect_keeps_host_id() {
        let mut registry = ConnectionRegistry::new();
        let mut store = SessionStore::new();
        let (room, _) = store.get_or_create(&sid("a"), &pid("u1"), Vec::new());
        room.add_participant(pid("u1"), "Ann".to_string());
        room.add_participant(pid("u2"), "Bob".to_string());

        registry.disconnect(&pid("u1"), &mut store);
        let Some(room) = store.get(&sid("a")) else {
            panic!("room missing");
        };
        assert_eq!(room.host_id(), &pid("u1"));
        assert_eq!(room.participants().len(), 1);
    }
}
