//! Process-wide room storage owned by the session engine.
//!
//! [`SessionStore`] maps session ids to [`Room`]s. It has no interior
//! locking: the engine task is its single owner and every access happens
//! from that one task, so a plain `HashMap` is enough.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::{ParticipantId, Room, SessionId};

/// Central store for all live rooms.
#[derive(Debug, Default)]
pub struct SessionStore {
    rooms: HashMap<SessionId, Room>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room for `session_id`, creating it on first use.
    ///
    /// `host_id` and `story_points` only apply when the room is created;
    /// an existing room is returned unchanged. The flag is `true` if the
    /// room was created by this call.
    pub fn get_or_create(
        &mut self,
        session_id: &SessionId,
        host_id: &ParticipantId,
        story_points: Vec<String>,
    ) -> (&mut Room, bool) {
        let created = !self.rooms.contains_key(session_id);
        let room = self
            .rooms
            .entry(session_id.clone())
            .or_insert_with(|| Room::new(session_id.clone(), host_id.clone(), story_points));
        (room, created)
    }

    /// Looks up a room.
    #[must_use]
    pub fn get(&self, session_id: &SessionId) -> Option<&Room> {
        self.rooms.get(session_id)
    }

    /// Looks up a room for mutation.
    pub fn get_mut(&mut self, session_id: &SessionId) -> Option<&mut Room> {
        self.rooms.get_mut(session_id)
    }

    /// Removes a participant (and their vote) from one room.
    ///
    /// Unknown sessions and non-members are a no-op. Returns `true` if a
    /// participant was removed.
    pub fn remove_participant(
        &mut self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> bool {
        self.rooms
            .get_mut(session_id)
            .is_some_and(|room| room.remove_participant(participant_id))
    }

    /// Sessions in which `participant_id` is currently a member, sorted.
    #[must_use]
    pub fn memberships(&self, participant_id: &ParticipantId) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .rooms
            .values()
            .filter(|room| room.has_participant(participant_id))
            .map(|room| room.session_id().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drops rooms that have no participants and no activity since
    /// `cutoff`. Returns the evicted session ids.
    pub fn evict_idle(&mut self, cutoff: DateTime<Utc>) -> Vec<SessionId> {
        let stale: Vec<SessionId> = self
            .rooms
            .values()
            .filter(|room| room.participants().is_empty() && room.last_activity_at() < cutoff)
            .map(|room| room.session_id().clone())
            .collect();
        for id in &stale {
            self.rooms.remove(id);
        }
        stale
    }

    /// Number of rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if there are no rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
