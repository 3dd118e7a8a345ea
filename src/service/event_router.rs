//! Event router: applies client events to rooms and computes broadcasts.

use crate::domain::client_event::{AddTicket, CastVote, JoinSession, SelectTicket};
use crate::domain::{Broadcast, ClientEvent, ParticipantId, ServerEvent, SessionId, SessionStore};

/// Applies protocol events to the [`SessionStore`].
///
/// Synchronous and lock-free: the session engine owns the router and
/// calls it from a single task. Every handler follows the pattern:
/// resolve room → check authority → mutate → return broadcasts. A
/// rejected event mutates nothing and returns no broadcasts.
#[derive(Debug)]
pub struct EventRouter {
    store: SessionStore,
    default_story_points: Vec<String>,
}

impl EventRouter {
    /// Creates a router over `store`. `default_story_points` applies to
    /// rooms created without custom points.
    #[must_use]
    pub fn new(store: SessionStore, default_story_points: Vec<String>) -> Self {
        Self {
            store,
            default_story_points,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Returns the underlying store for mutation.
    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// Dispatches `event` from `sender` to its handler.
    pub fn handle(&mut self, sender: &ParticipantId, event: ClientEvent) -> Vec<Broadcast> {
        match event {
            ClientEvent::JoinSession(join) => self.join_session(sender, join),
            ClientEvent::SelectTicket(select) => self.select_ticket(sender, select),
            ClientEvent::CastVote(vote) => self.cast_vote(vote),
            ClientEvent::AddTicket(add) => self.add_ticket(add),
            ClientEvent::RevealVotes(session_id) => self.reveal_votes(session_id),
            ClientEvent::ResetSession(reset) => self.reset_session(reset.session_id),
        }
    }

    /// `joinSession`: create the room on first join, then add `sender`.
    pub fn join_session(&mut self, sender: &ParticipantId, join: JoinSession) -> Vec<Broadcast> {
        let story_points = join
            .story_points
            .filter(|points| !points.is_empty())
            .unwrap_or_else(|| self.default_story_points.clone());

        let (room, created) = self
            .store
            .get_or_create(&join.session_id, sender, story_points);
        if created {
            tracing::info!(session_id = %join.session_id, host_id = %sender, "room created");
        }
        if room.add_participant(sender.clone(), join.user_name) {
            tracing::info!(session_id = %join.session_id, participant_id = %sender, "participant joined");
        }

        vec![Broadcast::new(
            join.session_id,
            ServerEvent::SessionUpdate(room.snapshot()),
        )]
    }

    /// `selectTicket`: host only. Clears votes and hides them again.
    pub fn select_ticket(&mut self, sender: &ParticipantId, select: SelectTicket) -> Vec<Broadcast> {
        let Some(room) = self.store.get_mut(&select.session_id) else {
            tracing::debug!(session_id = %select.session_id, "selectTicket for unknown room");
            return Vec::new();
        };
        if !room.is_host(sender) {
            tracing::debug!(
                session_id = %select.session_id,
                participant_id = %sender,
                "selectTicket from non-host ignored"
            );
            return Vec::new();
        }
        if !room.select_ticket(select.ticket_index) {
            tracing::debug!(
                session_id = %select.session_id,
                ticket_index = select.ticket_index,
                "selectTicket index out of range"
            );
            return Vec::new();
        }

        vec![Broadcast::new(
            select.session_id,
            ServerEvent::SessionUpdate(room.snapshot()),
        )]
    }

    /// `castVote`: record the vote and broadcast the votes mapping only.
    pub fn cast_vote(&mut self, vote: CastVote) -> Vec<Broadcast> {
        let Some(room) = self.store.get_mut(&vote.session_id) else {
            tracing::debug!(session_id = %vote.session_id, "castVote for unknown room");
            return Vec::new();
        };
        if !room.cast_vote(vote.user_id.clone(), vote.vote) {
            tracing::debug!(
                session_id = %vote.session_id,
                participant_id = %vote.user_id,
                "castVote from non-member ignored"
            );
            return Vec::new();
        }

        vec![Broadcast::new(
            vote.session_id,
            ServerEvent::VotesUpdate(room.votes().clone()),
        )]
    }

    /// `addTicket`: append a ticket and broadcast the snapshot.
    pub fn add_ticket(&mut self, add: AddTicket) -> Vec<Broadcast> {
        let Some(room) = self.store.get_mut(&add.session_id) else {
            tracing::debug!(session_id = %add.session_id, "addTicket for unknown room");
            return Vec::new();
        };
        room.add_ticket(add.ticket);

        vec![Broadcast::new(
            add.session_id,
            ServerEvent::SessionUpdate(room.snapshot()),
        )]
    }

    /// `revealVotes`: open the reveal gate.
    ///
    /// The broadcast goes out even when the room is unknown; it then
    /// reaches only connections that joined the channel without a room.
    pub fn reveal_votes(&mut self, session_id: SessionId) -> Vec<Broadcast> {
        match self.store.get_mut(&session_id) {
            Some(room) => room.reveal(),
            None => tracing::debug!(session_id = %session_id, "revealVotes for unknown room"),
        }
        vec![Broadcast::new(session_id, ServerEvent::RevealVotes(true))]
    }

    /// `resetSession`: clear the round, then send snapshot, votes and
    /// `false`, in that order.
    pub fn reset_session(&mut self, session_id: SessionId) -> Vec<Broadcast> {
        let Some(room) = self.store.get_mut(&session_id) else {
            tracing::debug!(session_id = %session_id, "resetSession for unknown room");
            return Vec::new();
        };
        room.reset();

        vec![
            Broadcast::new(session_id.clone(), ServerEvent::SessionUpdate(room.snapshot())),
            Broadcast::new(session_id.clone(), ServerEvent::VotesUpdate(room.votes().clone())),
            Broadcast::new(session_id, ServerEvent::RevealVotes(false)),
        ]
    }

    /// Snapshot broadcasts for each listed room that still exists.
    #[must_use]
    pub fn snapshots(&self, session_ids: &[SessionId]) -> Vec<Broadcast> {
        session_ids
            .iter()
            .filter_map(|id| {
                self.store
                    .get(id)
                    .map(|room| Broadcast::new(id.clone(), ServerEvent::SessionUpdate(room.snapshot())))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::room::DEFAULT_STORY_POINTS;
    use crate::domain::{RoomSnapshot, Ticket, VoteMap};
    use crate::domain::client_event::SessionRef;

    const ROOM: &str = "abc123";

    fn router() -> EventRouter {
        EventRouter::new(
            SessionStore::new(),
            DEFAULT_STORY_POINTS.iter().map(ToString::to_string).collect(),
        )
    }

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    fn join(router: &mut EventRouter, who: &str, name: &str) -> Vec<Broadcast> {
        router.handle(
            &pid(who),
            ClientEvent::JoinSession(JoinSession {
                session_id: SessionId::from(ROOM),
                user_name: name.to_string(),
                story_points: None,
            }),
        )
    }

    fn add_ticket(router: &mut EventRouter, who: &str, name: &str) -> Vec<Broadcast> {
        router.handle(
            &pid(who),
            ClientEvent::AddTicket(AddTicket {
                session_id: SessionId::from(ROOM),
                ticket: Ticket {
                    name: name.to_string(),
                    link: format!("https://tracker.example/{name}"),
                },
            }),
        )
    }

    fn select(router: &mut EventRouter, who: &str, index: usize) -> Vec<Broadcast> {
        router.handle(
            &pid(who),
            ClientEvent::SelectTicket(SelectTicket {
                session_id: SessionId::from(ROOM),
                ticket_index: index,
            }),
        )
    }

    fn vote(router: &mut EventRouter, who: &str, value: &str) -> Vec<Broadcast> {
        router.handle(
            &pid(who),
            ClientEvent::CastVote(CastVote {
                session_id: SessionId::from(ROOM),
                user_id: pid(who),
                vote: value.to_string(),
            }),
        )
    }

    fn snapshot_of(broadcast: &Broadcast) -> &RoomSnapshot {
        let ServerEvent::SessionUpdate(snapshot) = &broadcast.event else {
            panic!("expected sessionUpdate, got {:?}", broadcast.event);
        };
        snapshot
    }

    fn votes(pairs: &[(&str, &str)]) -> VoteMap {
        pairs
            .iter()
            .map(|(k, v)| (pid(k), (*v).to_string()))
            .collect()
    }

    #[test]
    fn first_joiner_stays_host() {
        let mut router = router();
        for who in ["u1", "u2", "u3", "u2"] {
            let out = join(&mut router, who, who);
            assert_eq!(out.len(), 1);
            assert_eq!(snapshot_of(&out[0]).host_id, pid("u1"));
        }
        let Some(room) = router.store().get(&SessionId::from(ROOM)) else {
            panic!("room missing");
        };
        assert_eq!(room.participants().len(), 3);
    }

    #[test]
    fn custom_story_points_only_apply_on_creation() {
        let mut router = router();
        let custom = vec!["S".to_string(), "M".to_string()];
        let out = router.handle(
            &pid("u1"),
            ClientEvent::JoinSession(JoinSession {
                session_id: SessionId::from(ROOM),
                user_name: "Ann".to_string(),
                story_points: Some(custom.clone()),
            }),
        );
        assert_eq!(snapshot_of(&out[0]).story_points, custom);

        let out = router.handle(
            &pid("u2"),
            ClientEvent::JoinSession(JoinSession {
                session_id: SessionId::from(ROOM),
                user_name: "Bob".to_string(),
                story_points: Some(vec!["XL".to_string()]),
            }),
        );
        assert_eq!(snapshot_of(&out[0]).story_points, custom);
    }

    #[test]
    fn empty_story_points_use_configured_default() {
        let mut router = EventRouter::new(SessionStore::new(), vec!["?".to_string()]);
        let out = router.handle(
            &pid("u1"),
            ClientEvent::JoinSession(JoinSession {
                session_id: SessionId::from(ROOM),
                user_name: "Ann".to_string(),
                story_points: Some(Vec::new()),
            }),
        );
        assert_eq!(snapshot_of(&out[0]).story_points, ["?"]);
    }

    #[test]
    fn planning_round_scenario() {
        let mut router = router();
        let out = join(&mut router, "u1", "A");
        assert_eq!(snapshot_of(&out[0]).story_points, DEFAULT_STORY_POINTS);
        join(&mut router, "u2", "B");

        let out = vote(&mut router, "u1", "5");
        assert_eq!(out, vec![Broadcast::new(
            SessionId::from(ROOM),
            ServerEvent::VotesUpdate(votes(&[("u1", "5")])),
        )]);

        let out = router.handle(&pid("u1"), ClientEvent::RevealVotes(SessionId::from(ROOM)));
        assert_eq!(out, vec![Broadcast::new(
            SessionId::from(ROOM),
            ServerEvent::RevealVotes(true),
        )]);

        let out = router.handle(
            &pid("u1"),
            ClientEvent::ResetSession(SessionRef {
                session_id: SessionId::from(ROOM),
            }),
        );
        assert_eq!(out.len(), 3);
        let snapshot = snapshot_of(&out[0]);
        assert!(snapshot.votes.is_empty());
        assert!(!snapshot.reveal);
        assert_eq!(snapshot.selected_ticket, None);
        assert_eq!(out[1].event, ServerEvent::VotesUpdate(VoteMap::new()));
        assert_eq!(out[2].event, ServerEvent::RevealVotes(false));
    }

    #[test]
    fn non_host_cannot_select_ticket() {
        let mut router = router();
        join(&mut router, "u1", "A");
        join(&mut router, "u2", "B");
        add_ticket(&mut router, "u1", "T-1");
        add_ticket(&mut router, "u1", "T-2");
        select(&mut router, "u1", 0);
        vote(&mut router, "u2", "3");

        let out = select(&mut router, "u2", 1);
        assert!(out.is_empty());
        let Some(room) = router.store().get(&SessionId::from(ROOM)) else {
            panic!("room missing");
        };
        assert_eq!(room.selected_ticket(), Some(0));
        assert_eq!(room.votes().len(), 1);
    }

    #[test]
    fn host_select_clears_votes_and_reveal() {
        let mut router = router();
        join(&mut router, "u1", "A");
        add_ticket(&mut router, "u1", "T-1");
        add_ticket(&mut router, "u1", "T-2");
        vote(&mut router, "u1", "8");
        router.handle(&pid("u1"), ClientEvent::RevealVotes(SessionId::from(ROOM)));

        let out = select(&mut router, "u1", 1);
        let snapshot = snapshot_of(&out[0]);
        assert_eq!(snapshot.selected_ticket, Some(1));
        assert!(snapshot.votes.is_empty());
        assert!(!snapshot.reveal);
    }

    #[test]
    fn select_on_unknown_room_is_rejected() {
        let mut router = router();
        assert!(select(&mut router, "u1", 0).is_empty());
        assert!(router.store().is_empty());
    }

    #[test]
    fn select_out_of_range_is_rejected() {
        let mut router = router();
        join(&mut router, "u1", "A");
        assert!(select(&mut router, "u1", 0).is_empty());
    }

    #[test]
    fn vote_on_unknown_room_is_ignored() {
        let mut router = router();
        assert!(vote(&mut router, "u1", "5").is_empty());
    }

    #[test]
    fn reveal_keeps_votes_and_tickets() {
        let mut router = router();
        join(&mut router, "u1", "A");
        add_ticket(&mut router, "u1", "T-1");
        vote(&mut router, "u1", "13");

        router.handle(&pid("u1"), ClientEvent::RevealVotes(SessionId::from(ROOM)));
        let Some(room) = router.store().get(&SessionId::from(ROOM)) else {
            panic!("room missing");
        };
        assert!(room.is_revealed());
        assert_eq!(room.votes(), &votes(&[("u1", "13")]));
        assert_eq!(room.tickets().len(), 1);
    }

    #[test]
    fn reveal_on_unknown_room_still_broadcasts() {
        let mut router = router();
        let out = router.handle(&pid("u1"), ClientEvent::RevealVotes(SessionId::from("ghost")));
        assert_eq!(out, vec![Broadcast::new(
            SessionId::from("ghost"),
            ServerEvent::RevealVotes(true),
        )]);
        assert!(router.store().is_empty());
    }

    #[test]
    fn reset_on_unknown_room_is_ignored() {
        let mut router = router();
        let out = router.reset_session(SessionId::from("ghost"));
        assert!(out.is_empty());
    }

    #[test]
    fn add_ticket_broadcasts_snapshot() {
        let mut router = router();
        join(&mut router, "u1", "A");
        let out = add_ticket(&mut router, "u2", "T-9");
        assert_eq!(snapshot_of(&out[0]).tickets.len(), 1);
        assert_eq!(snapshot_of(&out[0]).tickets[0].name, "T-9");
    }

    #[test]
    fn snapshots_skip_missing_rooms() {
        let mut router = router();
        join(&mut router, "u1", "A");
        let out = router.snapshots(&[SessionId::from(ROOM), SessionId::from("ghost")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].session_id, SessionId::from(ROOM));
    }
}
