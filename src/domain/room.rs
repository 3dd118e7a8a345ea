//! Authoritative state of a single planning room.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ParticipantId, SessionId};

/// Vote values used when a room is created without custom points.
pub const DEFAULT_STORY_POINTS: [&str; 8] = ["1", "2", "3", "5", "8", "13", "21", "Pass"];

/// Participant id to the raw vote value they cast.
pub type VoteMap = BTreeMap<ParticipantId, String>;

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Connection-scoped identifier.
    pub id: ParticipantId,
    /// Display name supplied on join.
    pub name: String,
}

/// A unit of work being estimated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Display name.
    pub name: String,
    /// External reference link (issue tracker URL).
    pub link: String,
}

/// Aggregate holding everything the clients of one session see.
///
/// Mutators return `bool` so callers can tell an applied change from a
/// silently rejected one; none of them fail. Rejections keep the room
/// untouched so the invariants below hold after every call:
///
/// - `votes` keys are a subset of the participant ids.
/// - `selected_ticket`, when set, indexes into `tickets`.
/// - `host_id` never changes after creation.
#[derive(Debug, Clone)]
pub struct Room {
    session_id: SessionId,
    host_id: ParticipantId,
    participants: Vec<Participant>,
    tickets: Vec<Ticket>,
    votes: VoteMap,
    selected_ticket: Option<usize>,
    revealed: bool,
    story_points: Vec<String>,
    last_activity_at: DateTime<Utc>,
}

impl Room {
    /// Creates an empty room owned by `host_id`.
    ///
    /// An empty `story_points` list means "use [`DEFAULT_STORY_POINTS`]".
    #[must_use]
    pub fn new(session_id: SessionId, host_id: ParticipantId, story_points: Vec<String>) -> Self {
        let story_points = if story_points.is_empty() {
            DEFAULT_STORY_POINTS.iter().map(ToString::to_string).collect()
        } else {
            story_points
        };
        Self {
            session_id,
            host_id,
            participants: Vec::new(),
            tickets: Vec::new(),
            votes: VoteMap::new(),
            selected_ticket: None,
            revealed: false,
            story_points,
            last_activity_at: Utc::now(),
        }
    }

    /// Session key of this room.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The participant that created the room.
    #[must_use]
    pub fn host_id(&self) -> &ParticipantId {
        &self.host_id
    }

    /// Returns `true` if `id` is the room's host.
    #[must_use]
    pub fn is_host(&self, id: &ParticipantId) -> bool {
        self.host_id == *id
    }

    /// Participants in join order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Tickets in insertion order.
    #[must_use]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Current votes.
    #[must_use]
    pub fn votes(&self) -> &VoteMap {
        &self.votes
    }

    /// Index of the ticket under estimation, if any.
    #[must_use]
    pub fn selected_ticket(&self) -> Option<usize> {
        self.selected_ticket
    }

    /// Whether votes have been revealed.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Allowed vote values, fixed at creation.
    #[must_use]
    pub fn story_points(&self) -> &[String] {
        &self.story_points
    }

    /// Timestamp of the last applied mutation.
    #[must_use]
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    /// Returns `true` if `id` is currently a participant.
    #[must_use]
    pub fn has_participant(&self, id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| p.id == *id)
    }

    /// Adds a participant unless one with the same id is already present.
    ///
    /// Returns `true` if the participant was added.
    pub fn add_participant(&mut self, id: ParticipantId, name: String) -> bool {
        if self.has_participant(&id) {
            return false;
        }
        self.participants.push(Participant { id, name });
        self.touch();
        true
    }

    /// Removes a participant together with their vote.
    ///
    /// Returns `true` if the participant was present.
    pub fn remove_participant(&mut self, id: &ParticipantId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.id != *id);
        self.votes.remove(id);
        let removed = self.participants.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Appends a ticket.
    pub fn add_ticket(&mut self, ticket: Ticket) {
        self.tickets.push(ticket);
        self.touch();
    }

    /// Selects a ticket for estimation, clearing votes and the reveal gate.
    ///
    /// Returns `false` without mutating if `index` is out of range.
    pub fn select_ticket(&mut self, index: usize) -> bool {
        if index >= self.tickets.len() {
            return false;
        }
        self.votes.clear();
        self.selected_ticket = Some(index);
        self.revealed = false;
        self.touch();
        true
    }

    /// Records `vote` for `voter`, replacing any previous vote.
    ///
    /// The value is not checked against the story points. Returns `false`
    /// if `voter` is not a participant.
    pub fn cast_vote(&mut self, voter: ParticipantId, vote: String) -> bool {
        if !self.has_participant(&voter) {
            return false;
        }
        self.votes.insert(voter, vote);
        self.touch();
        true
    }

    /// Opens the reveal gate.
    pub fn reveal(&mut self) {
        self.revealed = true;
        self.touch();
    }

    /// Clears votes, the selection, and the reveal gate.
    pub fn reset(&mut self) {
        self.votes.clear();
        self.selected_ticket = None;
        self.revealed = false;
        self.touch();
    }

    /// Builds the full client-facing snapshot.
    #[must_use]
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            tickets: self.tickets.clone(),
            votes: self.votes.clone(),
            users: self.participants.clone(),
            host_id: self.host_id.clone(),
            story_points: self.story_points.clone(),
            selected_ticket: self.selected_ticket,
            reveal: self.revealed,
        }
    }

    fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }
}

/// Full room state as broadcast in `sessionUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Tickets in insertion order.
    pub tickets: Vec<Ticket>,
    /// Raw votes, sent regardless of the reveal gate.
    pub votes: VoteMap,
    /// Participants in join order.
    pub users: Vec<Participant>,
    /// Room host.
    pub host_id: ParticipantId,
    /// Allowed vote values.
    pub story_points: Vec<String>,
    /// Selected ticket index or `null`.
    pub selected_ticket: Option<usize>,
    /// Reveal gate.
    pub reveal: bool,
}
