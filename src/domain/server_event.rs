//! Outbound protocol events and their room addressing.
//!
//! Every applied mutation yields one or more [`Broadcast`]s. The engine
//! hands them to the [`super::BroadcastDispatcher`], which queues the
//! event for every member of the addressed session channel.

use serde::Serialize;

use super::room::{RoomSnapshot, VoteMap};
use super::{ParticipantId, SessionId};

/// Server → client event, serialized as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full room snapshot.
    SessionUpdate(RoomSnapshot),
    /// Votes-only update.
    VotesUpdate(VoteMap),
    /// Reveal gate, as a bare boolean.
    RevealVotes(bool),
    /// Sent once to a new connection with the id the server assigned.
    Connected {
        /// The connection's participant id.
        id: ParticipantId,
    },
}

impl ServerEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::SessionUpdate(_) => "sessionUpdate",
            Self::VotesUpdate(_) => "votesUpdate",
            Self::RevealVotes(_) => "revealVotes",
            Self::Connected { .. } => "connected",
        }
    }
}

/// An event addressed to every member of one session channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    /// Target channel.
    pub session_id: SessionId,
    /// Payload.
    pub event: ServerEvent,
}

impl Broadcast {
    /// Creates a broadcast for `session_id`.
    #[must_use]
    pub fn new(session_id: SessionId, event: ServerEvent) -> Self {
        Self { session_id, event }
    }
}
