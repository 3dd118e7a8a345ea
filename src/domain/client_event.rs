//! Inbound protocol events.
//!
//! Wire shape is `{"event": <name>, "data": <payload>}`; decoding from a
//! text frame lives in `ws::messages`.

use serde::Deserialize;

use super::{ParticipantId, SessionId, Ticket};

/// Client → server protocol event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join (and possibly create) a room.
    JoinSession(JoinSession),
    /// Host-only: pick the ticket under estimation.
    SelectTicket(SelectTicket),
    /// Record a vote.
    CastVote(CastVote),
    /// Append a ticket to the room.
    AddTicket(AddTicket),
    /// Open the reveal gate. The payload is the bare session id.
    RevealVotes(SessionId),
    /// Start over: clear votes, selection and reveal.
    ResetSession(SessionRef),
}

impl ClientEvent {
    /// Session the event is addressed to.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::JoinSession(e) => &e.session_id,
            Self::SelectTicket(e) => &e.session_id,
            Self::CastVote(e) => &e.session_id,
            Self::AddTicket(e) => &e.session_id,
            Self::RevealVotes(session_id) => session_id,
            Self::ResetSession(e) => &e.session_id,
        }
    }

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::JoinSession(_) => "joinSession",
            Self::SelectTicket(_) => "selectTicket",
            Self::CastVote(_) => "castVote",
            Self::AddTicket(_) => "addTicket",
            Self::RevealVotes(_) => "revealVotes",
            Self::ResetSession(_) => "resetSession",
        }
    }
}

/// `joinSession` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSession {
    /// Room to join.
    pub session_id: SessionId,
    /// Display name.
    pub user_name: String,
    /// Custom vote values; only used if this join creates the room.
    #[serde(default)]
    pub story_points: Option<Vec<String>>,
}

/// `selectTicket` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTicket {
    /// Target room.
    pub session_id: SessionId,
    /// Index into the room's tickets.
    pub ticket_index: usize,
}

/// `castVote` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVote {
    /// Target room.
    pub session_id: SessionId,
    /// Voter.
    pub user_id: ParticipantId,
    /// Vote value, accepted as-is.
    pub vote: String,
}

/// `addTicket` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTicket {
    /// Target room.
    pub session_id: SessionId,
    /// Ticket to append.
    pub ticket: Ticket,
}

/// Payload that only names a session (`resetSession`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRef {
    /// Target room.
    pub session_id: SessionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_covers_every_variant() {
        let sid = SessionId::from("s");
        let events = [
            ClientEvent::JoinSession(JoinSession {
                session_id: sid.clone(),
                user_name: "Ann".to_string(),
                story_points: None,
            }),
            ClientEvent::SelectTicket(SelectTicket {
                session_id: sid.clone(),
                ticket_index: 0,
            }),
            ClientEvent::CastVote(CastVote {
                session_id: sid.clone(),
                user_id: ParticipantId::from("u1"),
                vote: "5".to_string(),
            }),
            ClientEvent::AddTicket(AddTicket {
                session_id: sid.clone(),
                ticket: Ticket {
                    name: "T-1".to_string(),
                    link: String::new(),
                },
            }),
            ClientEvent::RevealVotes(sid.clone()),
            ClientEvent::ResetSession(SessionRef {
                session_id: sid.clone(),
            }),
        ];
        for event in &events {
            assert_eq!(event.session_id(), &sid);
        }
        let names: Vec<_> = events.iter().map(ClientEvent::event_name).collect();
        assert_eq!(
            names,
            [
                "joinSession",
                "selectTicket",
                "castVote",
                "addTicket",
                "revealVotes",
                "resetSession"
            ]
        );
    }
}
