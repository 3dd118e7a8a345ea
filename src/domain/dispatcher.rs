//! Fan-out of room events to connected clients.
//!
//! [`BroadcastDispatcher`] is owned by the session engine. It holds one
//! bounded outbound queue per connection and the member set of every
//! session channel, so channel membership is decided in the same place
//! and order as the room mutations themselves.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{Broadcast, ParticipantId, ServerEvent, SessionId};

/// Sender half of a connection's outbound queue.
pub type Outlet = mpsc::Sender<ServerEvent>;

/// Channel membership plus per-connection delivery.
///
/// Delivery never blocks the engine. A connection whose queue is full or
/// whose task has gone is detached on the spot: its outlet is dropped, the
/// connection task sees its queue close and shuts the socket, and the
/// regular disconnect path then removes it from its rooms.
#[derive(Debug, Default)]
pub struct BroadcastDispatcher {
    outlets: HashMap<ParticipantId, Outlet>,
    channels: HashMap<SessionId, BTreeSet<ParticipantId>>,
}

impl BroadcastDispatcher {
    /// Creates a dispatcher with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the outbound queue of a new connection.
    pub fn attach(&mut self, participant_id: ParticipantId, outlet: Outlet) {
        self.outlets.insert(participant_id, outlet);
    }

    /// Drops the connection's queue and leaves every channel.
    ///
    /// Returns `false` if the connection was not attached.
    pub fn detach(&mut self, participant_id: &ParticipantId) -> bool {
        self.channels.retain(|_, members| {
            members.remove(participant_id);
            !members.is_empty()
        });
        self.outlets.remove(participant_id).is_some()
    }

    /// Subscribes `participant_id` to the channel of `session_id`.
    ///
    /// Takes effect for every broadcast made after this call. Returns
    /// `true` if newly joined.
    pub fn join(&mut self, participant_id: ParticipantId, session_id: SessionId) -> bool {
        tracing::trace!(%participant_id, %session_id, "channel join");
        self.channels
            .entry(session_id)
            .or_default()
            .insert(participant_id)
    }

    /// Delivers `event` to every connection subscribed to `session_id`.
    ///
    /// Returns the number of connections the event was queued for.
    pub fn broadcast(&mut self, session_id: SessionId, event: ServerEvent) -> usize {
        self.dispatch(&Broadcast::new(session_id, event))
    }

    /// Delivers an already addressed broadcast.
    pub fn dispatch(&mut self, broadcast: &Broadcast) -> usize {
        let Some(members) = self.channels.get(&broadcast.session_id) else {
            tracing::trace!(session_id = %broadcast.session_id, "no channel members");
            return 0;
        };

        let mut delivered = 0;
        let mut stalled = Vec::new();
        for member in members {
            let Some(outlet) = self.outlets.get(member) else {
                continue;
            };
            match outlet.try_send(broadcast.event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        participant_id = %member,
                        session_id = %broadcast.session_id,
                        "outbound queue full, dropping connection"
                    );
                    stalled.push(member.clone());
                }
                Err(TrySendError::Closed(_)) => stalled.push(member.clone()),
            }
        }
        tracing::trace!(
            session_id = %broadcast.session_id,
            event = broadcast.event.event_name(),
            delivered,
            "dispatched"
        );

        for member in &stalled {
            self.detach(member);
        }
        delivered
    }

    /// Number of connections subscribed to `session_id`.
    #[must_use]
    pub fn channel_size(&self, session_id: &SessionId) -> usize {
        self.channels.get(session_id).map_or(0, BTreeSet::len)
    }
}
