//! Session engine: the single owner of all room state.
//!
//! Connection tasks never touch rooms. They send [`EngineCommand`]s
//! through an [`EngineHandle`]; the engine task applies them one at a
//! time, in arrival order, and publishes the resulting broadcasts before
//! taking the next command. Nothing interleaves within a room, so no lock
//! guards the store.
//!
//! The engine also owns the [`BroadcastDispatcher`]. A `joinSession`
//! subscribes the sender to the session's channel before the snapshot is
//! dispatched, so the joiner receives that snapshot and nothing older.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::{ConnectionRegistry, EventRouter};
use crate::config::PokerConfig;
use crate::domain::{
    Broadcast, BroadcastDispatcher, ClientEvent, Outlet, ParticipantId, ServerEvent, SessionStore,
};
use crate::error::PokerError;

/// Work item for the engine task.
#[derive(Debug)]
pub enum EngineCommand {
    /// A WebSocket connection was upgraded.
    Connect {
        /// Id assigned to the connection.
        participant_id: ParticipantId,
        /// Queue the connection task drains into its socket.
        outlet: Outlet,
    },
    /// A decoded protocol event from a connection.
    Event {
        /// Sending connection.
        participant_id: ParticipantId,
        /// The event.
        event: ClientEvent,
    },
    /// A connection closed.
    Disconnect {
        /// Closed connection.
        participant_id: ParticipantId,
    },
    /// Read-only counters for the health endpoint.
    Stats {
        /// Reply channel.
        reply: oneshot::Sender<EngineStats>,
    },
}

/// Engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Rooms in the store.
    pub rooms: usize,
    /// Live connections.
    pub connections: usize,
}

/// Cloneable sender side of the engine's command queue.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineCommand>,
    outbound_capacity: usize,
}

impl EngineHandle {
    /// Announces a new connection and returns its outbound queue.
    ///
    /// The queue yields every event broadcast to the sessions the
    /// connection joins. It closes when the engine drops the connection,
    /// either on disconnect or because the queue overflowed.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::EngineUnavailable`] if the engine has stopped.
    pub async fn connect(
        &self,
        participant_id: ParticipantId,
    ) -> Result<mpsc::Receiver<ServerEvent>, PokerError> {
        let (outlet, inbox) = mpsc::channel(self.outbound_capacity);
        self.send(EngineCommand::Connect {
            participant_id,
            outlet,
        })
        .await?;
        Ok(inbox)
    }

    /// Submits a protocol event from `participant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::EngineUnavailable`] if the engine has stopped.
    pub async fn submit(
        &self,
        participant_id: ParticipantId,
        event: ClientEvent,
    ) -> Result<(), PokerError> {
        self.send(EngineCommand::Event {
            participant_id,
            event,
        })
        .await
    }

    /// Announces that a connection closed.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::EngineUnavailable`] if the engine has stopped.
    pub async fn disconnect(&self, participant_id: ParticipantId) -> Result<(), PokerError> {
        self.send(EngineCommand::Disconnect { participant_id }).await
    }

    /// Queries room and connection counts.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::EngineUnavailable`] if the engine has stopped
    /// or dropped the reply.
    pub async fn stats(&self) -> Result<EngineStats, PokerError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Stats { reply }).await?;
        rx.await.map_err(|_| PokerError::EngineUnavailable)
    }

    async fn send(&self, command: EngineCommand) -> Result<(), PokerError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| PokerError::EngineUnavailable)
    }
}

/// The engine task state.
#[derive(Debug)]
pub struct SessionEngine {
    router: EventRouter,
    registry: ConnectionRegistry,
    dispatcher: BroadcastDispatcher,
    commands: mpsc::Receiver<EngineCommand>,
    room_idle_timeout: Option<Duration>,
    eviction_interval: Duration,
}

impl SessionEngine {
    /// Builds an engine with an empty store and returns it with its handle.
    #[must_use]
    pub fn new(config: &PokerConfig) -> (Self, EngineHandle) {
        let (sender, commands) = mpsc::channel(config.command_queue_capacity.max(1));
        let handle = EngineHandle {
            sender,
            outbound_capacity: config.outbound_queue_capacity.max(1),
        };
        let engine = Self {
            router: EventRouter::new(SessionStore::new(), config.default_story_points.clone()),
            registry: ConnectionRegistry::new(),
            dispatcher: BroadcastDispatcher::new(),
            commands,
            room_idle_timeout: config.room_idle_timeout,
            eviction_interval: config.eviction_interval,
        };
        (engine, handle)
    }

    /// Spawns the engine on the current runtime and returns its handle.
    #[must_use]
    pub fn spawn(config: &PokerConfig) -> EngineHandle {
        let (engine, handle) = Self::new(config);
        tokio::spawn(engine.run());
        handle
    }

    /// Processes commands until every [`EngineHandle`] is dropped.
    pub async fn run(mut self) {
        let mut sweep = tokio::time::interval(self.eviction_interval);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let evicting = self.room_idle_timeout.is_some();

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.apply(command),
                        None => break,
                    }
                }
                _ = sweep.tick(), if evicting => {
                    self.evict_idle();
                }
            }
        }

        tracing::debug!("session engine stopped");
    }

    /// Applies one command and publishes its broadcasts.
    pub fn apply(&mut self, command: EngineCommand) {
        let broadcasts = match command {
            EngineCommand::Connect {
                participant_id,
                outlet,
            } => {
                self.registry.register(participant_id.clone());
                self.dispatcher.attach(participant_id, outlet);
                Vec::new()
            }
            EngineCommand::Event {
                participant_id,
                event,
            } => {
                tracing::debug!(
                    participant_id = %participant_id,
                    session_id = %event.session_id(),
                    event = event.event_name(),
                    "event received"
                );
                if let ClientEvent::JoinSession(join) = &event {
                    self.dispatcher
                        .join(participant_id.clone(), join.session_id.clone());
                    tracing::debug!(
                        session_id = %join.session_id,
                        members = self.dispatcher.channel_size(&join.session_id),
                        "channel joined"
                    );
                }
                self.router.handle(&participant_id, event)
            }
            EngineCommand::Disconnect { participant_id } => {
                self.dispatcher.detach(&participant_id);
                let affected = self
                    .registry
                    .disconnect(&participant_id, self.router.store_mut());
                self.router.snapshots(&affected)
            }
            EngineCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
                Vec::new()
            }
        };
        self.publish(broadcasts);
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            rooms: self.router.store().len(),
            connections: self.registry.len(),
        }
    }

    /// Read access to the store.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        self.router.store()
    }

    fn publish(&mut self, broadcasts: Vec<Broadcast>) {
        for broadcast in &broadcasts {
            self.dispatcher.dispatch(broadcast);
        }
    }

    fn evict_idle(&mut self) {
        let Some(timeout) = self.room_idle_timeout else {
            return;
        };
        let Ok(timeout) = chrono::Duration::from_std(timeout) else {
            return;
        };
        let Some(cutoff) = chrono::Utc::now().checked_sub_signed(timeout) else {
            tracing::warn!(
                timeout_secs = timeout.num_seconds(),
                "idle timeout reaches past the earliest timestamp, skipping sweep"
            );
            return;
        };
        for session_id in self.router.store_mut().evict_idle(cutoff) {
            tracing::info!(%session_id, "idle room evicted");
        }
    }
}
