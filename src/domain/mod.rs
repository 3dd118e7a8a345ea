//! Domain layer: identifiers, room model, session store, and fan-out.
//!
//! Everything here is synchronous; the dispatcher only ever `try_send`s.
//! Rooms are plain data owned by the [`SessionStore`]; the session
//! engine in `service` is the only code that mutates them.

pub mod client_event;
pub mod dispatcher;
pub mod ids;
pub mod room;
pub mod server_event;
pub mod session_store;

pub use client_event::ClientEvent;
pub use dispatcher::{BroadcastDispatcher, Outlet};
pub use ids::{ParticipantId, SessionId};
pub use room::{Participant, Room, RoomSnapshot, Ticket, VoteMap};
pub use server_event::{Broadcast, ServerEvent};
pub use session_store::SessionStore;
