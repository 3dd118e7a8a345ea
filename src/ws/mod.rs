//! WebSocket layer: connection handling and frame decoding.
//!
//! The endpoint at `/ws` carries the planning protocol: clients send
//! `{"event", "data"}` frames and receive broadcasts for the sessions they
//! joined.

pub mod connection;
pub mod handler;
pub mod messages;
