//! # poker-room
//!
//! Real-time planning poker server. Participants join a shared room over
//! WebSocket, vote on tickets, and see the votes revealed together once
//! the reveal gate opens.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket /ws, HTTP /health)
//!     │
//!     ├── WS connection tasks (ws/)        decode frames, drain outbound queue
//!     │
//!     ├── SessionEngine task (service/)    single owner of all room state
//!     │     ├── EventRouter                protocol handlers
//!     │     └── ConnectionRegistry         live connections, disconnect cleanup
//!     │
//!     ├── SessionStore / Room (domain/)    authoritative model
//!     └── BroadcastDispatcher (domain/)    channel membership, per-connection queues
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
