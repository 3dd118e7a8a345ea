//! Service layer: event routing, connection tracking, and the engine task.

pub mod connection_registry;
pub mod engine;
pub mod event_router;

pub use connection_registry::ConnectionRegistry;
pub use engine::{EngineCommand, EngineHandle, EngineStats, SessionEngine};
pub use event_router::EventRouter;
