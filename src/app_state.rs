//! Shared application state injected into all Axum handlers.

use crate::config::PokerConfig;
use crate::service::{EngineHandle, SessionEngine};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Command queue into the session engine.
    pub engine: EngineHandle,
}

impl AppState {
    /// Spawns the session engine and keeps its handle.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(config: &PokerConfig) -> Self {
        let engine = SessionEngine::spawn(config);
        Self { engine }
    }
}
