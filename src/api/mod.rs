//! HTTP surface: router composition and the operational endpoint.
//!
//! The planning protocol itself lives on `/ws`; the only plain HTTP route
//! is `/health`.

pub mod system;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::PokerConfig;
use crate::error::PokerError;
use crate::ws::handler::ws_handler;

/// Builds the complete application router with tracing and CORS layers.
///
/// # Errors
///
/// Returns [`PokerError::InvalidConfig`] if the configured origin is not
/// a valid header value.
pub fn build_router(state: AppState, config: &PokerConfig) -> Result<Router, PokerError> {
    let cors = cors_layer(config.allowed_origin.as_deref())?;

    Ok(Router::new()
        .merge(system::routes())
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}

/// CORS policy: a single allowed origin when configured, permissive
/// otherwise.
///
/// # Errors
///
/// Returns [`PokerError::InvalidConfig`] if `origin` is not a valid
/// header value.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, PokerError> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin = HeaderValue::from_str(origin).map_err(|e| PokerError::InvalidConfig {
        key: "ALLOWED_ORIGIN",
        message: e.to_string(),
    })?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST]))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn missing_origin_is_permissive() {
        assert!(cors_layer(None).is_ok());
    }

    #[test]
    fn valid_origin_is_accepted() {
        assert!(cors_layer(Some("https://poker.example")).is_ok());
    }

    #[test]
    fn invalid_origin_is_a_config_error() {
        let Err(PokerError::InvalidConfig { key, .. }) = cors_layer(Some("bad\norigin")) else {
            panic!("expected InvalidConfig");
        };
        assert_eq!(key, "ALLOWED_ORIGIN");
    }
}
