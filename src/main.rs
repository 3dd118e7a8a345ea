//! poker-room server entry point.
//!
//! Starts the session engine and the Axum server with the WebSocket and
//! health endpoints.

use tracing_subscriber::EnvFilter;

use poker_room::api;
use poker_room::app_state::AppState;
use poker_room::config::PokerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = PokerConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        origin = config.allowed_origin.as_deref().unwrap_or("*"),
        "starting poker-room"
    );

    // Session engine
    let app_state = AppState::start(&config);

    // Build router
    let app = api::build_router(app_state, &config)?;

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
