//! Server configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing keys fall back to defaults;
//! a present but unparsable value is a startup error.

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::room::DEFAULT_STORY_POINTS;
use crate::error::PokerError;

/// Top-level server configuration.
///
/// Loaded once at startup via [`PokerConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Single origin allowed for cross-origin access. `None` allows any.
    pub allowed_origin: Option<String>,

    /// Bound of each connection's outbound event queue. A connection that
    /// falls this far behind is dropped.
    pub outbound_queue_capacity: usize,

    /// Bound of the engine's inbound command queue.
    pub command_queue_capacity: usize,

    /// Vote values for rooms created without custom points.
    pub default_story_points: Vec<String>,

    /// Empty rooms idle this long are evicted. `None` keeps rooms forever.
    pub room_idle_timeout: Option<Duration>,

    /// Period of the idle eviction sweep.
    pub eviction_interval: Duration,
}

impl Default for PokerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            allowed_origin: None,
            outbound_queue_capacity: 256,
            command_queue_capacity: 1024,
            default_story_points: DEFAULT_STORY_POINTS.iter().map(ToString::to_string).collect(),
            room_idle_timeout: None,
            eviction_interval: Duration::from_secs(60),
        }
    }
}

impl PokerConfig {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::InvalidConfig`] if a variable is set but
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, PokerError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`PokerError::InvalidConfig`] if a value is present but
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PokerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = parse_var(&lookup, "LISTEN_ADDR", defaults.listen_addr)?;
        let allowed_origin = lookup("ALLOWED_ORIGIN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let outbound_queue_capacity = parse_var(
            &lookup,
            "OUTBOUND_QUEUE_CAPACITY",
            defaults.outbound_queue_capacity,
        )?;
        let command_queue_capacity = parse_var(
            &lookup,
            "COMMAND_QUEUE_CAPACITY",
            defaults.command_queue_capacity,
        )?;

        let default_story_points = lookup("DEFAULT_STORY_POINTS")
            .map(|v| parse_story_points(&v))
            .filter(|points| !points.is_empty())
            .unwrap_or(defaults.default_story_points);

        let idle_secs: u64 = parse_var(&lookup, "ROOM_IDLE_TIMEOUT_SECS", 0)?;
        let room_idle_timeout = (idle_secs > 0).then(|| Duration::from_secs(idle_secs));
        if let Some(timeout) = room_idle_timeout {
            check_idle_timeout(timeout)?;
        }
        let interval_secs: u64 = parse_var(&lookup, "EVICTION_INTERVAL_SECS", 60)?;
        let eviction_interval = Duration::from_secs(interval_secs.max(1));

        Ok(Self {
            listen_addr,
            allowed_origin,
            outbound_queue_capacity,
            command_queue_capacity,
            default_story_points,
            room_idle_timeout,
            eviction_interval,
        })
    }
}

/// Parses `key` as `T`, returning `default` when it is unset.
fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, PokerError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| PokerError::InvalidConfig {
                key,
                message: e.to_string(),
            }),
    }
}

/// Rejects idle timeouts too large to subtract from the current time.
fn check_idle_timeout(timeout: Duration) -> Result<(), PokerError> {
    let fits = chrono::Duration::from_std(timeout)
        .ok()
        .and_then(|delta| chrono::Utc::now().checked_sub_signed(delta))
        .is_some();
    if fits {
        Ok(())
    } else {
        Err(PokerError::InvalidConfig {
            key: "ROOM_IDLE_TIMEOUT_SECS",
            message: format!("{} seconds is out of range", timeout.as_secs()),
        })
    }
}

/// Splits a comma-separated list, dropping blanks.
fn parse_story_points(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
