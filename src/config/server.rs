//! HTTP/WebSocket server configuration.
//!
//! Constants for the socket heartbeat plus the runtime settings read from the
//! environment at startup.

use std::time::Duration;
use log::warn;

use crate::config::hub::{DIRECTORY_REFRESH_SECS, ENDED_ROOM_TTL_SECS};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Interval (in seconds) between heartbeat pings sent to each client.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 5;

/// A client silent for longer than this (in seconds) is disconnected.
pub const CLIENT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, overridable through `HUB_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `None` disables the periodic directory broadcast.
    pub directory_refresh: Option<Duration>,
    /// `None` keeps ended rooms forever.
    pub ended_room_ttl: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            directory_refresh: Some(Duration::from_secs(DIRECTORY_REFRESH_SECS)),
            ended_room_ttl: Some(Duration::from_secs(ENDED_ROOM_TTL_SECS)),
        }
    }
}

impl ServerConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HUB_HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parse_or("HUB_PORT", lookup("HUB_PORT"), DEFAULT_PORT),
            directory_refresh: secs_or_disabled(parse_or(
                "HUB_DIRECTORY_REFRESH_SECS",
                lookup("HUB_DIRECTORY_REFRESH_SECS"),
                DIRECTORY_REFRESH_SECS,
            )),
            ended_room_ttl: secs_or_disabled(parse_or(
                "HUB_ENDED_ROOM_TTL_SECS",
                lookup("HUB_ENDED_ROOM_TTL_SECS"),
                ENDED_ROOM_TTL_SECS,
            )),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("[Config] Ignoring invalid {}={:?}", key, raw);
            default
        }),
    }
}

fn secs_or_disabled(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
