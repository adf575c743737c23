//! Server configuration parsed from environment variables.
//!
//! All settings are optional; defaults reproduce a single open canvas on
//! port 3001 with incremental undo broadcast.

use std::net::IpAddr;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BACKGROUND: &str = "#f9f9f9";
pub const DEFAULT_HUB_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} ({reason})")]
    Invalid { var: &'static str, value: String, reason: String },
}

/// How a successful undo is replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoSync {
    /// Broadcast only the removed segment's id.
    #[default]
    Incremental,
    /// Broadcast a clear followed by the full remaining history.
    Resync,
}

impl FromStr for UndoSync {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incremental" => Ok(Self::Incremental),
            "resync" => Ok(Self::Resync),
            other => Err(format!("expected incremental or resync, got {other}")),
        }
    }
}

/// Allowed CORS origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowOrigin {
    Any,
    Exact(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub undo_sync: UndoSync,
    /// Canvas background; clients draw eraser strokes in this color.
    pub background: String,
    pub hub_queue_capacity: usize,
    pub client_queue_capacity: usize,
    pub allow_origin: AllowOrigin,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            undo_sync: UndoSync::default(),
            background: DEFAULT_BACKGROUND.to_string(),
            hub_queue_capacity: DEFAULT_HUB_QUEUE_CAPACITY,
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
            allow_origin: AllowOrigin::Any,
        }
    }
}

impl Config {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `HOST`: bind address (default `0.0.0.0`)
    /// - `PORT`: listen port (default 3001)
    /// - `UNDO_SYNC`: `incremental` (default) or `resync`
    /// - `CANVAS_BACKGROUND`: background/eraser color (default `#f9f9f9`)
    /// - `HUB_QUEUE_CAPACITY`: hub command queue depth (default 1024)
    /// - `CLIENT_QUEUE_CAPACITY`: per-connection outbound depth (default 256)
    /// - `CORS_ALLOW_ORIGIN`: `*` (default) or one exact origin
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first unparseable variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first unparseable variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = parse_var(&get, "HOST", defaults.host)?;
        let port = parse_var(&get, "PORT", defaults.port)?;
        let undo_sync = parse_var(&get, "UNDO_SYNC", defaults.undo_sync)?;
        let background = get("CANVAS_BACKGROUND").unwrap_or(defaults.background);
        let hub_queue_capacity = parse_capacity(&get, "HUB_QUEUE_CAPACITY", defaults.hub_queue_capacity)?;
        let client_queue_capacity = parse_capacity(&get, "CLIENT_QUEUE_CAPACITY", defaults.client_queue_capacity)?;
        let allow_origin = match get("CORS_ALLOW_ORIGIN") {
            None => defaults.allow_origin,
            Some(v) if v.trim() == "*" => AllowOrigin::Any,
            Some(v) => AllowOrigin::Exact(v.trim().to_string()),
        };

        Ok(Self { host, port, undo_sync, background, hub_queue_capacity, client_queue_capacity, allow_origin })
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = get(var) else {
        return Ok(default);
    };
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::Invalid { var, value: value.clone(), reason: e.to_string() })
}

/// Channel capacities must be non-zero; tokio panics on a zero-sized mpsc.
fn parse_capacity(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    let capacity = parse_var(get, var, default)?;
    if capacity == 0 {
        return Err(ConfigError::Invalid { var, value: "0".into(), reason: "must be at least 1".into() });
    }
    Ok(capacity)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
