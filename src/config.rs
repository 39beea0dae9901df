//! Runtime configuration read from environment variables.

use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Recreate the schema on start.
    pub initialize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// `None` runs the service on the in-memory store.
    pub database: Option<DatabaseConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_or(&lookup, "BIND_ADDR", || {
            DEFAULT_BIND_ADDR.parse().map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
                reason: format!("{e}"),
            })
        })?;

        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            None => None,
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", || {
                    Ok(DEFAULT_MAX_CONNECTIONS)
                })?,
                initialize: parse_or(&lookup, "DATABASE_INIT", || Ok(false))?,
            }),
        };

        Ok(Self {
            bind_addr,
            database,
        })
    }
}

fn parse_or<F, T, D>(lookup: &F, name: &'static str, default: D) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> Result<T, ConfigError>,
{
    match lookup(name) {
        None => default(),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            })
        }
    }
}
