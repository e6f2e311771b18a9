use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup. Required values are fatal
/// immediately rather than on the first request that needs them.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub asset_upload_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub query_timeout: Duration,
    pub upload_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let asset_upload_url = required("ASSET_UPLOAD_URL")?;
        let port: u16 = parsed("PORT", DEFAULT_PORT)?;
        let max_connections = parsed("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let query_timeout_secs = parsed("QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS)?;
        let upload_timeout_secs = parsed("UPLOAD_TIMEOUT_SECS", DEFAULT_UPLOAD_TIMEOUT_SECS)?;

        Ok(Self {
            database_url,
            asset_upload_url,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            max_connections,
            query_timeout: Duration::from_secs(query_timeout_secs),
            upload_timeout: Duration::from_secs(upload_timeout_secs),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw.clone(),
        }),
        Err(_) => Ok(default),
    }
}
