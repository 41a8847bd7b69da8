use std::net::SocketAddr;

use serde_json::Value;
use spout_core::env_value;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid listen address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Configuration for the HTTP-mode executor
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// Passed unchanged as `context` to every invocation
    pub context: Value,
    /// Include `Duration` in success envelopes
    pub report_duration: bool,
    /// Keep loaded handlers for subsequent requests
    pub cache_handlers: bool,
}

impl Config {
    /// Create a new config with validation
    pub fn try_new(
        host: &str,
        port: u16,
        context: Option<&str>,
        report_duration: bool,
        cache_handlers: bool,
    ) -> Result<Self, ConfigError> {
        let address = format!("{host}:{port}");
        let addr = address
            .parse()
            .map_err(|source| ConfigError::InvalidAddress { address, source })?;

        Ok(Self {
            addr,
            context: env_value(context),
            report_duration,
            cache_handlers,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            context: env_value(None),
            report_duration: true,
            cache_handlers: false,
        }
    }
}
