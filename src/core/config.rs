//! Server configuration.
//!
//! A single explicit struct carries everything the transports need: identity
//! (name/version reported during initialize), transport selection, and HTTP
//! bind settings. Values are resolved from environment variables once at
//! startup; nothing is registered globally.
//!
//! Environment variables:
//! - `SERVER_NAME`: server name (default: "test-python-project")
//! - `SERVER_VERSION`: version string (default: "1.0.0")
//! - `MCP_TRANSPORT_MODE`: "stdio", "http", or "both" (default: "both")
//! - `HOST`: bind address for HTTP mode (default: "0.0.0.0")
//! - `PORT`: port number for HTTP mode (default: 3000)
//! - `WORKER_THREADS`: HTTP worker count (default: CPU count, capped at 16)

use std::env;

use thiserror::Error;

const DEFAULT_SERVER_NAME: &str = "test-python-project";
const DEFAULT_SERVER_VERSION: &str = "1.0.0";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// Error raised when the environment holds an unusable configuration value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid transport mode '{0}': must be 'stdio', 'http', or 'both'")]
    InvalidTransportMode(String),
}

/// Which transport(s) the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// JSON-RPC lines on stdin/stdout only.
    Stdio,
    /// HTTP endpoints only.
    Http,
    /// STDIO and HTTP concurrently.
    Both,
}

impl TransportMode {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "stdio" => Ok(TransportMode::Stdio),
            "http" => Ok(TransportMode::Http),
            "both" => Ok(TransportMode::Both),
            other => Err(ConfigError::InvalidTransportMode(other.to_string())),
        }
    }
}

/// Process-wide server configuration, resolved once at startup and passed
/// explicitly to the transports.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Name reported in initialize responses.
    pub server_name: String,
    /// Version string reported in initialize responses.
    pub server_version: String,
    pub transport: TransportMode,
    /// Bind address for the HTTP transport.
    pub host: String,
    /// Port for the HTTP transport.
    pub port: u16,
    /// HTTP worker thread count; `None` derives the count from the CPU.
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            server_version: DEFAULT_SERVER_VERSION.to_string(),
            transport: TransportMode::Both,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            workers: None,
        }
    }
}

impl ServerConfig {
    /// Build a configuration from the process environment.
    ///
    /// Unset or unparsable numeric values fall back to their defaults. An
    /// unrecognized transport mode is an error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let transport = match env::var("MCP_TRANSPORT_MODE") {
            Ok(value) => TransportMode::parse(&value)?,
            Err(_) => defaults.transport,
        };

        Ok(Self {
            server_name: env::var("SERVER_NAME").unwrap_or(defaults.server_name),
            server_version: env::var("SERVER_VERSION").unwrap_or(defaults.server_version),
            transport,
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            workers: env::var("WORKER_THREADS")
                .ok()
                .and_then(|s| s.parse().ok()),
        })
    }

    /// Worker thread count for the HTTP server.
    ///
    /// Defaults to the CPU count, clamped to [1, 16] to avoid excessive
    /// context switching on large machines.
    pub fn effective_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| num_cpus::get().min(16).max(1))
    }

    /// Bind address in `host:port` form.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
