//! MCP server entry point.
//!
//! Resolves the server configuration from the environment, initializes
//! logging on stderr, and starts the configured transport(s): STDIO for MCP
//! hosts driving the process over stdin/stdout, HTTP for deployments behind
//! a web endpoint, or both concurrently.

mod core;
mod tools;

use tracing_subscriber::EnvFilter;

use crate::core::config::{ServerConfig, TransportMode};
use crate::core::server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Logs must go to stderr: stdout carries the JSON-RPC stream in STDIO mode.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    match config.transport {
        TransportMode::Stdio => server::run_stdio(config).await,
        TransportMode::Http => server::run_http(config).await,
        TransportMode::Both => {
            // STDIO runs as a background task while HTTP holds the
            // foreground; the STDIO task is aborted once HTTP exits.
            let stdio_config = config.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_stdio(stdio_config).await {
                    tracing::error!(error = %e, "STDIO transport failed");
                }
            });

            let http_result = server::run_http(config).await;
            stdio_handle.abort();
            http_result
        }
    }
}
