//! Core server framework.
//!
//! - `config.rs`: explicit server configuration resolved from the environment
//! - `server.rs`: JSON-RPC envelope, method routing, STDIO and HTTP transports

pub mod config;
pub mod server;
