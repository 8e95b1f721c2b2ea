//! # mcp-latitude
//!
//! MCP (Model Context Protocol) server exposing the Latitude.sh bare-metal
//! API as schema-validated tools. Runs as a stdio JSON-RPC server, launched
//! by an AI agent host.
//!
//! ## Architecture
//!
//! ```text
//! main.rs        entry point: .env, CLI, tracing, config, client, MCP loop
//! config.rs      CLI flags / env vars, validated once at startup
//! redact.rs      secret scrubbing for anything written to logs or results
//! error.rs       ApiError taxonomy, operation context, call stages
//! schema.rs      per-tool argument tables and the generic validator
//! params.rs      tool arguments -> JSON:API query keys and resource documents
//! client.rs      HTTP client for the Latitude.sh REST API
//! normalize.rs   JSON:API envelope -> uniform {data, meta} result
//! operations/    one module per resource (projects, servers, plans, ...)
//! tools.rs       tool definitions and dispatch
//! mcp.rs         MCP JSON-RPC protocol handler (stdio)
//! ```
//!
//! A tool call flows validator -> mapper -> client -> normalizer and comes
//! back as pretty-printed JSON, or as an `isError` result with a classified
//! message.

mod client;
mod config;
mod error;
mod mcp;
mod normalize;
mod operations;
mod params;
mod redact;
mod schema;
mod tools;

#[cfg(test)]
mod test_support;

use clap::Parser;
use tracing::{error, info};

use client::LatitudeClient;
use config::{Cli, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let client = match LatitudeClient::new(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    info!(
        base_url = config.base_url(),
        timeout_ms = config.timeout_ms(),
        tools = schema::TOOLS.len(),
        "mcp-latitude v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    mcp::run_stdio(&client).await;
    info!("stdin closed, shutting down");
}
