//! devrev-mcp - MCP server for DevRev
//!
//! Runs as an MCP server over stdio (default) or streamable HTTP, letting
//! MCP clients work with DevRev through natural language.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `DEVREV_API_TOKEN`: DevRev personal access token (required)
//! - `DEVREV_API_VERSION`: `public` or `beta`
//! - `MCP_TRANSPORT`: `stdio` or `streamable-http`
//! - `MCP_AUTH_TOKEN`: Bearer token required on the HTTP transport
//!
//! # Usage
//!
//! ```bash
//! DEVREV_API_TOKEN=xxx ./devrev-mcp
//! ```

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use devrev_mcp::{
    client::DevRevClient,
    config::{Config, LogFormat, ServerConfig, Transport},
    middleware::audit,
    server::DevRevServer,
    transport,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    let server_config =
        ServerConfig::from_env().context("Failed to load MCP server configuration")?;

    init_tracing(&server_config)?;
    audit::set_enabled(server_config.audit_log_enabled);

    tracing::info!(
        "Starting {} v{}",
        server_config.server_name,
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load DevRev configuration")?;

    tracing::debug!(
        base_url = %config.base_url,
        api_version = config.api_version.as_str(),
        "Configuration loaded"
    );

    let client = DevRevClient::new(&config).context("Failed to create DevRev client")?;

    // Test connection to DevRev before starting
    tracing::info!("Testing connection to DevRev...");
    match client.dev_users_self().await {
        Ok(user) => tracing::info!(user = %user.label(), "Connected to DevRev"),
        Err(e) => {
            tracing::error!(error = %client.sanitize(&e.to_string()), "Connection test failed");
            tracing::warn!(
                "Server will start but may not be able to reach DevRev. \
                 Check DEVREV_API_TOKEN, DEVREV_BASE_URL and network connectivity."
            );
        }
    }

    let transport_kind = server_config.transport;
    let server = DevRevServer::new(client, server_config);

    match transport_kind {
        Transport::Stdio => transport::serve_stdio(server)
            .await
            .context("stdio transport failed")?,
        Transport::StreamableHttp => {
            let config = server.config().clone();
            transport::serve_http(server, &config)
                .await
                .context("HTTP transport failed")?
        }
    }

    tracing::info!("Server shutting down");

    Ok(())
}

/// Logs go to stderr; stdout is reserved for stdio JSON-RPC.
fn init_tracing(config: &ServerConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("devrev_mcp={}", config.log_level))
            .context("Invalid MCP_LOG_LEVEL")?,
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}
