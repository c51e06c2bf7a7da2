//! Transport wiring.
//!
//! `stdio` serves one MCP session over stdin/stdout. `streamable-http` mounts
//! the rmcp streamable HTTP service at `/mcp` next to `/health`, behind the
//! governance gates from [`crate::middleware`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use rmcp::{
    transport::{
        stdio,
        streamable_http_server::{session::local::LocalSessionManager, StreamableHttpService},
    },
    ServiceExt,
};

use crate::config::ServerConfig;
use crate::error::DevRevError;
use crate::middleware::{
    auth::{bearer_auth_middleware, BearerAuth},
    health::{health_handler, HealthState, HEALTH_PATH},
    rate_limit::{rate_limit_middleware, RateLimiter},
};
use crate::server::DevRevServer;

/// Path the MCP service is mounted at.
pub const MCP_PATH: &str = "/mcp";

/// Serves a single session over stdin/stdout until the client disconnects.
pub async fn serve_stdio(server: DevRevServer) -> anyhow::Result<()> {
    tracing::info!("Serving MCP over stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Failed to start MCP server: {}", e);
    })?;
    service.waiting().await?;
    Ok(())
}

/// Builds the HTTP router: `/health`, the MCP service, and the gates.
///
/// # Errors
///
/// Fails when the configured auth token is unusable.
pub fn build_router(server: DevRevServer, config: &ServerConfig) -> Result<Router, DevRevError> {
    let mcp = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = Router::new()
        .route(
            HEALTH_PATH,
            get(health_handler).with_state(Arc::new(HealthState::new(config.server_name.clone()))),
        )
        .nest_service(MCP_PATH, mcp);

    apply_governance(router, config)
}

/// Wraps `router` in the rate limiter and, outside it, the Bearer gate.
///
/// Either gate is skipped when disabled by configuration.
pub fn apply_governance(router: Router, config: &ServerConfig) -> Result<Router, DevRevError> {
    let mut router = router;

    let limiter = RateLimiter::new(config.rate_limit_rpm, config.bypass_paths.clone());
    if limiter.is_enabled() {
        tracing::info!(rpm = config.rate_limit_rpm, "Rate limiting enabled");
        router = router.layer(from_fn_with_state(Arc::new(limiter), rate_limit_middleware));
    }

    if let Some(token) = &config.auth_token {
        let gate = BearerAuth::new(token.clone(), config.bypass_paths.clone())?;
        tracing::info!("Bearer authentication enabled");
        router = router.layer(from_fn_with_state(Arc::new(gate), bearer_auth_middleware));
    }

    Ok(router)
}

/// Serves streamable HTTP on `host:port` until shutdown.
pub async fn serve_http(server: DevRevServer, config: &ServerConfig) -> anyhow::Result<()> {
    if config.serves_unauthenticated_publicly() {
        tracing::warn!(
            host = %config.host,
            "Serving without MCP_AUTH_TOKEN on a non-loopback host; any client can call tools"
        );
    }

    let router = build_router(server, config)?;
    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        path = MCP_PATH,
        "Serving MCP over streamable HTTP"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received");
    })
    .await?;
    Ok(())
}
