//! API Server Module
//!
//! Router construction and the listening server.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use dataroom_core::{AppConfig, MAX_FILE_SIZE};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tokio::net::TcpListener;
use tracing::info;

use crate::handlers::{chat, get_session, health_check, reset_session, root, upload_file, ApiState};

/// Transport limit, above the upload cap so oversize files reach validation
pub const BODY_LIMIT: usize = MAX_FILE_SIZE + 1024 * 1024;

/// Main API server
pub struct ApiServer {
    config: AppConfig,
    state: Arc<ApiState>,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: Arc<ApiState>) -> Self {
        Self { config, state }
    }

    /// Bind and serve until Ctrl-C
    pub async fn start(&self) -> Result<()> {
        let app = create_router(self.state.clone(), &self.config.allowed_origins());

        let listener = bind_listener(&self.config.backend_host, self.config.backend_port).await?;
        info!("Data Room API listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| anyhow::anyhow!("API server failed: {}", e))?;

        info!("Data Room API stopped");
        Ok(())
    }
}

/// Bind a listener, resolving hostnames such as `localhost` and bare IPv6
/// addresses such as `::`
pub async fn bind_listener(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))
}

/// Build the router with all routes configured.
pub fn create_router(state: Arc<ApiState>, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .route("/api/upload", post(upload_file))
        .route("/api/chat", post(chat))
        .route("/api/session/:session_id", get(get_session))
        .route("/api/reset", post(reset_session))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_listener_hostname() {
        let listener = bind_listener("localhost", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_listener_ip_literal() {
        let listener = bind_listener("127.0.0.1", 0).await.unwrap();
        assert_eq!(listener.local_addr().unwrap().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_bind_listener_unresolvable_host() {
        let err = bind_listener("not a host name", 0).await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind not a host name:0"));
    }
}
