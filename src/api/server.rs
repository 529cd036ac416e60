//! HTTP Server implementation
//!
//! This module provides the HTTP server using Axum framework with:
//! - Configurable host/port binding
//! - Graceful shutdown handling
//! - Request timeouts
//! - Single-origin CORS with credentials

use crate::api::handlers::{handle_middleware_error, not_found, AppState};
use crate::api::middleware::trace_id_middleware;
use crate::api::routes::build_api_routes;
use crate::core::config::{Config, ServerConfig};
use anyhow::Context;
use axum::{error_handling::HandleErrorLayer, http::HeaderValue, middleware, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

/// HTTP API Server
pub struct ApiServer {
    router: Router,
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new API server from configuration and the shared state
    pub fn new(config: &Config, state: AppState) -> anyhow::Result<Self> {
        let router = Self::build_router(config, state)?;

        Ok(Self {
            router,
            config: config.server.clone(),
        })
    }

    /// Build the Axum router with all routes and middleware
    pub fn build_router(config: &Config, state: AppState) -> anyhow::Result<Router> {
        let cors = Self::build_cors_layer(&config.security.allowed_origin)?;
        let request_timeout = Duration::from_secs(config.server.request_timeout);

        let router = build_api_routes(state)
            .fallback(not_found)
            .layer(
                ServiceBuilder::new()
                    // Add trace ID middleware for request tracking
                    .layer(middleware::from_fn(trace_id_middleware))
                    // Add tracing for all requests
                    .layer(TraceLayer::new_for_http())
                    .layer(cors)
                    // Turn timeouts into JSON errors
                    .layer(HandleErrorLayer::new(handle_middleware_error))
                    .timeout(request_timeout),
            );

        Ok(router)
    }

    /// Build the CORS layer for the single allowed origin
    ///
    /// Credentials are allowed, so methods and headers are mirrored from the
    /// preflight request instead of answered with `*`.
    fn build_cors_layer(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
        let origin: HeaderValue = allowed_origin
            .parse()
            .with_context(|| format!("Invalid CORS origin: {}", allowed_origin))?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list([origin]))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true))
    }

    /// Start the HTTP server and listen for requests
    ///
    /// This method will block until the server is shut down gracefully.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", addr))?;

        info!(
            host = %self.config.host,
            port = self.config.port,
            request_timeout = self.config.request_timeout,
            "Starting HTTP server"
        );

        let listener = tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("Failed to bind {}", socket_addr))?;

        info!(addr = %socket_addr, "HTTP server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server shut down gracefully");

        Ok(())
    }

    /// Get a reference to the router
    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown...");
}
