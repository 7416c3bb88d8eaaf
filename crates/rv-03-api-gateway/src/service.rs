//! API Gateway service - router assembly and serving.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::middleware::{create_cors_layer, track_requests, GatewayMetrics};
use crate::{routes, ws};
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use rv_01_submissions::SubmissionLifecycleApi;
use rv_02_realtime::{ConnectionRegistry, FanoutStats};
use shared_bus::EventPublisher;
use shared_types::IdentityResolver;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Collaborators the gateway drives.
pub struct GatewayDependencies {
    pub lifecycle: Arc<dyn SubmissionLifecycleApi>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub resolver: Arc<dyn IdentityResolver>,
    /// Used for operator notices; lifecycle events are published by rv-01.
    pub publisher: Arc<dyn EventPublisher>,
    pub fanout_stats: Arc<FanoutStats>,
    /// Flips to `true` when the node shuts down.
    pub shutdown: watch::Receiver<bool>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<dyn SubmissionLifecycleApi>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub resolver: Arc<dyn IdentityResolver>,
    pub publisher: Arc<dyn EventPublisher>,
    pub fanout_stats: Arc<FanoutStats>,
    pub metrics: Arc<GatewayMetrics>,
    pub config: Arc<GatewayConfig>,
    pub shutdown: watch::Receiver<bool>,
}

/// API Gateway service
pub struct ApiGatewayService {
    state: AppState,
}

impl ApiGatewayService {
    /// Create a new API Gateway service
    pub fn new(config: GatewayConfig, deps: GatewayDependencies) -> Result<Self, GatewayError> {
        config.validate()?;

        let state = AppState {
            lifecycle: deps.lifecycle,
            registry: deps.registry,
            resolver: deps.resolver,
            publisher: deps.publisher,
            fanout_stats: deps.fanout_stats,
            metrics: Arc::new(GatewayMetrics::new()),
            config: Arc::new(config),
            shutdown: deps.shutdown,
        };
        Ok(Self { state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Build the full router: REST routes, `/health` and `/ws`.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the configured HTTP address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.state.config.http_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })
    }

    /// Serve until the shutdown signal flips.
    pub async fn serve(self, listener: TcpListener) -> Result<(), GatewayError> {
        let addr = listener.local_addr()?;
        let router = self.router();
        let shutdown = self.state.shutdown.clone();

        info!(addr = %addr, "API Gateway listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;
        info!("API Gateway stopped");
        Ok(())
    }
}

/// Build the router for `state`.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let api = Router::new()
        .merge(routes::submissions::router())
        .merge(routes::admin::router())
        .route("/health", get(routes::health))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state.metrics),
            track_requests,
        ))
        .layer(DefaultBodyLimit::max(config.limits.max_body_size))
        .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
        .layer(TimeoutLayer::new(config.timeouts.request));

    // The upgrade route stays outside the request timeout.
    Router::new()
        .merge(api)
        .route("/ws", get(ws::ws_upgrade))
        .layer(create_cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves once `shutdown` reads `true` or its sender is gone.
pub async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}
