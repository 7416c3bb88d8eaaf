//! RV-03 API Gateway - REST and WebSocket interface of the verification core.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       API GATEWAY (rv-03)                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐          │
//! │  │ /submissions │   │    /admin    │   │     /ws      │          │
//! │  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘          │
//! │         │                  │                  │                  │
//! │  ┌──────┴──────────────────┴──────────────────┴──────┐           │
//! │  │  Trace → CORS → Timeout → BodyLimit → Metrics     │           │
//! │  └──────┬──────────────────┬──────────────────┬──────┘           │
//! │         │          Bearer auth (extractor)    │                  │
//! └─────────┼──────────────────┼──────────────────┼──────────────────┘
//!           ▼                  ▼                  ▼
//!    rv-01 lifecycle    shared-bus notices   rv-02 registry
//! ```
//!
//! # Authentication
//!
//! Every route except `/health` requires `Authorization: Bearer <token>`.
//! The WebSocket endpoint also accepts `?token=` or a first frame
//! `{"type":"auth","token":"..."}` sent within the handshake window.
//!
//! # Usage
//!
//! ```ignore
//! use rv_03_api_gateway::{ApiGatewayService, GatewayConfig, GatewayDependencies};
//!
//! let service = ApiGatewayService::new(config, deps)?;
//! service.serve(listener).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod auth;
pub mod domain;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod ws;

pub use auth::{bearer_token, AuthenticatedPrincipal, StaticTokenResolver};
pub use domain::config::{
    AuthConfig, ConfigError, CorsConfig, GatewayConfig, HttpConfig, LimitsConfig, TimeoutConfig,
    TokenEntry, WebSocketConfig,
};
pub use domain::error::{ApiError, GatewayError};
pub use middleware::GatewayMetrics;
pub use service::{ApiGatewayService, AppState, GatewayDependencies};
