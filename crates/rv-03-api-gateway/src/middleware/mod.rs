//! Middleware stack for the API Gateway.
//!
//! Layer order: Request → Trace → CORS → Timeout → BodyLimit → Metrics → Handler.
//! Authentication is an extractor, not a layer, so `/health` stays open.

pub mod cors;
pub mod metrics;

pub use cors::create_cors_layer;
pub use metrics::{track_requests, GatewayMetrics, RequestTimer};
