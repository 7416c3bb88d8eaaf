//! REST routes.

pub mod admin;
pub mod submissions;

use crate::domain::error::ApiError;
use axum::Json;
use serde_json::{json, Value};
use shared_types::SubmissionId;

/// Liveness probe. Unauthenticated.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) fn parse_id(raw: &str) -> Result<SubmissionId, ApiError> {
    Ok(SubmissionId::parse(raw)?)
}
