//! `/admin` routes. Every handler requires the admin role.

use crate::auth::AuthenticatedPrincipal;
use crate::domain::error::ApiError;
use crate::service::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rv_01_submissions::AuditLogEntry;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_bus::{DomainEvent, NoticeLevel, SystemNotice};
use shared_types::UserId;
use tracing::info;

const MAX_NOTICE_LEN: usize = 2000;
const DEFAULT_AUDIT_LIMIT: usize = 50;
const MAX_AUDIT_LIMIT: usize = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/connections", get(connections))
        .route("/admin/users/:id/online", get(user_online))
        .route("/admin/users/:id/disconnect", post(disconnect_user))
        .route("/admin/notifications", post(broadcast_notice))
        .route("/admin/metrics", get(metrics))
        .route("/admin/audit", get(recent_audit))
}

async fn connections(
    State(state): State<AppState>,
    auth: AuthenticatedPrincipal,
) -> Result<Json<Value>, ApiError> {
    auth.require_admin()?;
    Ok(Json(json!({
        "total": state.registry.connection_count(),
        "byRole": state.registry.count_by_role(),
        "byCountry": state.registry.count_by_country(),
    })))
}

async fn user_online(
    State(state): State<AppState>,
    auth: AuthenticatedPrincipal,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    auth.require_admin()?;
    let user_id = UserId::new(user_id)?;
    let connections = state.registry.connections_for_user(&user_id).len();
    Ok(Json(json!({
        "userId": user_id,
        "online": connections > 0,
        "connections": connections,
    })))
}

async fn disconnect_user(
    State(state): State<AppState>,
    auth: AuthenticatedPrincipal,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let admin = auth.require_admin()?;
    let user_id = UserId::new(user_id)?;
    let closed = state.registry.force_disconnect_user(&user_id);
    info!(admin = %admin.user_id, user_id = %user_id, closed, "Admin disconnect");
    Ok(Json(json!({ "userId": user_id, "closed": closed })))
}

#[derive(Debug, Deserialize)]
struct NoticeRequest {
    message: String,
    #[serde(default)]
    level: NoticeLevel,
}

async fn broadcast_notice(
    State(state): State<AppState>,
    auth: AuthenticatedPrincipal,
    body: Result<Json<NoticeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let admin = auth.require_admin()?;
    let Json(request) = body?;

    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::validation("message must not be empty"));
    }
    if message.chars().count() > MAX_NOTICE_LEN {
        return Err(ApiError::validation(format!(
            "message exceeds {} characters",
            MAX_NOTICE_LEN
        )));
    }

    let notice = SystemNotice {
        message: message.to_string(),
        level: request.level,
        issued_by: admin.user_id.clone(),
        issued_at: Utc::now(),
    };
    info!(admin = %admin.user_id, level = ?notice.level, "System notice issued");
    state.publisher.publish(DomainEvent::SystemNotice(notice)).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "accepted": true,
            "connections": state.registry.connection_count(),
        })),
    ))
}

async fn metrics(
    State(state): State<AppState>,
    auth: AuthenticatedPrincipal,
) -> Result<Json<Value>, ApiError> {
    auth.require_admin()?;
    Ok(Json(json!({
        "gateway": state.metrics.to_json(),
        "fanout": state.fanout_stats.snapshot(),
        "eventsPublished": state.publisher.events_published(),
        "connections": state.registry.connection_count(),
    })))
}

#[derive(Debug, Default, Deserialize)]
struct AuditQuery {
    limit: Option<usize>,
}

async fn recent_audit(
    State(state): State<AppState>,
    auth: AuthenticatedPrincipal,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    auth.require_admin()?;
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);
    Ok(Json(state.lifecycle.recent_activity(limit).await?))
}
