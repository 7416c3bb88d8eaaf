//! `/submissions` routes.

use super::parse_id;
use crate::auth::AuthenticatedPrincipal;
use crate::domain::error::ApiError;
use crate::service::AppState;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use rv_01_submissions::{
    Action, AuditLogEntry, BatchItemOutcome, NewSubmission, SubmissionFilter, SubmissionStats,
    TransitionInput,
};
use serde::Deserialize;
use shared_types::{Principal, Role, Submission};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submissions", post(create).get(list))
        .route("/submissions/stats", get(stats))
        .route("/submissions/batch", post(batch))
        .route("/submissions/:id", get(read).delete(delete))
        .route("/submissions/:id/audit", get(audit))
        .route("/submissions/:id/approve", patch(approve))
        .route("/submissions/:id/reject", patch(reject))
        .route("/submissions/:id/notes", patch(update_notes))
}

/// Open to every authenticated role; the caller is recorded as submitter.
async fn create(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    body: Result<Json<NewSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let Json(input) = body?;
    let submission = state.lifecycle.create_submission(input, &principal).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

async fn list(
    State(state): State<AppState>,
    _auth: AuthenticatedPrincipal,
    filter: Result<Query<SubmissionFilter>, QueryRejection>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let Query(filter) = filter?;
    Ok(Json(state.lifecycle.list_submissions(&filter).await?))
}

async fn stats(
    State(state): State<AppState>,
    _auth: AuthenticatedPrincipal,
) -> Result<Json<SubmissionStats>, ApiError> {
    Ok(Json(state.lifecycle.statistics().await?))
}

async fn read(
    State(state): State<AppState>,
    _auth: AuthenticatedPrincipal,
    Path(id): Path<String>,
) -> Result<Json<Submission>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.lifecycle.get_submission(&id).await?))
}

async fn audit(
    State(state): State<AppState>,
    auth: AuthenticatedPrincipal,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    auth.require_role(&[Role::Verifier, Role::Admin])?;
    let id = parse_id(&id)?;
    Ok(Json(state.lifecycle.audit_trail(&id).await?))
}

/// Approve/reject bodies are optional; an empty body means no notes.
fn transition_input(body: &Bytes) -> Result<TransitionInput, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TransitionInput::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::validation(format!("invalid request body: {}", e)))
}

async fn run_transition(
    state: &AppState,
    principal: &Principal,
    id: &str,
    action: Action,
    input: TransitionInput,
) -> Result<Json<Submission>, ApiError> {
    let id = parse_id(id)?;
    let result = state.lifecycle.transition(&id, action, principal, input).await;
    state.metrics.record_transition(result.is_ok());
    Ok(Json(result?))
}

async fn approve(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Submission>, ApiError> {
    let input = transition_input(&body)?;
    run_transition(&state, &principal, &id, Action::Approve, input).await
}

async fn reject(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Submission>, ApiError> {
    let input = transition_input(&body)?;
    run_transition(&state, &principal, &id, Action::Reject, input).await
}

async fn update_notes(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Submission>, ApiError> {
    let input = transition_input(&body)?;
    run_transition(&state, &principal, &id, Action::UpdateNotes, input).await
}

async fn delete(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(id): Path<String>,
) -> Result<Json<Submission>, ApiError> {
    let id = parse_id(&id)?;
    let result = state.lifecycle.delete_submission(&id, &principal).await;
    state.metrics.record_transition(result.is_ok());
    Ok(Json(result?))
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    ids: Vec<String>,
    action: Action,
}

async fn batch(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<Vec<BatchItemOutcome>>, ApiError> {
    let Json(request) = body?;
    let outcomes = state
        .lifecycle
        .batch_transition(&request.ids, request.action, &principal)
        .await?;
    for outcome in &outcomes {
        state.metrics.record_transition(outcome.is_ok());
    }
    Ok(Json(outcomes))
}
