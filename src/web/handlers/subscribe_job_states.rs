//! Subscribe job state handlers.
//!
//! Clients poll these while a subscription is being set up in the
//! background, and delete a state to dismiss its alert.

use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{IfModifiedSince, LastModified},
    TypedHeader,
};

use super::AppState;
use crate::job::SubscribeJobStateRepository;
use crate::web::dto::SubscribeJobStateResponse;
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// GET /api/subscribe_job_states - List the user's job states.
///
/// Responds 404 with an empty body when the user has none.
pub async fn index(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Response, ApiError> {
    let jobs = SubscribeJobStateRepository::new(state.db.pool())
        .list_for_user(auth.user_id())
        .await?;

    if jobs.is_empty() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let jobs: Vec<SubscribeJobStateResponse> = jobs
        .into_iter()
        .map(SubscribeJobStateResponse::from)
        .collect();
    Ok(Json(jobs).into_response())
}

/// GET /api/subscribe_job_states/:id - Get one job state.
///
/// Honors `If-Modified-Since` against the state's `updated_at`.
pub async fn show(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    if_modified_since: Option<TypedHeader<IfModifiedSince>>,
) -> Result<Response, ApiError> {
    let job = SubscribeJobStateRepository::new(state.db.pool())
        .get_for_user(id, auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("Subscribe job state not found"))?;

    let modified = SystemTime::from(job.updated_at);
    if let Some(TypedHeader(since)) = if_modified_since {
        if !since.is_modified(modified) {
            return Ok(StatusCode::NOT_MODIFIED.into_response());
        }
    }

    Ok((
        TypedHeader(LastModified::from(modified)),
        Json(SubscribeJobStateResponse::from(job)),
    )
        .into_response())
}

/// DELETE /api/subscribe_job_states/:id - Dismiss a job state.
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = SubscribeJobStateRepository::new(state.db.pool())
        .delete_for_user(id, auth.user_id())
        .await?;

    if !deleted {
        return Err(ApiError::not_found("Subscribe job state not found"));
    }
    Ok(StatusCode::OK)
}
