//! Entry handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::entry::{EntryRepository, EntryStateRepository};
use crate::web::dto::{EntryResponse, EntryStateRequest};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// GET /api/entries/:id - Get an entry with the user's read state.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(entry_id): Path<i64>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = EntryRepository::new(state.db.pool())
        .get_for_user(entry_id, auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("Entry not found"))?;
    Ok(Json(EntryResponse::from(entry)))
}

/// PUT /api/entries/:id/state - Mark an entry read or unread.
pub async fn set_entry_state(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(entry_id): Path<i64>,
    Json(req): Json<EntryStateRequest>,
) -> Result<Json<EntryResponse>, ApiError> {
    let user_id = auth.user_id();
    EntryStateRepository::new(state.db.pool())
        .set_read(entry_id, user_id, req.read)
        .await?;

    let entry = EntryRepository::new(state.db.pool())
        .get_for_user(entry_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Entry not found"))?;
    Ok(Json(EntryResponse::from(entry)))
}
