//! Folder handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::subscription::SubscriptionService;
use crate::web::dto::{CreateFolderRequest, FolderResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// GET /api/folders - List the user's folders.
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<FolderResponse>>, ApiError> {
    let folders = SubscriptionService::new(&state.db)
        .list_folders(auth.user_id())
        .await?;
    Ok(Json(folders.into_iter().map(FolderResponse::from).collect()))
}

/// POST /api/folders - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<FolderResponse>), ApiError> {
    let folder = SubscriptionService::new(&state.db)
        .create_folder(auth.user_id(), &req.title)
        .await?;
    Ok((StatusCode::CREATED, Json(FolderResponse::from(folder))))
}

/// DELETE /api/folders/:id - Delete a folder. Its feeds stay subscribed.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(folder_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    SubscriptionService::new(&state.db)
        .delete_folder(auth.user_id(), folder_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
