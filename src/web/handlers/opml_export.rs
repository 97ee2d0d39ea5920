//! OPML export handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::job::OpmlExportJobStateRepository;
use crate::web::dto::{OpmlExportAlertRequest, OpmlExportResponse};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// GET /api/opml_export - The user's export state.
pub async fn show(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<OpmlExportResponse>, ApiError> {
    let export = OpmlExportJobStateRepository::new(state.db.pool())
        .get_or_default(auth.user_id())
        .await?;
    Ok(Json(OpmlExportResponse::from(export)))
}

/// POST /api/opml_export - Start a new export.
pub async fn start(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<OpmlExportResponse>), ApiError> {
    let user_id = auth.user_id();
    state.jobs.start_opml_export(user_id).await?;

    let export = OpmlExportJobStateRepository::new(state.db.pool())
        .get_or_default(user_id)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(OpmlExportResponse::from(export))))
}

/// PATCH /api/opml_export - Show or dismiss the export alert.
pub async fn update_alert(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<OpmlExportAlertRequest>,
) -> Result<Json<OpmlExportResponse>, ApiError> {
    let repo = OpmlExportJobStateRepository::new(state.db.pool());
    repo.set_show_alert(auth.user_id(), req.show_alert).await?;

    let export = repo.get_or_default(auth.user_id()).await?;
    Ok(Json(OpmlExportResponse::from(export)))
}

/// GET /api/opml_export/download - The last exported OPML document.
pub async fn download(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Response, ApiError> {
    let opml = OpmlExportJobStateRepository::new(state.db.pool())
        .export_data(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("No OPML export available"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/x-opml; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"feedloft.opml\"",
            ),
        ],
        opml,
    )
        .into_response())
}
