//! Feed subscription handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::entry::{EntryRepository, EntryStateRepository, DEFAULT_ENTRY_LIMIT};
use crate::subscription::SubscriptionService;
use crate::web::dto::{
    EntriesQuery, EntryResponse, FeedResponse, MarkReadResponse, SetFolderRequest,
    SubscribeJobStateResponse, SubscribeRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// Upper bound for the `limit` query parameter.
const MAX_ENTRY_LIMIT: i64 = 500;

/// GET /api/feeds - List subscribed feeds with unread counts.
pub async fn list_feeds(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<FeedResponse>>, ApiError> {
    let feeds = SubscriptionService::new(&state.db)
        .list_feeds(auth.user_id())
        .await?;
    Ok(Json(feeds.into_iter().map(FeedResponse::from).collect()))
}

/// POST /api/feeds - Start subscribing to a feed URL.
///
/// The subscription is set up in the background; the response is the job
/// state to poll.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscribeJobStateResponse>), ApiError> {
    let job = state.jobs.start_subscribe(auth.user_id(), &req.url).await?;
    Ok((StatusCode::ACCEPTED, Json(SubscribeJobStateResponse::from(job))))
}

/// DELETE /api/feeds/:id - Unsubscribe from a feed.
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(feed_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    SubscriptionService::new(&state.db)
        .unsubscribe(auth.user_id(), feed_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/feeds/:id/entries - List a subscribed feed's entries.
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(feed_id): Path<i64>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    let user_id = auth.user_id();
    SubscriptionService::new(&state.db)
        .get_feed(user_id, feed_id)
        .await?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_ENTRY_LIMIT)
        .clamp(1, MAX_ENTRY_LIMIT);
    let entries = EntryRepository::new(state.db.pool())
        .list_for_user(feed_id, user_id, query.include_read, limit)
        .await?;

    Ok(Json(entries.into_iter().map(EntryResponse::from).collect()))
}

/// PUT /api/feeds/:id/read - Mark every entry of a feed read.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(feed_id): Path<i64>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let updated = EntryStateRepository::new(state.db.pool())
        .mark_feed_read(feed_id, auth.user_id())
        .await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// PUT /api/feeds/:id/folder - File a feed under a folder, or none.
pub async fn set_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(feed_id): Path<i64>,
    Json(req): Json<SetFolderRequest>,
) -> Result<StatusCode, ApiError> {
    let service = SubscriptionService::new(&state.db);
    match req.folder_id {
        Some(folder_id) => {
            service
                .move_to_folder(auth.user_id(), feed_id, folder_id)
                .await?
        }
        None => service.remove_from_folder(auth.user_id(), feed_id).await?,
    }
    Ok(StatusCode::NO_CONTENT)
}
