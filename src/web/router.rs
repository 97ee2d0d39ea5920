//! Router configuration for the JSON API.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_folder, delete_folder, get_entry, list_entries, list_feeds, list_folders, login,
    mark_read, me, opml_export, register, set_entry_state, set_folder, subscribe,
    subscribe_job_states, unsubscribe, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth};

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    // Auth routes (no authentication required)
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me));

    let job_routes = Router::new()
        .route("/", get(subscribe_job_states::index))
        .route(
            "/:id",
            get(subscribe_job_states::show).delete(subscribe_job_states::destroy),
        );

    let feed_routes = Router::new()
        .route("/", get(list_feeds).post(subscribe))
        .route("/:id", axum::routing::delete(unsubscribe))
        .route("/:id/entries", get(list_entries))
        .route("/:id/read", put(mark_read))
        .route("/:id/folder", put(set_folder));

    let entry_routes = Router::new()
        .route("/:id", get(get_entry))
        .route("/:id/state", put(set_entry_state));

    let folder_routes = Router::new()
        .route("/", get(list_folders).post(create_folder))
        .route("/:id", axum::routing::delete(delete_folder));

    let opml_routes = Router::new()
        .route(
            "/",
            get(opml_export::show)
                .post(opml_export::start)
                .patch(opml_export::update_alert),
        )
        .route("/download", get(opml_export::download));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/subscribe_job_states", job_routes)
        .nest("/feeds", feed_routes)
        .nest("/entries", entry_routes)
        .nest("/folders", folder_routes)
        .nest("/opml_export", opml_routes);

    let jwt_state = app_state.jwt.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
