//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::auth::{authenticate, register as register_user, RegistrationRequest};
use crate::db::{Database, User, UserRepository};
use crate::job::JobRunner;
use crate::web::dto::{LoginRequest, LoginResponse, RegisterRequest, UserInfo, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, JwtClaims, JwtState};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database.
    pub db: Arc<Database>,
    /// JWT keys.
    pub jwt: Arc<JwtState>,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
    /// Background job runner.
    pub jobs: JobRunner,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Arc<Database>, jwt: Arc<JwtState>, access_expiry: u64, jobs: JobRunner) -> Self {
        Self {
            db,
            jwt,
            access_token_expiry: access_expiry,
            jobs,
        }
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        let claims = JwtClaims::new(user.id, &user.email, self.access_token_expiry);
        self.jwt.encode(&claims)
    }

    fn login_response(&self, user: User) -> Result<LoginResponse, ApiError> {
        Ok(LoginResponse {
            access_token: self.generate_access_token(&user)?,
            expires_in: self.access_token_expiry,
            user: UserInfo::from(user),
        })
    }
}

/// POST /api/auth/register - User registration.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let mut request = RegistrationRequest::new(req.email, req.password);
    if let Some(name) = req.name {
        request = request.with_name(name);
    }

    let user = register_user(state.db.pool(), request).await?;
    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(state.login_response(user)?)))
}

/// POST /api/auth/login - User login.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = authenticate(state.db.pool(), &req.email, &req.password).await?;
    Ok(Json(state.login_response(user)?))
}

/// GET /api/auth/me - Get current user info.
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserInfo>, ApiError> {
    let user = UserRepository::new(state.db.pool())
        .get_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserInfo::from(user)))
}
