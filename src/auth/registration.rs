//! Account registration and login.

use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::ValidateEmail;

use crate::auth::{hash_password, verify_password, PasswordError};
use crate::db::{NewUser, User, UserRepository};
use crate::{FeedloftError, Result};

/// Maximum display name length.
pub const MAX_NAME_LENGTH: usize = 100;

impl From<PasswordError> for FeedloftError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort | PasswordError::TooLong => {
                FeedloftError::Validation(e.to_string())
            }
            PasswordError::InvalidHash | PasswordError::VerificationFailed => {
                FeedloftError::Auth("invalid email or password".to_string())
            }
            PasswordError::HashError(msg) => FeedloftError::Auth(msg),
        }
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Login email.
    pub email: String,
    /// Plain-text password (8-128 characters).
    pub password: String,
    /// Display name; defaults to the email's local part.
    pub name: Option<String>,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Register a new user.
///
/// Validates the email and password, rejects emails that are already taken
/// and stores the Argon2 hash of the password.
pub async fn register(pool: &SqlitePool, request: RegistrationRequest) -> Result<User> {
    let email = request.email.trim();
    if !email.validate_email() {
        return Err(FeedloftError::Validation("invalid email address".to_string()));
    }

    let name = match request.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => email.split('@').next().unwrap_or(email).to_string(),
    };
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(FeedloftError::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    let repo = UserRepository::new(pool);
    if repo.email_exists(email).await? {
        return Err(FeedloftError::Validation(
            "email is already registered".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password)?;
    let user = repo.create(&NewUser::new(email, password_hash, name)).await?;

    info!(user_id = user.id, email = %user.email, "New user registered");
    Ok(user)
}

/// Authenticate a user by email and password.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<User> {
    let repo = UserRepository::new(pool);
    let Some(user) = repo.get_by_email(email.trim()).await? else {
        warn!(email = %email, "Login attempt for unknown email");
        return Err(FeedloftError::Auth("invalid email or password".to_string()));
    };

    if let Err(e) = verify_password(password, &user.password) {
        warn!(user_id = user.id, "Login failed: {}", e);
        return Err(e.into());
    }

    Ok(user)
}
