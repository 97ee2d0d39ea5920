//! Error types for Feedloft.

use thiserror::Error;

/// Common error type for Feedloft.
#[derive(Error, Debug)]
pub enum FeedloftError {
    /// Database error.
    ///
    /// Errors from sqlx are automatically converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for a record or user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The user is not subscribed to the feed the resource belongs to.
    #[error("user {user_id} is not subscribed to feed {feed_id}")]
    NotSubscribed {
        /// User that made the request.
        user_id: i64,
        /// Feed the resource belongs to.
        feed_id: i64,
    },

    /// Feed fetching or parsing error.
    #[error("feed error: {0}")]
    Feed(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for FeedloftError {
    fn from(e: sqlx::Error) -> Self {
        FeedloftError::Database(e.to_string())
    }
}

/// Result type alias for Feedloft operations.
pub type Result<T> = std::result::Result<T, FeedloftError>;
