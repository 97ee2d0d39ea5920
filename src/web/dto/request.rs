//! Request DTOs for the JSON API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    /// Display name; defaults to the email's local part.
    #[serde(default)]
    #[validate(
        length(max = 100, message = "Name must be at most 100 characters"),
        custom(function = "no_control_chars")
    )]
    pub name: Option<String>,
}

/// Subscribe request.
#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    /// Feed URL.
    #[validate(
        length(min = 1, max = 2048, message = "URL must be 1-2048 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub url: String,
}

/// Entries listing query.
#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    /// Include entries already read.
    #[serde(default)]
    pub include_read: bool,
    /// Maximum number of entries.
    pub limit: Option<i64>,
}

/// Entry read state update.
#[derive(Debug, Deserialize)]
pub struct EntryStateRequest {
    /// Whether the entry is read.
    pub read: bool,
}

/// Folder creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder title.
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1-100 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub title: String,
}

/// Folder assignment of a subscribed feed.
#[derive(Debug, Deserialize)]
pub struct SetFolderRequest {
    /// Target folder; null removes the feed from its folder.
    pub folder_id: Option<i64>,
}

/// OPML export alert update.
#[derive(Debug, Deserialize)]
pub struct OpmlExportAlertRequest {
    /// Whether to show the export alert.
    pub show_alert: bool,
}
