//! Response DTOs for the JSON API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::User;
use crate::entry::UserEntry;
use crate::job::{JobState, OpmlExportJobState, SubscribeJobState};
use crate::subscription::{Folder, SubscribedFeed};

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    /// User information.
    pub user: UserInfo,
}

/// User information in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

/// Subscribe job state.
#[derive(Debug, Serialize)]
pub struct SubscribeJobStateResponse {
    /// Job state ID.
    pub id: i64,
    /// URL being subscribed to.
    pub fetch_url: String,
    /// Current state.
    pub state: JobState,
    /// Subscribed feed, once the job succeeded.
    pub feed_id: Option<i64>,
    /// When the job started.
    pub created_at: DateTime<Utc>,
    /// When the state last changed.
    pub updated_at: DateTime<Utc>,
}

impl From<SubscribeJobState> for SubscribeJobStateResponse {
    fn from(job: SubscribeJobState) -> Self {
        Self {
            id: job.id,
            fetch_url: job.fetch_url,
            state: job.state,
            feed_id: job.feed_id,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Subscribed feed.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    /// Feed ID.
    pub id: i64,
    /// Feed title.
    pub title: String,
    /// URL the feed is fetched from.
    pub fetch_url: String,
    /// Site URL.
    pub url: Option<String>,
    /// Folder the feed is filed under.
    pub folder_id: Option<i64>,
    /// Unread entries.
    pub unread_count: i64,
    /// Last successful fetch.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl From<SubscribedFeed> for FeedResponse {
    fn from(subscribed: SubscribedFeed) -> Self {
        let title = subscribed.feed.display_title().to_string();
        Self {
            id: subscribed.feed.id,
            title,
            fetch_url: subscribed.feed.fetch_url,
            url: subscribed.feed.url,
            folder_id: subscribed.folder_id,
            unread_count: subscribed.unread_count,
            last_fetched_at: subscribed.feed.last_fetched_at,
        }
    }
}

/// Entry with the user's read state.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Entry ID.
    pub id: i64,
    /// Feed ID.
    pub feed_id: i64,
    /// Entry guid.
    pub guid: String,
    /// Article URL.
    pub url: String,
    /// Title.
    pub title: String,
    /// Author.
    pub author: Option<String>,
    /// Sanitized content.
    pub content: Option<String>,
    /// Sanitized summary.
    pub summary: Option<String>,
    /// Publication time.
    pub published: DateTime<Utc>,
    /// Whether the user has read the entry.
    pub read: bool,
}

impl From<UserEntry> for EntryResponse {
    fn from(user_entry: UserEntry) -> Self {
        let entry = user_entry.entry;
        Self {
            id: entry.id,
            feed_id: entry.feed_id,
            guid: entry.guid,
            url: entry.url,
            title: entry.title,
            author: entry.author,
            content: entry.content,
            summary: entry.summary,
            published: entry.published,
            read: user_entry.read,
        }
    }
}

/// Result of marking a feed read.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    /// Entries that changed to read.
    pub updated: u64,
}

/// Folder.
#[derive(Debug, Serialize)]
pub struct FolderResponse {
    /// Folder ID.
    pub id: i64,
    /// Title.
    pub title: String,
    /// When the folder's membership last changed.
    pub subscriptions_updated_at: DateTime<Utc>,
}

impl From<Folder> for FolderResponse {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            title: folder.title,
            subscriptions_updated_at: folder.subscriptions_updated_at,
        }
    }
}

/// OPML export state.
#[derive(Debug, Serialize)]
pub struct OpmlExportResponse {
    /// Current state.
    pub state: JobState,
    /// Whether the export alert should be displayed.
    pub show_alert: bool,
    /// When the last successful export finished.
    pub export_date: Option<DateTime<Utc>>,
}

impl From<OpmlExportJobState> for OpmlExportResponse {
    fn from(state: OpmlExportJobState) -> Self {
        Self {
            state: state.state,
            show_alert: state.show_alert,
            export_date: state.export_date,
        }
    }
}
