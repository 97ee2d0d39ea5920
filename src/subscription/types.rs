//! Subscription and folder types.

use chrono::{DateTime, Utc};

use crate::datetime::parse_datetime;
use crate::feed::types::{Feed, FeedRow};

/// Maximum folder title length in characters.
pub const MAX_FOLDER_TITLE_LENGTH: usize = 100;

/// A user-owned grouping of subscriptions.
#[derive(Debug, Clone)]
pub struct Folder {
    /// Folder ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Folder title, unique per user.
    pub title: String,
    /// When the folder's membership last changed.
    pub subscriptions_updated_at: DateTime<Utc>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct FolderRow {
    id: i64,
    user_id: i64,
    title: String,
    subscriptions_updated_at: String,
    created_at: String,
}

impl From<FolderRow> for Folder {
    fn from(row: FolderRow) -> Self {
        Folder {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            subscriptions_updated_at: parse_datetime(&row.subscriptions_updated_at),
            created_at: parse_datetime(&row.created_at),
        }
    }
}

/// A user's subscription to a feed.
#[derive(Debug, Clone)]
pub struct FeedSubscription {
    /// Subscription ID.
    pub id: i64,
    /// Subscribed user.
    pub user_id: i64,
    /// Subscribed feed.
    pub feed_id: i64,
    /// Folder the subscription is filed under, if any.
    pub folder_id: Option<i64>,
    /// When the user subscribed.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct FeedSubscriptionRow {
    id: i64,
    user_id: i64,
    feed_id: i64,
    folder_id: Option<i64>,
    created_at: String,
}

impl From<FeedSubscriptionRow> for FeedSubscription {
    fn from(row: FeedSubscriptionRow) -> Self {
        FeedSubscription {
            id: row.id,
            user_id: row.user_id,
            feed_id: row.feed_id,
            folder_id: row.folder_id,
            created_at: parse_datetime(&row.created_at),
        }
    }
}

/// A subscribed feed as listed for its user.
#[derive(Debug, Clone)]
pub struct SubscribedFeed {
    /// The feed.
    pub feed: Feed,
    /// Folder the subscription is filed under.
    pub folder_id: Option<i64>,
    /// Unread entries for the user.
    pub unread_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SubscribedFeedRow {
    #[sqlx(flatten)]
    feed: FeedRow,
    folder_id: Option<i64>,
    unread_count: i64,
}

impl From<SubscribedFeedRow> for SubscribedFeed {
    fn from(row: SubscribedFeedRow) -> Self {
        SubscribedFeed {
            feed: row.feed.into(),
            folder_id: row.folder_id,
            unread_count: row.unread_count,
        }
    }
}
